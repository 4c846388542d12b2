//! One-off membership check: prints the parsed rates and today's reminder.
//! Pass `--send` to deliver a non-empty reminder through the configured notifier.

use anyhow::{Context, Result};
use chrono::Utc;

use dragoncon_reminder::{
    commands, fetch::MembershipPage, init_tracing, notify::notifier_from_env, pipeline,
    today_in, ReminderConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let send = std::env::args().skip(1).any(|a| a == "--send");
    let cfg = ReminderConfig::load_default().context("loading reminder config")?;
    let today = today_in(&cfg.zone()?, Utc::now());
    let source = MembershipPage::from_config(&cfg)?;

    if send {
        let notifier = notifier_from_env();
        let out =
            pipeline::run_once(&source, notifier.as_ref(), &cfg.section_heading, today).await?;
        println!("{}", commands::list_all_deadlines(today, &out.rates));
        if out.delivered {
            println!("sent: {}", out.reminder);
        } else {
            println!("no reminders to send (no deadlines match threshold)");
        }
        return Ok(());
    }

    let rates = pipeline::fetch_rates(&source, &cfg.section_heading).await?;
    println!("{}", commands::list_all_deadlines(today, &rates));
    println!("{}", commands::next_deadline(today, &rates));
    let reminder = dragoncon_reminder::build_reminder(today, &rates);
    if reminder.is_empty() {
        println!("\n(no reminder today, {today})");
    } else {
        println!("\nreminder: {reminder}");
    }
    Ok(())
}
