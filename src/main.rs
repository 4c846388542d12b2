//! Dragon Con reminder service — binary entrypoint.
//! Schedules the periodic membership check and serves the HTTP API.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use dragoncon_reminder::{
    api::{self, AppState},
    fetch::{MembershipPage, PageSource},
    init_tracing,
    metrics::Metrics,
    notify::{notifier_from_env, Notifier},
    schedule::{spawn_scheduler, SchedulerCfg},
    ReminderConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = ReminderConfig::load_default().context("loading reminder config")?;
    let zone = cfg.zone()?;
    tracing::info!(
        url = %cfg.membership_url,
        heading = %cfg.section_heading,
        zone = %zone,
        first_run = %cfg.first_run_date,
        every_days = cfg.interval_days,
        "reminder service starting"
    );

    let metrics = Metrics::init(cfg.interval_days)?;
    let source: Arc<dyn PageSource> = Arc::new(MembershipPage::from_config(&cfg)?);
    let notifier: Arc<dyn Notifier> = Arc::from(notifier_from_env());

    let scheduler = spawn_scheduler(
        SchedulerCfg {
            zone,
            heading: cfg.section_heading.clone(),
            first_run: cfg.first_run_date,
            interval_days: cfg.interval_days,
            run_hour: cfg.run_hour,
        },
        source.clone(),
        notifier,
    );

    let state = AppState::new(source, cfg.section_heading.clone(), zone);
    let app = api::router(state).merge(metrics.router());

    let listener = TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "http api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .context("http server")?;

    scheduler.abort();
    Ok(())
}
