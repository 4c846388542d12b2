// src/pipeline.rs
//! One pass: fetch → extract → parse → build → (maybe) notify.
use anyhow::{Context, Result};
use chrono::NaiveDate;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use scraper::Html;

use crate::fetch::PageSource;
use crate::notify::Notifier;
use crate::rates::{extract_lines, parse_all, Rate};
use crate::reminder::build_reminder;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("reminder_runs_total", "Reminder passes started.");
        describe_counter!(
            "reminder_rates_parsed_total",
            "Rate lines parsed by reminder passes (API reads are not counted)."
        );
        describe_counter!("reminder_sent_total", "Non-empty reminders delivered.");
        describe_counter!(
            "reminder_run_errors_total",
            "Passes aborted by fetch, layout or delivery errors."
        );
        describe_histogram!("reminder_fetch_ms", "Membership page fetch time in milliseconds.");
        describe_gauge!("reminder_last_run_ts", "Unix ts when a pass last completed.");
    });
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub rates: Vec<Rate>,
    /// Empty when no rate sits on a threshold.
    pub reminder: String,
    pub delivered: bool,
}

/// Rates parsed from an HTML document. Layout errors abort; odd lines do not.
pub fn rates_from_html(html: &str, heading: &str) -> Result<Vec<Rate>> {
    let document = Html::parse_document(html);
    let lines = extract_lines(&document, heading)?;
    Ok(parse_all(&lines))
}

/// Fetch the page and parse its rate block.
pub async fn fetch_rates(source: &dyn PageSource, heading: &str) -> Result<Vec<Rate>> {
    ensure_metrics_described();
    let t0 = std::time::Instant::now();
    let html = source
        .fetch_html()
        .await
        .with_context(|| format!("fetching membership page ({})", source.name()))?;
    histogram!("reminder_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    rates_from_html(&html, heading)
}

/// Run one check for `today` and deliver the reminder if there is one.
pub async fn run_once(
    source: &dyn PageSource,
    notifier: &dyn Notifier,
    heading: &str,
    today: NaiveDate,
) -> Result<RunOutcome> {
    ensure_metrics_described();
    counter!("reminder_runs_total").increment(1);

    let result = run_inner(source, notifier, heading, today).await;
    match &result {
        Ok(out) => {
            gauge!("reminder_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
            tracing::info!(
                rates = out.rates.len(),
                delivered = out.delivered,
                "membership check finished"
            );
        }
        Err(e) => {
            counter!("reminder_run_errors_total").increment(1);
            tracing::warn!(error = ?e, "membership check failed");
        }
    }
    result
}

async fn run_inner(
    source: &dyn PageSource,
    notifier: &dyn Notifier,
    heading: &str,
    today: NaiveDate,
) -> Result<RunOutcome> {
    let rates = fetch_rates(source, heading).await?;
    counter!("reminder_rates_parsed_total").increment(rates.len() as u64);
    let reminder = build_reminder(today, &rates);

    if reminder.is_empty() {
        tracing::info!("no reminders to send (no deadlines match threshold)");
        return Ok(RunOutcome {
            rates,
            reminder,
            delivered: false,
        });
    }

    notifier
        .send(&reminder)
        .await
        .with_context(|| format!("delivering reminder via {}", notifier.name()))?;
    counter!("reminder_sent_total").increment(1);
    tracing::info!(notifier = notifier.name(), %reminder, "reminder sent");

    Ok(RunOutcome {
        rates,
        reminder,
        delivered: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MembershipPage;
    use crate::notify::MockNotifier;
    use crate::rates::ExtractError;

    const HEADING: &str = "Dragon Con 5-Day Membership Rates";
    const PAGE: &str = "<h3>Dragon Con 5-Day Membership Rates</h3>\
        <p><strong>$125</strong>&nbsp;through 12/8/2025<br>\
        <strong>$150</strong>&nbsp;through 3/13/2026<br>\
        <strong>TBA</strong>&nbsp;through show time.</p>";

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn sends_when_a_threshold_matches() {
        let source = MembershipPage::from_fixture(PAGE);
        let mock = MockNotifier::new();
        let out = run_once(&source, &mock, HEADING, d(2025, 12, 1)).await.unwrap();
        assert_eq!(out.rates.len(), 3);
        assert!(out.delivered);
        assert_eq!(mock.messages(), vec![out.reminder.clone()]);
        assert!(out.reminder.contains("7 day(s) (2025-12-08)"));
    }

    #[tokio::test]
    async fn stays_quiet_off_threshold() {
        let source = MembershipPage::from_fixture(PAGE);
        let mock = MockNotifier::new();
        let out = run_once(&source, &mock, HEADING, d(2025, 12, 2)).await.unwrap();
        assert!(!out.delivered);
        assert!(out.reminder.is_empty());
        assert!(mock.messages().is_empty());
    }

    #[tokio::test]
    async fn layout_change_aborts_batch() {
        let source = MembershipPage::from_fixture("<h3>Something else</h3><p>$1</p>");
        let mock = MockNotifier::new();
        let err = run_once(&source, &mock, HEADING, d(2025, 12, 1)).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExtractError>(),
            Some(ExtractError::HeadingNotFound { .. })
        ));
        assert!(mock.messages().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_an_error() {
        let source = MembershipPage::from_fixture(PAGE);
        let err = run_once(&source, &MockNotifier::failing(), HEADING, d(2025, 12, 1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("delivering reminder"));
    }
}
