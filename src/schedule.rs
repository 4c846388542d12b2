// src/schedule.rs
//! Check cadence: first run on a fixed date, then every `interval_days`.
use chrono::{Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::fetch::PageSource;
use crate::notify::Notifier;
use crate::pipeline;
use crate::reminder::today_in;

#[derive(Clone, Debug)]
pub struct SchedulerCfg {
    pub zone: Tz,
    pub heading: String,
    pub first_run: NaiveDate,
    pub interval_days: u32,
    pub run_hour: u32,
}

/// Next slot strictly after `today` once the first run date has been reached.
///
/// Before `first_run` the answer is `first_run` itself; from then on it is
/// `first_run + (k + 1) * interval` where `k` counts the intervals already elapsed.
pub fn next_run_date(today: NaiveDate, first_run: NaiveDate, interval_days: u32) -> NaiveDate {
    if today < first_run {
        return first_run;
    }
    let interval = i64::from(interval_days.max(1));
    let since_first = today.signed_duration_since(first_run).num_days();
    let elapsed = since_first / interval;
    let offset = (elapsed + 1) * interval;
    first_run
        .checked_add_days(Days::new(offset.unsigned_abs()))
        .unwrap_or(NaiveDate::MAX)
}

/// Whole days from `today` until the next run.
pub fn initial_delay_days(today: NaiveDate, first_run: NaiveDate, interval_days: u32) -> i64 {
    next_run_date(today, first_run, interval_days)
        .signed_duration_since(today)
        .num_days()
}

/// Wall-clock wait from `now` until `run_hour` local time on `date`.
pub fn delay_until(zone: &Tz, now: chrono::DateTime<Utc>, date: NaiveDate, run_hour: u32) -> Duration {
    let at = NaiveTime::from_hms_opt(run_hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    // `earliest` covers DST gaps/overlaps; fall back to UTC if the zone has no such instant.
    let target = zone
        .from_local_datetime(&date.and_time(at))
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&date.and_time(at)));
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

/// Spawn the periodic check. One pass at a time; failures are logged and the loop continues.
pub fn spawn_scheduler(
    cfg: SchedulerCfg,
    source: Arc<dyn PageSource>,
    notifier: Arc<dyn Notifier>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let today = today_in(&cfg.zone, now);
            let next = next_run_date(today, cfg.first_run, cfg.interval_days);
            let wait = delay_until(&cfg.zone, now, next, cfg.run_hour);
            tracing::info!(
                target: "schedule",
                %next,
                delay_days = initial_delay_days(today, cfg.first_run, cfg.interval_days),
                every_days = cfg.interval_days,
                "next membership check scheduled"
            );
            tokio::time::sleep(wait).await;

            let today = today_in(&cfg.zone, Utc::now());
            tracing::info!(target: "schedule", %today, "running scheduled check");
            if let Err(e) =
                pipeline::run_once(source.as_ref(), notifier.as_ref(), &cfg.heading, today).await
            {
                tracing::warn!(target: "schedule", error = ?e, "scheduled check failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn before_first_run_waits_for_it() {
        let first = d(2026, 3, 1);
        assert_eq!(next_run_date(d(2026, 2, 20), first, 90), first);
        assert_eq!(initial_delay_days(d(2026, 2, 20), first, 90), 9);
    }

    #[test]
    fn on_and_after_first_run_steps_by_interval() {
        let first = d(2026, 3, 1);
        assert_eq!(next_run_date(first, first, 90), d(2026, 5, 30));
        assert_eq!(initial_delay_days(first, first, 90), 90);
        assert_eq!(next_run_date(d(2026, 5, 29), first, 90), d(2026, 5, 30));
        assert_eq!(next_run_date(d(2026, 5, 30), first, 90), d(2026, 8, 28));
        assert_eq!(initial_delay_days(d(2026, 6, 1), first, 90), 88);
    }

    #[test]
    fn delay_targets_local_hour() {
        // 2025-12-01 09:00 in New York is 14:00 UTC.
        let now = Utc.with_ymd_and_hms(2025, 12, 1, 12, 0, 0).unwrap();
        let wait = delay_until(&New_York, now, d(2025, 12, 1), 9);
        assert_eq!(wait, Duration::from_secs(2 * 3600));

        let past = delay_until(&New_York, now, d(2025, 11, 30), 9);
        assert_eq!(past, Duration::ZERO);
    }
}
