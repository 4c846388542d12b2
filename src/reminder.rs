// src/reminder.rs
//! Threshold reminders: which rates are exactly 30/14/7/3/1/0 days from their deadline.
//!
//! All arithmetic is on calendar dates. "Today" is derived once by the caller
//! in the configured zone (see `today_in`) and passed in explicitly.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::rates::Rate;

/// Day counts that trigger a reminder, in priority order.
pub const THRESHOLDS_DAYS: [i64; 6] = [30, 14, 7, 3, 1, 0];

/// Calendar date of `now` as seen in `zone`.
pub fn today_in<Tz: TimeZone>(zone: &Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(zone).date_naive()
}

/// The threshold `days` lands on, if any.
pub fn matching_threshold(days: i64) -> Option<i64> {
    THRESHOLDS_DAYS.iter().copied().find(|t| *t == days)
}

/// One sentence for a matched rate.
pub fn reminder_sentence(price: &str, days: i64, deadline: NaiveDate) -> String {
    format!(
        "The DragonCon membership price (current: {price}) will increase in {days} day(s) ({deadline})."
    )
}

/// Concatenated sentences for every rate sitting on a threshold, in input order.
/// Empty means nothing to notify.
pub fn build_reminder(today: NaiveDate, rates: &[Rate]) -> String {
    let mut out = String::new();
    for rate in rates {
        let (Some(deadline), Some(days)) = (rate.deadline, rate.days_until(today)) else {
            continue;
        };
        if let Some(threshold) = matching_threshold(days) {
            tracing::debug!(price = %rate.price, %deadline, threshold, "rate on threshold");
            out.push_str(&reminder_sentence(&rate.price, days, deadline));
        }
    }
    out
}
