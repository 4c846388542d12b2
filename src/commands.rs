// src/commands.rs
//! On-demand reports ("list all deadlines", "next deadline"). Pure text renderers;
//! the HTTP layer and `check_once` decide where the text goes.

use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::rates::Rate;

const EMPTY_LIST: &str = "No pricing information found on the DragonCon website.";
const NO_UPCOMING: &str = "No upcoming deadlines found. All current rates may have expired.";

fn days_word(n: i64) -> &'static str {
    if n == 1 {
        "day"
    } else {
        "days"
    }
}

pub fn list_all_deadlines(today: NaiveDate, rates: &[Rate]) -> String {
    if rates.is_empty() {
        return EMPTY_LIST.to_string();
    }

    let mut out = String::from("**DragonCon 5-Day Membership Rates:**\n\n");
    for rate in rates {
        let _ = write!(out, "• **{}**", rate.price);
        match (rate.deadline, rate.days_until(today)) {
            (Some(deadline), Some(days)) => {
                let _ = write!(out, " - Valid through **{deadline}**");
                match days {
                    n if n > 0 => {
                        let _ = write!(out, " ({n} {} remaining)", days_word(n));
                    }
                    0 => out.push_str(" (**Last day!**)"),
                    _ => out.push_str(" (Expired)"),
                }
            }
            _ => out.push_str(" - No deadline specified"),
        }
        out.push('\n');
    }
    out
}

/// Earliest deadline that is today or later. Ties keep input order.
pub fn upcoming(today: NaiveDate, rates: &[Rate]) -> Option<&Rate> {
    rates
        .iter()
        .filter(|r| r.deadline.is_some_and(|d| d >= today))
        .min_by_key(|r| r.deadline)
}

pub fn next_deadline(today: NaiveDate, rates: &[Rate]) -> String {
    let Some(rate) = upcoming(today, rates) else {
        return NO_UPCOMING.to_string();
    };
    let (Some(deadline), Some(days)) = (rate.deadline, rate.days_until(today)) else {
        return NO_UPCOMING.to_string();
    };

    let mut out = String::from("**Next Deadline:**\n\n");
    let _ = writeln!(out, "• Current rate: **{}**", rate.price);
    let _ = writeln!(out, "• Deadline: **{deadline}**");
    let _ = writeln!(out, "• Time remaining: **{days} {}**", days_word(days));
    out.push('\n');

    out.push_str(match days {
        n if n <= 7 => "⚠️ **Deadline is approaching soon!**",
        n if n <= 30 => "⏰ Deadline is coming up this month.",
        _ => "✅ You still have plenty of time.",
    });
    out
}
