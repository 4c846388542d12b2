// src/rates/parser.rs
//! Line → `Rate`. Never fails: anything we cannot read degrades to `deadline: None`.
//!
//! Two different "through" locators are in play:
//! - the price split needs whitespace on both sides of the keyword;
//! - the deadline clause starts right after the first raw substring match.
//!
//! A line like `"$100 walkthrough 1/1/2026"` therefore keeps the whole line as
//! its price while still yielding a deadline. Keep both rules in step with the
//! tests below before touching either one.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::Rate;

const KEYWORD: &str = "through";

static RE_DELIMITER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+through\s+").expect("static regex"));

static RE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<m>[0-9]{1,2})/(?P<d>[0-9]{1,2})/(?P<y>[0-9]{4})$").expect("static regex")
});

/// Parse one extracted line into a `Rate`.
pub fn parse_rate(line: &str) -> Rate {
    let price = match RE_DELIMITER.find(line) {
        Some(m) => line[..m.start()].trim(),
        None => line.trim(),
    };

    let deadline = deadline_clause(line).and_then(parse_deadline);
    if deadline.is_none() {
        tracing::trace!(line, "rate line without a readable deadline");
    }

    Rate::new(line, price, deadline)
}

/// Text after the first case-insensitive "through", trimmed.
fn deadline_clause(line: &str) -> Option<&str> {
    // ASCII lowering keeps byte offsets aligned with `line`.
    let lowered = line.to_ascii_lowercase();
    let idx = lowered.find(KEYWORD)?;
    Some(line[idx + KEYWORD.len()..].trim())
}

/// `M/D/YYYY`, optionally followed by one `.` or `;`. Impossible dates yield `None`.
fn parse_deadline(clause: &str) -> Option<NaiveDate> {
    let clause = clause
        .strip_suffix(['.', ';'])
        .unwrap_or(clause)
        .trim();

    let caps = RE_DATE.captures(clause)?;
    let month: u32 = caps["m"].parse().ok()?;
    let day: u32 = caps["d"].parse().ok()?;
    let year: i32 = caps["y"].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
