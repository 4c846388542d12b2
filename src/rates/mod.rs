// src/rates/mod.rs
//! Membership rate model plus the two stages that produce it:
//! `extract` (page → text lines) and `parser` (line → `Rate`).

pub mod extract;
pub mod parser;

use chrono::NaiveDate;
use serde::Serialize;

pub use extract::{extract_lines, ExtractError};
pub use parser::parse_rate;

/// One price tier as published on the membership page.
///
/// `deadline == None` covers both "no cutoff published" (at-the-door pricing)
/// and "cutoff text we could not read" (prose dates). Callers must not treat it
/// as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rate {
    /// Source line exactly as handed to the parser.
    pub raw_line: String,
    pub price: String,
    pub is_tba: bool,
    pub deadline: Option<NaiveDate>,
}

impl Rate {
    pub fn new(raw_line: impl Into<String>, price: impl Into<String>, deadline: Option<NaiveDate>) -> Self {
        let price = price.into();
        Self {
            raw_line: raw_line.into(),
            is_tba: price.eq_ignore_ascii_case("tba"),
            price,
            deadline,
        }
    }

    /// Whole calendar days from `today` to the deadline; negative once it has passed.
    pub fn days_until(&self, today: NaiveDate) -> Option<i64> {
        self.deadline.map(|d| d.signed_duration_since(today).num_days())
    }
}

/// Parse every extracted line, keeping source order. Blank lines never reach the parser.
pub fn parse_all<S: AsRef<str>>(lines: &[S]) -> Vec<Rate> {
    lines
        .iter()
        .map(AsRef::as_ref)
        .filter(|l| !l.trim().is_empty())
        .map(parse_rate)
        .collect()
}
