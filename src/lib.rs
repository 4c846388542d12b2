// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod commands;
pub mod config;
pub mod fetch;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod rates;
pub mod reminder;
pub mod schedule;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::ReminderConfig;
pub use crate::rates::{extract_lines, parse_rate, ExtractError, Rate};
pub use crate::reminder::{build_reminder, today_in};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
/// `RUST_LOG` drives the filter (default `dragoncon_reminder=info,warn`);
/// `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dragoncon_reminder=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
