// src/api.rs
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tower_http::cors::CorsLayer;

use crate::commands;
use crate::fetch::PageSource;
use crate::pipeline;
use crate::rates::Rate;
use crate::reminder::{build_reminder, today_in};

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn PageSource>,
    pub heading: String,
    pub zone: Tz,
    /// Fixed "today" for tests; `None` means derive it from the clock in `zone`.
    pub today_override: Option<NaiveDate>,
}

impl AppState {
    pub fn new(source: Arc<dyn PageSource>, heading: impl Into<String>, zone: Tz) -> Self {
        Self {
            source,
            heading: heading.into(),
            zone,
            today_override: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today_override = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today_override
            .unwrap_or_else(|| today_in(&self.zone, Utc::now()))
    }

    async fn rates(&self) -> Result<Vec<Rate>, (StatusCode, String)> {
        pipeline::fetch_rates(self.source.as_ref(), &self.heading)
            .await
            .map_err(|e| {
                tracing::warn!(error = ?e, "rate fetch for api failed");
                (StatusCode::BAD_GATEWAY, format!("{e:#}"))
            })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/rates", get(rates))
        .route("/deadlines", get(deadlines))
        .route("/deadlines/next", get(next_deadline))
        .route("/reminder", get(reminder_preview))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn rates(State(state): State<AppState>) -> Result<Json<Vec<Rate>>, (StatusCode, String)> {
    Ok(Json(state.rates().await?))
}

async fn deadlines(State(state): State<AppState>) -> Result<String, (StatusCode, String)> {
    let rates = state.rates().await?;
    Ok(commands::list_all_deadlines(state.today(), &rates))
}

async fn next_deadline(State(state): State<AppState>) -> Result<String, (StatusCode, String)> {
    let rates = state.rates().await?;
    Ok(commands::next_deadline(state.today(), &rates))
}

/// What a check would send today. Never delivered from here.
async fn reminder_preview(State(state): State<AppState>) -> Result<String, (StatusCode, String)> {
    let rates = state.rates().await?;
    Ok(build_reminder(state.today(), &rates))
}
