//! `GET /api/usr/status`: read-only view of alerts and location.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ApiError;
use crate::{AlertState, AppState, Location};

// ---

pub fn router() -> Router<Arc<AppState>> {
    // ---
    Router::new().route("/api/usr/status", get(handler))
}

#[derive(Serialize)]
struct TriggeredAt {
    #[serde(skip_serializing_if = "Option::is_none")]
    distress: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct StatusResponse {
    state: AlertState,
    location: Location,
    triggered_at: TriggeredAt,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_touch: Option<DateTime<Utc>>,
}

async fn handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    // ---
    let alerts = state.alerts.snapshot()?;

    Ok(Json(StatusResponse {
        state: alerts.state(),
        location: state.location.get()?,
        triggered_at: TriggeredAt {
            distress: alerts.distress.triggered_at,
            help: alerts.help.triggered_at,
        },
        last_touch: state.last_touch()?,
    }))
}
