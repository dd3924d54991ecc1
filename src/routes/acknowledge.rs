//! `POST /api/usr/acknowledge`: operator clears one or both alerts.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::{AlertKind, AlertState, AppState};

// ---

pub fn router() -> Router<Arc<AppState>> {
    // ---
    Router::new().route("/api/usr/acknowledge", post(handler))
}

#[derive(Debug, Deserialize)]
struct AckPush {
    distress_ack: Option<bool>,
    help_ack: Option<bool>,
}

#[derive(Serialize)]
struct AckResponse {
    status: &'static str,
    message: &'static str,
    state: AlertState,
}

async fn handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AckPush>, JsonRejection>,
) -> Result<Json<AckResponse>, ApiError> {
    // ---
    let invalid = || ApiError::Validation("Invalid acknowledgment data".into());

    let Json(ack) = payload.map_err(|e| {
        debug!(error = %e, "POST /api/usr/acknowledge - invalid body");
        invalid()
    })?;
    if ack.distress_ack.is_none() && ack.help_ack.is_none() {
        return Err(invalid());
    }

    for (kind, flag) in [(AlertKind::Distress, ack.distress_ack), (AlertKind::Help, ack.help_ack)] {
        if flag == Some(true) {
            state.alerts.acknowledge(kind)?;
        }
    }

    Ok(Json(AckResponse {
        status: "success",
        message: "Alert acknowledged",
        state: state.alerts.snapshot()?.state(),
    }))
}
