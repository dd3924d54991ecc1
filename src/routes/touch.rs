//! `POST /touch`: push from the device when its touch sensor fires.
//!
//! Only records when the last touch happened. Alerting on touch happens in
//! `GET /api/data`, which polls the device's own touch flag.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::AppState;

// ---

pub fn router() -> Router<Arc<AppState>> {
    // ---
    Router::new().route("/touch", post(handler))
}

#[derive(Debug, Deserialize)]
struct TouchPush {
    #[serde(default)]
    touched: bool,
}

#[derive(Serialize)]
struct TouchResponse {
    status: &'static str,
}

async fn handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TouchPush>, JsonRejection>,
) -> Result<Json<TouchResponse>, ApiError> {
    // ---
    match payload {
        Ok(Json(TouchPush { touched: true })) => {
            let at = state.record_touch()?;
            info!(at = %at.to_rfc3339(), "Device touch recorded");
        }
        Ok(_) => debug!("POST /touch - touched not set, ignoring"),
        Err(e) => debug!(error = %e, "POST /touch - malformed body, ignoring"),
    }

    Ok(Json(TouchResponse { status: "ok" }))
}
