//! `POST /api/usr/location`: client GPS update.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::{AppState, Location};

// ---

pub fn router() -> Router<Arc<AppState>> {
    // ---
    Router::new().route("/api/usr/location", post(handler))
}

#[derive(Debug, Deserialize)]
struct LocationUpdate {
    longitude: f64,
    latitude: f64,
}

#[derive(Serialize)]
struct LocationResponse {
    status: &'static str,
    message: &'static str,
    location: Location,
}

async fn handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LocationUpdate>, JsonRejection>,
) -> Result<Json<LocationResponse>, ApiError> {
    // ---
    let Json(update) = payload.map_err(|e| {
        debug!(error = %e, "POST /api/usr/location - invalid body");
        ApiError::Validation("Invalid location data".into())
    })?;

    let location = state.location.update(update.latitude, update.longitude)?;

    // Level-triggered: may repeat on every update while an alert is open
    let alerts = state.alerts.snapshot()?;
    state.notifier.notify_location(&alerts, &location);

    Ok(Json(LocationResponse {
        status: "success",
        message: "Location received",
        location,
    }))
}
