//! `GET /api/data`: the frontend's polling endpoint.
//!
//! Polls the device fresh on every call and returns the merged reading. It
//! is not read-only: a touched device is reported as a help request, so this
//! is the one place touch can raise an alert and send an SMS.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use tracing::{debug, error};

use crate::{AlertKind, AppState, SignalReading};

// ---

pub fn router() -> Router<Arc<AppState>> {
    // ---
    Router::new().route("/api/data", get(handler))
}

async fn handler(State(state): State<Arc<AppState>>) -> Json<SignalReading> {
    // ---
    debug!("GET /api/data - polling device");
    let reading = state.device.poll().await;

    match state.alerts.report_signal(AlertKind::Help, reading.touched) {
        Ok(result) if result.edge_fired => {
            let location = state.location.get().unwrap_or_else(|e| {
                error!(error = %e, "Location unavailable for touch alert");
                Default::default()
            });
            state.notifier.notify_edge(AlertKind::Help, result, &location);
        }
        Ok(_) => {}
        Err(e) => error!(error = %e, "Failed to record device touch as help request"),
    }

    Json(reading)
}
