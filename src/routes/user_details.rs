//! `POST /api/usr/details`: client distress/help flags.
//!
//! Each true flag is reported to the alert store independently; an SMS goes
//! out only for the flag whose report moved its alert from idle to active.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::{AlertKind, AlertState, AppState};

// ---

pub fn router() -> Router<Arc<AppState>> {
    // ---
    Router::new().route("/api/usr/details", post(handler))
}

#[derive(Debug, Deserialize)]
struct DetailsPush {
    distress: bool,
    help: bool,
}

#[derive(Serialize)]
struct DetailsResponse {
    status: &'static str,
    message: &'static str,
    state: AlertState,
}

async fn handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DetailsPush>, JsonRejection>,
) -> Result<Json<DetailsResponse>, ApiError> {
    // ---
    let Json(push) = payload.map_err(|e| {
        debug!(error = %e, "POST /api/usr/details - invalid body");
        ApiError::Validation("Invalid user details".into())
    })?;

    let location = state.location.get()?;
    for (kind, flag) in [(AlertKind::Distress, push.distress), (AlertKind::Help, push.help)] {
        let result = state.alerts.report_signal(kind, flag)?;
        state.notifier.notify_edge(kind, result, &location);
    }

    let snapshot = state.alerts.snapshot()?;
    info!(
        distress = snapshot.distress.active,
        distress_ack = snapshot.distress.acknowledged,
        help = snapshot.help.active,
        help_ack = snapshot.help.acknowledged,
        "Current alert state"
    );

    Ok(Json(DetailsResponse {
        status: "success",
        message: "User details received",
        state: snapshot.state(),
    }))
}
