//! Alert state store: the sole authority for alert transitions.
//!
//! Each [`AlertKind`] is a two-state machine with an acknowledgment flag:
//!
//! ```text
//!            report(true) / edge
//!   Idle ─────────────────────────► Active ──┐ report(true) / no edge
//!    ▲                                │  ▲   │
//!    │          acknowledge()         │  └───┘
//!    └────────────────────────────────┘
//! ```
//!
//! `report(false)` never changes state; only acknowledgment clears an alert.
//! Callers must act on [`TransitionResult::edge_fired`] and never re-derive
//! "is this new" from a later snapshot, since another request may have moved
//! the state in between.
//!
//! Every read-modify-write happens under the kind's own mutex, so reports for
//! the same kind serialize while the two kinds never contend with each other.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::models::{AlertKind, AlertRecord, AlertSnapshot, TransitionResult};

// ---

#[derive(Debug, Default)]
pub struct AlertStore {
    distress: Mutex<AlertRecord>,
    help: Mutex<AlertRecord>,
}

impl AlertStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, kind: AlertKind) -> Result<MutexGuard<'_, AlertRecord>, StoreError> {
        let slot = match kind {
            AlertKind::Distress => &self.distress,
            AlertKind::Help => &self.help,
        };
        slot.lock().map_err(|_| StoreError::LockPoisoned(kind.as_str()))
    }

    /// Feed one observation of a trigger signal into the state machine.
    ///
    /// Returns `edge_fired = true` only for the observation that moved the
    /// kind from idle to active.
    pub fn report_signal(
        &self,
        kind: AlertKind,
        is_triggered: bool,
    ) -> Result<TransitionResult, StoreError> {
        // ---
        if !is_triggered {
            return Ok(TransitionResult { edge_fired: false });
        }

        let mut record = self.lock(kind)?;
        if record.active {
            debug!(%kind, "Alert already active, suppressing duplicate trigger");
            return Ok(TransitionResult { edge_fired: false });
        }

        let now = Utc::now();
        record.active = true;
        record.acknowledged = false;
        record.triggered_at = Some(now);
        warn!(%kind, triggered_at = %now.to_rfc3339(), "New alert raised");

        Ok(TransitionResult { edge_fired: true })
    }

    /// Clear an alert. Idempotent; acknowledging an idle kind just marks it.
    pub fn acknowledge(&self, kind: AlertKind) -> Result<(), StoreError> {
        // ---
        let mut record = self.lock(kind)?;
        let was_active = record.active;
        record.active = false;
        record.acknowledged = true;
        info!(%kind, was_active, "Alert acknowledged and cleared");
        Ok(())
    }

    /// Copy of one kind's record.
    pub fn record(&self, kind: AlertKind) -> Result<AlertRecord, StoreError> {
        Ok(*self.lock(kind)?)
    }

    /// Copy of both records. Each kind is read under its own lock.
    pub fn snapshot(&self) -> Result<AlertSnapshot, StoreError> {
        Ok(AlertSnapshot {
            distress: self.record(AlertKind::Distress)?,
            help: self.record(AlertKind::Help)?,
        })
    }
}
