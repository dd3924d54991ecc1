//! Simple data models for the vitals relay.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---

/// Raw vitals as reported by the device's data endpoint.
///
/// Each field falls back to its default on its own, so a missing `beat` does
/// not throw away a good temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct VitalsReading {
    // ---
    #[serde(default)]
    pub temperature: f64,
    #[serde(default, deserialize_with = "lenient_bpm")]
    pub bpm: u32,
    #[serde(default)]
    pub beat: bool,
}

/// Accept any JSON number (or null) for bpm; firmware often sends `72.0`.
fn lenient_bpm<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    Ok(raw.round().clamp(0.0, u32::MAX as f64) as u32)
}

/// Raw touch flag as reported by the device's touch endpoint.
///
/// A body without `touched` counts as "not touched".
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct TouchReading {
    // ---
    #[serde(default)]
    pub touched: bool,
}

/// Merged reading served to the frontend by `GET /api/data`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalReading {
    // ---
    pub temperature: f64,
    pub bpm: u32,
    pub beat: bool,
    pub touched: bool,
}

impl SignalReading {
    // ---
    pub fn merge(vitals: VitalsReading, touch: TouchReading) -> Self {
        Self {
            temperature: vitals.temperature,
            bpm: vitals.bpm,
            beat: vitals.beat,
            touched: touch.touched,
        }
    }
}

/// The two independently tracked alert channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Distress,
    Help,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Distress => "distress",
            AlertKind::Help => "help",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kind alert bookkeeping.
///
/// `triggered_at` is the time of the most recent false→true transition and
/// is kept after acknowledgment until the next edge overwrites it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertRecord {
    // ---
    pub active: bool,
    pub acknowledged: bool,
    pub triggered_at: Option<DateTime<Utc>>,
}

impl AlertRecord {
    /// True while the alert is outstanding and nobody has handled it yet.
    pub fn needs_attention(&self) -> bool {
        self.active && !self.acknowledged
    }
}

/// Outcome of reporting a signal to the alert store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionResult {
    // ---
    pub edge_fired: bool,
}

/// Point-in-time copy of both alert records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertSnapshot {
    // ---
    pub distress: AlertRecord,
    pub help: AlertRecord,
}

impl AlertSnapshot {
    pub fn record(&self, kind: AlertKind) -> &AlertRecord {
        match kind {
            AlertKind::Distress => &self.distress,
            AlertKind::Help => &self.help,
        }
    }

    pub fn any_needs_attention(&self) -> bool {
        self.distress.needs_attention() || self.help.needs_attention()
    }

    /// The `state` object echoed by the user endpoints.
    pub fn state(&self) -> AlertState {
        AlertState {
            distress: self.distress.active,
            help: self.help.active,
        }
    }
}

/// Wire form of the active flags: `{distress, help}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    // ---
    pub distress: bool,
    pub help: bool,
}

/// Last client-reported coordinates. Last write wins, no history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    // ---
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl Location {
    // ---
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            longitude: Some(longitude),
            latitude: Some(latitude),
        }
    }

    /// Human-readable `"lat, lon"`, with `Unknown` for absent fields.
    pub fn describe(&self) -> String {
        fn part(v: Option<f64>) -> String {
            v.map(|x| format!("{:?}", x))
                .unwrap_or_else(|| "Unknown".to_string())
        }
        format!("{}, {}", part(self.latitude), part(self.longitude))
    }
}
