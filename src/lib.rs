//! Patient vitals relay.
//!
//! Polls a bedside sensor device for vitals and a touch signal, merges them
//! with client-pushed distress/help flags and GPS location, and sends an SMS
//! when an alert is first raised. Alerts stay raised until a client
//! acknowledges them; repeated triggers in between are suppressed.
//!
//! Module layout follows the Explicit Module Boundary Pattern (EMBP): the
//! stores, device adapter and notifier are leaf modules, `state` wires them
//! together, and `routes` is the single gateway exposing the HTTP surface.

pub mod alerts;
pub mod config;
pub mod device;
pub mod error;
pub mod location;
pub mod models;
pub mod notify;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::router;
pub use state::AppState;

// Re-exported so routes/*.rs depend only on the crate root, not on where
// each model lives.
pub use models::{AlertKind, AlertState, Location, SignalReading};
