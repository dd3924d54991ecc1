//! Edge-trigger notifier and SMS transports.
//!
//! The notifier turns alert edges and location refreshes into text messages
//! and hands them to a [`NotificationTransport`]. Every send is spawned off the
//! request path, attempted once, and bounded by a timeout. Failures end up in
//! the log at `error` level and nowhere else.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::SmsConfig;
use crate::models::{AlertKind, AlertSnapshot, Location, TransitionResult};

// ---

/// Provider-assigned identifier for one delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryId(pub String);

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("provider response carried no delivery id")]
    MissingDeliveryId,
    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

/// Outbound channel for alert messages.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Transport name used in logs.
    fn name(&self) -> &str;

    /// Deliver one message. Single attempt, no retries.
    async fn send(&self, message: &str) -> Result<DeliveryId, TransportError>;
}

// ---

/// Twilio Programmable Messaging over its REST API.
pub struct TwilioTransport {
    client: reqwest::Client,
    sms: SmsConfig,
}

#[derive(Deserialize)]
struct TwilioMessage {
    sid: Option<String>,
}

impl TwilioTransport {
    pub fn new(client: reqwest::Client, sms: SmsConfig) -> Self {
        Self { client, sms }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.sms.api_base.trim_end_matches('/'),
            self.sms.account_sid
        )
    }
}

#[async_trait]
impl NotificationTransport for TwilioTransport {
    fn name(&self) -> &str {
        "twilio"
    }

    async fn send(&self, message: &str) -> Result<DeliveryId, TransportError> {
        // ---
        let params = [
            ("To", self.sms.to_number.as_str()),
            ("From", self.sms.from_number.as_str()),
            ("Body", message),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.sms.account_sid, Some(&self.sms.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: TwilioMessage = response.json().await?;
        created
            .sid
            .map(DeliveryId)
            .ok_or(TransportError::MissingDeliveryId)
    }
}

/// Writes alerts to the log instead of sending them. Used when no SMS
/// credentials are configured.
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl NotificationTransport for LogTransport {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &str) -> Result<DeliveryId, TransportError> {
        let id = DeliveryId(uuid::Uuid::new_v4().to_string());
        warn!(delivery_id = %id, text = message, "Alert (SMS not configured)");
        Ok(id)
    }
}

// ---

/// Message for a new alert edge of `kind`.
pub fn alert_message(kind: AlertKind, location: &Location) -> String {
    match kind {
        AlertKind::Distress => format!(
            "⚠️ DISTRESS SIGNAL from user at location: {}",
            location.describe()
        ),
        AlertKind::Help => format!(
            "🆘 HELP REQUEST from user at location: {}",
            location.describe()
        ),
    }
}

/// Message re-sent when the location moves during an unhandled alert.
pub fn location_message(location: &Location) -> String {
    format!(
        "🚨 ALERT: User needs assistance at location: {}",
        location.describe()
    )
}

#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn NotificationTransport>,
    timeout: Duration,
}

impl Notifier {
    // ---
    pub fn new(transport: Arc<dyn NotificationTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Send an alert for `kind` if and only if `result` reports a new edge.
    pub fn notify_edge(
        &self,
        kind: AlertKind,
        result: TransitionResult,
        location: &Location,
    ) -> Option<JoinHandle<()>> {
        // ---
        if !result.edge_fired {
            return None;
        }
        Some(self.dispatch(alert_message(kind, location)))
    }

    /// Level-triggered: re-send on every location update while any alert is
    /// active and unacknowledged. Repeated updates mean repeated messages.
    pub fn notify_location(
        &self,
        alerts: &AlertSnapshot,
        location: &Location,
    ) -> Option<JoinHandle<()>> {
        // ---
        if !alerts.any_needs_attention() {
            return None;
        }
        Some(self.dispatch(location_message(location)))
    }

    /// Fire-and-forget delivery of one message.
    pub fn dispatch(&self, message: String) -> JoinHandle<()> {
        // ---
        let transport = Arc::clone(&self.transport);
        let timeout = self.timeout;

        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, transport.send(&message)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(timeout)),
            };

            match outcome {
                Ok(id) => info!(
                    transport = transport.name(),
                    delivery_id = %id,
                    "Alert notification sent"
                ),
                Err(e) => error!(
                    transport = transport.name(),
                    error = %e,
                    text = %message,
                    "Alert notification failed, not retrying"
                ),
            }
        })
    }
}
