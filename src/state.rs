//! Shared application state handed to every route handler.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::alerts::AlertStore;
use crate::device::SignalSource;
use crate::error::StoreError;
use crate::location::LocationStore;
use crate::notify::{LogTransport, NotificationTransport, Notifier, TwilioTransport};
use crate::Config;

// ---

/// Process-lifetime state. Owned through an `Arc` by the router; nothing
/// here survives a restart.
pub struct AppState {
    pub alerts: AlertStore,
    pub location: LocationStore,
    pub device: SignalSource,
    pub notifier: Notifier,
    last_touch: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    // ---
    pub fn new(device: SignalSource, notifier: Notifier) -> Self {
        Self {
            alerts: AlertStore::new(),
            location: LocationStore::new(),
            device,
            notifier,
            last_touch: Mutex::new(None),
        }
    }

    /// Build the production state: device adapter plus the SMS transport
    /// when credentials are configured, the log transport otherwise.
    pub fn from_config(cfg: &Config) -> Result<Arc<Self>> {
        // ---
        let device_client = reqwest::Client::builder().build()?;
        let device = SignalSource::from_config(device_client, cfg);

        let transport: Arc<dyn NotificationTransport> = match &cfg.sms {
            Some(sms) => {
                let sms_client = reqwest::Client::builder()
                    .timeout(cfg.notify_timeout)
                    .build()?;
                Arc::new(TwilioTransport::new(sms_client, sms.clone()))
            }
            None => Arc::new(LogTransport),
        };
        let notifier = Notifier::new(transport, cfg.notify_timeout);

        Ok(Arc::new(Self::new(device, notifier)))
    }

    /// Record a device touch push.
    pub fn record_touch(&self) -> Result<DateTime<Utc>, StoreError> {
        let now = Utc::now();
        *self
            .last_touch
            .lock()
            .map_err(|_| StoreError::LockPoisoned("touch"))? = Some(now);
        Ok(now)
    }

    pub fn last_touch(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.last_touch
            .lock()
            .map(|t| *t)
            .map_err(|_| StoreError::LockPoisoned("touch"))
    }
}
