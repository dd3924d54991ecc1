//! Signal source adapter for the bedside sensor device.
//!
//! The device exposes two read-only endpoints, one for vitals and one for the
//! touch sensor. Each is fetched with its own timeout and each failure is
//! contained: a dead touch sensor must not hide valid vitals and vice versa.

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::{SignalReading, TouchReading, VitalsReading};
use crate::Config;

// ---

/// Why a single sub-fetch fell back to defaults.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("device request timed out")]
    Timeout,
    #[error("device request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("device returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed device response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for DeviceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeviceError::Timeout
        } else if err.is_decode() {
            DeviceError::Malformed(err.to_string())
        } else {
            DeviceError::Http(err)
        }
    }
}

/// Post-processing applied to live vitals.
#[derive(Debug, Clone, Default)]
pub struct Calibration {
    // ---
    /// Added to the device temperature when the vitals fetch succeeded.
    pub temperature_offset: f64,
    /// Demo mode: replace bpm with a random value from this range.
    pub bpm_override: Option<RangeInclusive<u32>>,
}

#[derive(Debug, Clone)]
pub struct SignalSource {
    client: reqwest::Client,
    data_url: String,
    touch_url: String,
    timeout: Duration,
    calibration: Calibration,
}

impl SignalSource {
    // ---
    pub fn new(
        client: reqwest::Client,
        data_url: impl Into<String>,
        touch_url: impl Into<String>,
        timeout: Duration,
        calibration: Calibration,
    ) -> Self {
        Self {
            client,
            data_url: data_url.into(),
            touch_url: touch_url.into(),
            timeout,
            calibration,
        }
    }

    pub fn from_config(client: reqwest::Client, cfg: &Config) -> Self {
        Self::new(
            client,
            cfg.device_data_url.clone(),
            cfg.device_touch_url.clone(),
            cfg.device_timeout,
            Calibration {
                temperature_offset: cfg.temperature_offset,
                bpm_override: cfg.bpm_override.clone(),
            },
        )
    }

    /// Fetch vitals and touch concurrently. Never fails.
    pub async fn poll(&self) -> SignalReading {
        // ---
        let (vitals, touch) = tokio::join!(
            self.fetch::<VitalsReading>(&self.data_url),
            self.fetch::<TouchReading>(&self.touch_url),
        );

        let vitals = match vitals {
            Ok(mut v) => {
                v.temperature += self.calibration.temperature_offset;
                v
            }
            Err(e) => {
                warn!(url = %self.data_url, error = %e, "Device vitals unavailable, using defaults");
                VitalsReading::default()
            }
        };

        let touch = touch.unwrap_or_else(|e| {
            warn!(url = %self.touch_url, error = %e, "Device touch unavailable, using defaults");
            TouchReading::default()
        });

        let mut reading = SignalReading::merge(vitals, touch);
        if let Some(range) = &self.calibration.bpm_override {
            reading.bpm = rand::thread_rng().gen_range(range.clone());
        }

        debug!(?reading, "Device poll complete");
        reading
    }

    /// One bounded, single-attempt GET decoded as `T`.
    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, DeviceError> {
        // ---
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        if !response.status().is_success() {
            return Err(DeviceError::Status(response.status()));
        }
        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use axum::{routing::get, Json, Router};
    use std::time::Instant;

    /// URL on a port nothing listens on.
    async fn dead_url(path: &str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}{}", addr, path)
    }

    async fn spawn_device(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn source(data_url: String, touch_url: String, calibration: Calibration) -> SignalSource {
        SignalSource::new(
            reqwest::Client::new(),
            data_url,
            touch_url,
            Duration::from_millis(300),
            calibration,
        )
    }

    #[tokio::test]
    async fn test_unreachable_device_degrades_to_defaults() {
        // ---
        let src = source(
            dead_url("/getData").await,
            dead_url("/getTouch").await,
            Calibration::default(),
        );
        let reading = src.poll().await;
        assert_eq!(
            reading,
            SignalReading {
                temperature: 0.0,
                bpm: 0,
                beat: false,
                touched: false
            }
        );
    }

    #[tokio::test]
    async fn test_dead_touch_does_not_mask_vitals() {
        // ---
        let base = spawn_device(Router::new().route(
            "/getData",
            get(|| async { Json(serde_json::json!({"temperature": 36.5, "bpm": 71, "beat": true})) }),
        ))
        .await;

        let src = source(
            format!("{}/getData", base),
            dead_url("/getTouch").await,
            Calibration::default(),
        );
        let reading = src.poll().await;
        assert_eq!(reading.temperature, 36.5);
        assert_eq!(reading.bpm, 71);
        assert!(reading.beat);
        assert!(!reading.touched);
    }

    #[tokio::test]
    async fn test_float_bpm_keeps_temperature() {
        // ---
        let base = spawn_device(Router::new().route(
            "/getData",
            get(|| async { Json(serde_json::json!({"temperature": 36.5, "bpm": 72.0, "beat": true})) }),
        ))
        .await;

        let src = source(
            format!("{}/getData", base),
            dead_url("/getTouch").await,
            Calibration::default(),
        );
        let reading = src.poll().await;
        assert_eq!(reading.temperature, 36.5);
        assert_eq!(reading.bpm, 72);
        assert!(reading.beat);
    }

    #[tokio::test]
    async fn test_malformed_vitals_do_not_mask_touch() {
        // ---
        let base = spawn_device(
            Router::new()
                .route("/getData", get(|| async { "not json" }))
                .route(
                    "/getTouch",
                    get(|| async { Json(serde_json::json!({"touched": true})) }),
                ),
        )
        .await;

        let src = source(
            format!("{}/getData", base),
            format!("{}/getTouch", base),
            Calibration::default(),
        );
        let reading = src.poll().await;
        assert_eq!(reading.temperature, 0.0);
        assert_eq!(reading.bpm, 0);
        assert!(reading.touched);
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out_independently() {
        // ---
        let base = spawn_device(
            Router::new()
                .route(
                    "/getData",
                    get(|| async {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        Json(serde_json::json!({"temperature": 1.0, "bpm": 1, "beat": true}))
                    }),
                )
                .route(
                    "/getTouch",
                    get(|| async { Json(serde_json::json!({"touched": true})) }),
                ),
        )
        .await;

        let src = source(
            format!("{}/getData", base),
            format!("{}/getTouch", base),
            Calibration::default(),
        );
        let started = Instant::now();
        let reading = src.poll().await;
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(reading.bpm, 0);
        assert!(reading.touched);
    }

    #[tokio::test]
    async fn test_calibration_applies() {
        // ---
        let base = spawn_device(Router::new().route(
            "/getData",
            get(|| async { Json(serde_json::json!({"temperature": 31.0, "bpm": 10, "beat": false})) }),
        ))
        .await;

        let src = source(
            format!("{}/getData", base),
            dead_url("/getTouch").await,
            Calibration {
                temperature_offset: 5.0,
                bpm_override: Some(80..=100),
            },
        );
        let reading = src.poll().await;
        assert_eq!(reading.temperature, 36.0);
        assert!((80..=100).contains(&reading.bpm));
    }

    #[test]
    fn test_status_error_display() {
        let err = DeviceError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "device returned status 503 Service Unavailable");
    }
}
