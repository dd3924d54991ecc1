//! Configuration loader for the `vitals-relay` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::{env, ops::RangeInclusive, time::Duration};

use anyhow::{anyhow, bail, Result};

/// Parse an optional environment variable of type `$ty` with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Read an optional string environment variable, treating blank as unset.
macro_rules! optional_env {
    ($var_name:expr) => {
        env::var($var_name).ok().filter(|v| !v.trim().is_empty())
    };
}

pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";
const DEFAULT_DEVICE_TIMEOUT_MS: u64 = 2000;
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;

/// Credentials and routing for the SMS provider.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    // ---
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
    pub api_base: String,
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Device vitals endpoint returning `{temperature, bpm, beat}`.
    pub device_data_url: String,

    /// Device touch endpoint returning `{touched}`.
    pub device_touch_url: String,

    /// Timeout applied to each device sub-fetch independently.
    pub device_timeout: Duration,

    /// HTTP listen port.
    pub port: u16,

    /// Calibration added to live temperature readings.
    pub temperature_offset: f64,

    /// Demo mode: replace bpm with a random value from this range.
    pub bpm_override: Option<RangeInclusive<u32>>,

    /// Upper bound on a single notification send.
    pub notify_timeout: Duration,

    /// SMS provider settings; `None` selects the log-only transport.
    pub sms: Option<SmsConfig>,
}

impl Config {
    /// Configuration for the given device endpoints with every optional
    /// setting at its default.
    pub fn new(device_data_url: impl Into<String>, device_touch_url: impl Into<String>) -> Self {
        Self {
            device_data_url: device_data_url.into(),
            device_touch_url: device_touch_url.into(),
            device_timeout: Duration::from_millis(DEFAULT_DEVICE_TIMEOUT_MS),
            port: DEFAULT_PORT,
            temperature_offset: 0.0,
            bpm_override: None,
            notify_timeout: Duration::from_secs(DEFAULT_NOTIFY_TIMEOUT_SECS),
            sms: None,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DEVICE_DATA_URL` – device vitals endpoint
/// - `DEVICE_TOUCH_URL` – device touch endpoint
///
/// Optional:
/// - `DEVICE_TIMEOUT_MS` – per sub-fetch timeout (default: 2000)
/// - `RELAY_PORT` – listen port (default: 8000)
/// - `TEMPERATURE_OFFSET` – calibration offset (default: 0.0)
/// - `BPM_OVERRIDE_RANGE` – `lo-hi` demo bpm range (default: unset)
/// - `NOTIFY_TIMEOUT_SECS` – SMS send bound (default: 10)
/// - `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_PHONE_NUMBER`,
///   `ALERT_PHONE_NUMBER` – all or none
/// - `TWILIO_API_BASE` – provider base URL (default: `https://api.twilio.com`)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let device_data_url = require_env!("DEVICE_DATA_URL");
    let device_touch_url = require_env!("DEVICE_TOUCH_URL");
    let device_timeout_ms = parse_env!("DEVICE_TIMEOUT_MS", u64, DEFAULT_DEVICE_TIMEOUT_MS);
    let port = parse_env!("RELAY_PORT", u16, DEFAULT_PORT);
    let temperature_offset = parse_env!("TEMPERATURE_OFFSET", f64, 0.0);
    let notify_timeout_secs = parse_env!("NOTIFY_TIMEOUT_SECS", u64, DEFAULT_NOTIFY_TIMEOUT_SECS);

    let bpm_override = optional_env!("BPM_OVERRIDE_RANGE")
        .map(|v| parse_bpm_range(&v))
        .transpose()?;

    let sms = sms_from_parts(
        optional_env!("TWILIO_ACCOUNT_SID"),
        optional_env!("TWILIO_AUTH_TOKEN"),
        optional_env!("TWILIO_PHONE_NUMBER"),
        optional_env!("ALERT_PHONE_NUMBER"),
        optional_env!("TWILIO_API_BASE"),
    )?;

    Ok(Config {
        device_timeout: Duration::from_millis(device_timeout_ms),
        port,
        temperature_offset,
        bpm_override,
        notify_timeout: Duration::from_secs(notify_timeout_secs),
        sms,
        ..Config::new(device_data_url, device_touch_url)
    })
}

/// Parse `"lo-hi"` into an inclusive bpm range.
fn parse_bpm_range(raw: &str) -> Result<RangeInclusive<u32>> {
    // ---
    let (lo, hi) = raw
        .split_once('-')
        .ok_or_else(|| anyhow!("Invalid BPM_OVERRIDE_RANGE '{}': expected lo-hi", raw))?;
    let lo: u32 = lo
        .trim()
        .parse()
        .map_err(|e| anyhow!("Invalid BPM_OVERRIDE_RANGE '{}': {}", raw, e))?;
    let hi: u32 = hi
        .trim()
        .parse()
        .map_err(|e| anyhow!("Invalid BPM_OVERRIDE_RANGE '{}': {}", raw, e))?;
    if lo > hi {
        bail!("Invalid BPM_OVERRIDE_RANGE '{}': lower bound exceeds upper", raw);
    }
    Ok(lo..=hi)
}

/// SMS credentials are all-or-none; a partial set is almost certainly a typo.
fn sms_from_parts(
    account_sid: Option<String>,
    auth_token: Option<String>,
    from_number: Option<String>,
    to_number: Option<String>,
    api_base: Option<String>,
) -> Result<Option<SmsConfig>> {
    // ---
    match (account_sid, auth_token, from_number, to_number) {
        (Some(account_sid), Some(auth_token), Some(from_number), Some(to_number)) => {
            Ok(Some(SmsConfig {
                account_sid,
                auth_token,
                from_number,
                to_number,
                api_base: api_base.unwrap_or_else(|| DEFAULT_TWILIO_API_BASE.to_string()),
            }))
        }
        (None, None, None, None) => Ok(None),
        _ => bail!(
            "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN, TWILIO_PHONE_NUMBER and \
             ALERT_PHONE_NUMBER must be set together"
        ),
    }
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the SMS auth token while showing all other values.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DEVICE_DATA_URL     : {}", self.device_data_url);
        tracing::info!("  DEVICE_TOUCH_URL    : {}", self.device_touch_url);
        tracing::info!("  DEVICE_TIMEOUT_MS   : {}", self.device_timeout.as_millis());
        tracing::info!("  RELAY_PORT          : {}", self.port);
        tracing::info!("  TEMPERATURE_OFFSET  : {}", self.temperature_offset);
        match &self.bpm_override {
            Some(range) => tracing::info!(
                "  BPM_OVERRIDE_RANGE  : {}-{} (demo mode)",
                range.start(),
                range.end()
            ),
            None => tracing::info!("  BPM_OVERRIDE_RANGE  : off"),
        }
        tracing::info!("  NOTIFY_TIMEOUT_SECS : {}", self.notify_timeout.as_secs());
        match &self.sms {
            Some(sms) => {
                tracing::info!("  TWILIO_ACCOUNT_SID  : {}", sms.account_sid);
                tracing::info!("  TWILIO_AUTH_TOKEN   : {}", mask_secret(&sms.auth_token));
                tracing::info!("  TWILIO_PHONE_NUMBER : {}", sms.from_number);
                tracing::info!("  ALERT_PHONE_NUMBER  : {}", sms.to_number);
                tracing::info!("  TWILIO_API_BASE     : {}", sms.api_base);
            }
            None => tracing::warn!("  SMS                 : not configured, alerts are logged only"),
        }
    }
}

/// Keep the last four characters of a secret, mask the rest.
fn mask_secret(secret: &str) -> String {
    // ---
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_parse_bpm_range() {
        // ---
        assert_eq!(parse_bpm_range("80-100").unwrap(), 80..=100);
        assert_eq!(parse_bpm_range(" 60 - 60 ").unwrap(), 60..=60);

        assert!(parse_bpm_range("100-80").is_err());
        assert!(parse_bpm_range("80").is_err());
        assert!(parse_bpm_range("a-b").is_err());
    }

    #[test]
    fn test_sms_all_or_none() {
        // ---
        let s = |v: &str| Some(v.to_string());

        assert!(sms_from_parts(None, None, None, None, None).unwrap().is_none());

        let sms = sms_from_parts(s("AC1"), s("tok"), s("+100"), s("+200"), None)
            .unwrap()
            .unwrap();
        assert_eq!(sms.api_base, DEFAULT_TWILIO_API_BASE);
        assert_eq!(sms.to_number, "+200");

        assert!(sms_from_parts(s("AC1"), None, s("+100"), s("+200"), None).is_err());
    }

    #[test]
    fn test_mask_secret() {
        // ---
        assert_eq!(mask_secret("abc"), "****");
        assert_eq!(mask_secret("supersecret1234"), "****1234");
    }

    #[test]
    fn test_defaults() {
        // ---
        let cfg = Config::new("http://dev/getData", "http://dev/getTouch");
        assert_eq!(cfg.device_timeout, Duration::from_millis(2000));
        assert_eq!(cfg.port, 8000);
        assert!(cfg.bpm_override.is_none());
        assert!(cfg.sms.is_none());
    }
}
