//! Kiosk configuration file.
//!
//! Every section and every key is optional:
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8080"
//! stream_interval_ms = 30
//!
//! [timing]
//! success_hold_ms = 30000
//! enroll_timeout_ms = 60000
//!
//! [record_update]
//! endpoint = "https://inventory.example/api/checkout"
//! timeout_ms = 5000
//!
//! [runtime]
//! exit_on_reset = false
//! ```
//!
//! The record update API key is read from `KIOSK_API_KEY` when set, so it
//! does not have to live in the file.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use kiosk_controller::ControllerConfig;
use kiosk_core::constants::{
    DEFAULT_BIOMETRIC_POLL_MS, DEFAULT_CODE_INTERVAL_MS, DEFAULT_DECODE_TIMEOUT_MS,
    DEFAULT_ENROLL_TIMEOUT_MS, DEFAULT_FRAME_INTERVAL_MS, DEFAULT_FRAME_PUT_TIMEOUT_MS,
    DEFAULT_JPEG_QUALITY, DEFAULT_SUCCESS_HOLD_MS, ENROLL_IMAGE_POLL_MS,
};
use kiosk_network::{DEFAULT_UPDATE_TIMEOUT, HttpUpdaterConfig};
use serde::{Deserialize, Serialize};

pub const API_KEY_ENV: &str = "KIOSK_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub record_update: RecordUpdateConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address of the HTTP surface
    pub bind: String,

    /// Pause between MJPEG parts (ms)
    pub stream_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            stream_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
        }
    }
}

/// Worker timings, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    pub biometric_poll_ms: u64,
    pub frame_interval_ms: u64,
    pub code_interval_ms: u64,
    pub decode_timeout_ms: u64,
    pub frame_put_timeout_ms: u64,
    pub success_hold_ms: u64,
    pub enroll_timeout_ms: u64,
    pub enroll_image_poll_ms: u64,
    pub jpeg_quality: u8,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            biometric_poll_ms: DEFAULT_BIOMETRIC_POLL_MS,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            code_interval_ms: DEFAULT_CODE_INTERVAL_MS,
            decode_timeout_ms: DEFAULT_DECODE_TIMEOUT_MS,
            frame_put_timeout_ms: DEFAULT_FRAME_PUT_TIMEOUT_MS,
            success_hold_ms: DEFAULT_SUCCESS_HOLD_MS,
            enroll_timeout_ms: DEFAULT_ENROLL_TIMEOUT_MS,
            enroll_image_poll_ms: ENROLL_IMAGE_POLL_MS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordUpdateConfig {
    /// Inventory endpoint; updates are only logged when unset
    pub endpoint: Option<String>,

    pub api_key: Option<String>,

    pub timeout_ms: u64,
}

impl Default for RecordUpdateConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_ms: DEFAULT_UPDATE_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Exit after every reset so a supervisor restarts the process
    pub exit_on_reset: bool,
}

impl Config {
    /// Load the config file at `path`, or the defaults when `path` is `None`.
    ///
    /// Applies the `KIOSK_API_KEY` override and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                Self::from_toml(&contents)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            None => Self::default(),
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.record_update.api_key = Some(key);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        let t = &self.timing;
        let durations = [
            ("server.stream_interval_ms", self.server.stream_interval_ms),
            ("timing.biometric_poll_ms", t.biometric_poll_ms),
            ("timing.frame_interval_ms", t.frame_interval_ms),
            ("timing.code_interval_ms", t.code_interval_ms),
            ("timing.decode_timeout_ms", t.decode_timeout_ms),
            ("timing.frame_put_timeout_ms", t.frame_put_timeout_ms),
            ("timing.success_hold_ms", t.success_hold_ms),
            ("timing.enroll_timeout_ms", t.enroll_timeout_ms),
            ("timing.enroll_image_poll_ms", t.enroll_image_poll_ms),
            ("record_update.timeout_ms", self.record_update.timeout_ms),
        ];
        if let Some((key, _)) = durations.iter().find(|(_, ms)| *ms == 0) {
            bail!("{key} must be greater than zero");
        }

        if t.jpeg_quality > 100 {
            bail!("timing.jpeg_quality must be 0-100, got {}", t.jpeg_quality);
        }

        if let Some(endpoint) = &self.record_update.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                bail!("record_update.endpoint must be an http(s) URL, got {endpoint:?}");
            }
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("Invalid server.bind address: {:?}", self.server.bind))
    }

    pub fn stream_interval(&self) -> Duration {
        Duration::from_millis(self.server.stream_interval_ms)
    }

    pub fn controller(&self) -> ControllerConfig {
        let t = &self.timing;
        ControllerConfig {
            biometric_poll_interval: Duration::from_millis(t.biometric_poll_ms),
            frame_interval: Duration::from_millis(t.frame_interval_ms),
            code_interval: Duration::from_millis(t.code_interval_ms),
            decode_timeout: Duration::from_millis(t.decode_timeout_ms),
            frame_put_timeout: Duration::from_millis(t.frame_put_timeout_ms),
            success_hold: Duration::from_millis(t.success_hold_ms),
            enroll_timeout: Duration::from_millis(t.enroll_timeout_ms),
            enroll_image_poll: Duration::from_millis(t.enroll_image_poll_ms),
            jpeg_quality: t.jpeg_quality,
            ..ControllerConfig::default()
        }
    }

    /// HTTP updater settings, if an endpoint is configured.
    pub fn record_updater(&self) -> Option<HttpUpdaterConfig> {
        let r = &self.record_update;
        r.endpoint.as_ref().map(|endpoint| HttpUpdaterConfig {
            endpoint: endpoint.clone(),
            api_key: r.api_key.clone(),
            timeout: Duration::from_millis(r.timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.controller(), ControllerConfig::default());
        assert!(config.record_updater().is_none());
        assert!(!config.runtime.exit_on_reset);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            bind = "127.0.0.1:9000"

            [timing]
            success_hold_ms = 5000

            [record_update]
            endpoint = "http://inventory.local/checkout"
            api_key = "secret"

            [runtime]
            exit_on_reset = true
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr().unwrap().port(), 9000);
        assert_eq!(config.server.stream_interval_ms, DEFAULT_FRAME_INTERVAL_MS);

        let controller = config.controller();
        assert_eq!(controller.success_hold, Duration::from_secs(5));
        assert_eq!(
            controller.enroll_timeout,
            Duration::from_millis(DEFAULT_ENROLL_TIMEOUT_MS)
        );

        let updater = config.record_updater().unwrap();
        assert_eq!(updater.endpoint, "http://inventory.local/checkout");
        assert_eq!(updater.api_key.as_deref(), Some("secret"));
        assert_eq!(updater.timeout, DEFAULT_UPDATE_TIMEOUT);
        assert!(config.runtime.exit_on_reset);
    }

    #[rstest]
    #[case("[server]\nbind = \"not an address\"")]
    #[case("[server]\nstream_interval_ms = 0")]
    #[case("[timing]\nsuccess_hold_ms = 0")]
    #[case("[timing]\nenroll_timeout_ms = 0")]
    #[case("[timing]\njpeg_quality = 101")]
    #[case("[record_update]\ntimeout_ms = 0")]
    #[case("[record_update]\nendpoint = \"inventory.local\"")]
    fn test_invalid_values_rejected(#[case] contents: &str) {
        let config = Config::from_toml(contents).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[timing]\nsuccess_hold_ms = 1500\n").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.controller().success_hold, Duration::from_millis(1500));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("kiosk.toml"))).is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(Config::from_toml("[timing]\nsucess_hold_ms = 10").is_err());
    }
}
