//! Device-wide connectivity settings.
//!
//! Defaults are compile-time constants. The access-point identity can be
//! overridden at build time:
//!
//! ```text
//! AP_SSID="Layout-East" AP_PASSWORD="s3cretpass" cargo build --features esp32
//! ```

use super::wifi::{ConfigError, MAX_PASSWORD_LEN, MAX_SSID_LEN};
use std::time::Duration;

/// Access-point SSID used when `AP_SSID` is not set at compile time.
/// Also used as the device hostname.
pub const DEFAULT_AP_SSID: &str = "TrainController";

/// Access-point passphrase used when `AP_PASSWORD` is not set at compile time.
pub const DEFAULT_AP_PASSWORD: &str = "12345678";

/// Per-attempt association timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Interval between connection status polls during an attempt.
pub const POLL_INTERVAL_MS: u64 = 100;

/// Interval between reconnection attempts while in access-point mode.
pub const AP_RETRY_INTERVAL_SECS: u64 = 30;

/// HTTP API port on the device.
#[cfg(feature = "esp32")]
pub const DEFAULT_LISTEN_PORT: u16 = 80;

/// HTTP API port on host builds (no root needed).
#[cfg(not(feature = "esp32"))]
pub const DEFAULT_LISTEN_PORT: u16 = 8080;

/// Minimum WPA2 passphrase length for the self-hosted network.
const MIN_AP_PASSWORD_LEN: usize = 8;

/// Connectivity settings shared by the manager, ticker and API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// SSID of the self-hosted network; also the device hostname.
    pub ap_ssid: String,
    /// Passphrase of the self-hosted network.
    pub ap_password: String,
    /// Upper bound for a single association attempt.
    pub connect_timeout: Duration,
    /// Status poll interval inside an association attempt.
    pub poll_interval: Duration,
    /// How often the ticker calls `retry_tick`.
    pub retry_interval: Duration,
    /// HTTP API port.
    pub listen_port: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            ap_ssid: option_env!("AP_SSID").unwrap_or(DEFAULT_AP_SSID).to_string(),
            ap_password: option_env!("AP_PASSWORD")
                .unwrap_or(DEFAULT_AP_PASSWORD)
                .to_string(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            retry_interval: Duration::from_secs(AP_RETRY_INTERVAL_SECS),
            listen_port: DEFAULT_LISTEN_PORT,
        }
    }
}

impl DeviceConfig {
    /// Validate configuration parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the AP SSID is empty or longer than 32 bytes
    /// - the AP passphrase is not 8-64 bytes
    /// - `connect_timeout` or `poll_interval` is zero
    /// - `poll_interval` exceeds `connect_timeout`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ap_ssid.is_empty() {
            return Err(ConfigError::SsidEmpty);
        }
        if self.ap_ssid.len() > MAX_SSID_LEN {
            return Err(ConfigError::SsidTooLong {
                len: self.ap_ssid.len(),
                max: MAX_SSID_LEN,
            });
        }
        let pass_len = self.ap_password.len();
        if !(MIN_AP_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&pass_len) {
            return Err(ConfigError::ApPasswordInvalid { len: pass_len });
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidTiming(
                "connect_timeout must be greater than 0",
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidTiming(
                "poll_interval must be greater than 0",
            ));
        }
        if self.poll_interval > self.connect_timeout {
            return Err(ConfigError::InvalidTiming(
                "poll_interval must not exceed connect_timeout",
            ));
        }
        Ok(())
    }

    /// Retry interval in milliseconds, as reported in the connection state.
    pub fn retry_interval_ms(&self) -> u64 {
        self.retry_interval.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DeviceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_timing() {
        let config = DeviceConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.retry_interval_ms(), 30_000);
    }

    #[test]
    fn test_short_ap_password_rejected() {
        let config = DeviceConfig {
            ap_password: "short".into(),
            ..DeviceConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ApPasswordInvalid { len: 5 })
        );
    }

    #[test]
    fn test_empty_ap_ssid_rejected() {
        let config = DeviceConfig {
            ap_ssid: String::new(),
            ..DeviceConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::SsidEmpty));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = DeviceConfig {
            connect_timeout: Duration::ZERO,
            ..DeviceConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTiming(_))
        ));
    }

    #[test]
    fn test_poll_longer_than_timeout_rejected() {
        let config = DeviceConfig {
            connect_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(100),
            ..DeviceConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTiming(_))
        ));
    }
}
