//! Stored WiFi credential type.
//!
//! Platform-independent, so it can be tested on the host machine.
//!
//! # Example
//!
//! ```
//! use pin_controller_esp32::config::NetworkCredential;
//!
//! let home = NetworkCredential::new("home", "hunter22", true).unwrap();
//! assert!(home.validate().is_ok());
//! assert!(home.is_default);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum password length for WPA2.
pub const MAX_PASSWORD_LEN: usize = 64;

/// A known network: SSID, password and the default-network flag.
///
/// The serialized field names match the persisted JSON format
/// (`{"ssid": .., "password": .., "isDefault": ..}`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCredential {
    /// Network SSID, unique key within the store.
    pub ssid: String,
    /// Network password (empty for open networks).
    #[serde(default)]
    pub password: String,
    /// Preferred network when several are known.
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
}

impl NetworkCredential {
    /// Create a validated credential.
    pub fn new(
        ssid: impl Into<String>,
        password: impl Into<String>,
        is_default: bool,
    ) -> Result<Self, ConfigError> {
        let credential = Self {
            ssid: ssid.into(),
            password: password.into(),
            is_default,
        };
        credential.validate()?;
        Ok(credential)
    }

    /// Validate SSID and password lengths.
    ///
    /// Short passwords are accepted: the radio rejects them during association
    /// and the device falls back to access-point mode.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::SsidEmpty);
        }
        if self.ssid.len() > MAX_SSID_LEN {
            return Err(ConfigError::SsidTooLong {
                len: self.ssid.len(),
                max: MAX_SSID_LEN,
            });
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooLong {
                len: self.password.len(),
                max: MAX_PASSWORD_LEN,
            });
        }
        Ok(())
    }
}

impl Drop for NetworkCredential {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

// Passwords never show up in logs.
impl fmt::Debug for NetworkCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCredential")
            .field("ssid", &self.ssid)
            .field("password", &"****")
            .field("is_default", &self.is_default)
            .finish()
    }
}

/// Errors that can occur while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Password exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
    /// Access-point passphrase is not a valid WPA2 passphrase.
    ApPasswordInvalid { len: usize },
    /// A timing parameter is zero or inconsistent.
    InvalidTiming(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
            Self::ApPasswordInvalid { len } => {
                write!(f, "AP passphrase must be 8-64 bytes, got {}", len)
            }
            Self::InvalidTiming(msg) => write!(f, "invalid timing: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
