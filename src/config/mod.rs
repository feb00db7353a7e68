//! Device configuration.
//!
//! # Components
//!
//! - [`wifi`] - Stored network credential type and validation
//! - [`device`] - Access-point identity, timeouts and API port

mod device;
mod wifi;

pub use device::{
    DeviceConfig, AP_RETRY_INTERVAL_SECS, CONNECT_TIMEOUT_SECS, DEFAULT_AP_PASSWORD,
    DEFAULT_AP_SSID, DEFAULT_LISTEN_PORT, POLL_INTERVAL_MS,
};
pub use wifi::{ConfigError, NetworkCredential, MAX_PASSWORD_LEN, MAX_SSID_LEN};
