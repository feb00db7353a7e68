//! Radio abstraction used by the connection manager.
//!
//! The manager never touches the WiFi driver directly. It issues
//! non-blocking requests through [`WifiRadio`] and polls
//! [`is_connected`](WifiRadio::is_connected) itself, so the association
//! timeout stays under its control.

use std::fmt;
use std::net::IpAddr;

/// Underlying network stack.
///
/// Implemented by `EspRadio` on ESP32 and [`HostRadio`](super::HostRadio)
/// on host builds.
pub trait WifiRadio: Send {
    /// Set the hostname announced by DHCP.
    fn set_hostname(&mut self, hostname: &str) -> Result<(), RadioError>;

    /// Issue an association request. Must not wait for completion.
    ///
    /// If the access point is running it keeps running (mixed mode).
    fn begin_connect(&mut self, ssid: &str, password: &str) -> Result<(), RadioError>;

    /// Whether the station is associated and has an address.
    fn is_connected(&self) -> bool;

    /// Abandon the current or pending association.
    fn disconnect(&mut self) -> Result<(), RadioError>;

    /// Station IP address, if connected.
    fn ip_addr(&self) -> Option<IpAddr>;

    /// Bring up the self-hosted network.
    fn start_access_point(&mut self, ssid: &str, password: &str) -> Result<(), RadioError>;

    /// Tear down the self-hosted network.
    fn stop_access_point(&mut self) -> Result<(), RadioError>;
}

/// Errors reported by the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioError {
    /// SSID is invalid (too long or contains invalid characters).
    InvalidSsid,
    /// Password is invalid.
    InvalidPassword,
    /// Driver-level failure.
    Driver(String),
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "invalid SSID"),
            Self::InvalidPassword => write!(f, "invalid password"),
            Self::Driver(msg) => write!(f, "driver error: {}", msg),
        }
    }
}

impl std::error::Error for RadioError {}

#[cfg(feature = "esp32")]
impl From<esp_idf_sys::EspError> for RadioError {
    fn from(e: esp_idf_sys::EspError) -> Self {
        Self::Driver(format!("ESP error: {:?}", e))
    }
}
