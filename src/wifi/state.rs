//! Connection state shared with the status indicator and API handlers.

use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use std::time::Instant;

/// Connectivity mode of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Not associated and not hosting a network. Initial mode.
    Disconnected,
    /// An association attempt is in progress.
    Connecting,
    /// Associated with a known network.
    Connected,
    /// Hosting the self-hosted access point.
    AccessPoint,
}

impl ConnectionMode {
    /// Lowercase name used in API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::AccessPoint => "access_point",
        }
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current connectivity state. Mutated only by the connection manager.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    mode: ConnectionMode,
    current_ssid: Option<String>,
    ip: Option<IpAddr>,
    last_attempt: Option<Instant>,
    retry_interval_ms: u64,
}

impl ConnectionState {
    /// Create a state in [`ConnectionMode::Disconnected`].
    pub fn new(retry_interval_ms: u64) -> Self {
        Self {
            mode: ConnectionMode::Disconnected,
            current_ssid: None,
            ip: None,
            last_attempt: None,
            retry_interval_ms,
        }
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    /// SSID of the network being joined or joined.
    pub fn current_ssid(&self) -> Option<&str> {
        self.current_ssid.as_deref()
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    /// When the last association attempt started.
    pub fn last_attempt(&self) -> Option<Instant> {
        self.last_attempt
    }

    pub fn retry_interval_ms(&self) -> u64 {
        self.retry_interval_ms
    }

    pub(crate) fn begin_attempt(&mut self, ssid: &str) {
        self.mode = ConnectionMode::Connecting;
        self.current_ssid = Some(ssid.to_string());
        self.ip = None;
        self.last_attempt = Some(Instant::now());
    }

    pub(crate) fn set_connected(&mut self, ssid: &str, ip: IpAddr) {
        self.mode = ConnectionMode::Connected;
        self.current_ssid = Some(ssid.to_string());
        self.ip = Some(ip);
    }

    pub(crate) fn set_access_point(&mut self) {
        self.mode = ConnectionMode::AccessPoint;
        self.current_ssid = None;
        self.ip = None;
    }

    pub(crate) fn set_disconnected(&mut self) {
        self.mode = ConnectionMode::Disconnected;
        self.current_ssid = None;
        self.ip = None;
    }

    /// Serializable snapshot for status reporting.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            mode: self.mode,
            ssid: self.current_ssid.clone(),
            ip: self.ip.map(|ip| ip.to_string()),
            retry_interval_ms: self.retry_interval_ms,
        }
    }
}

/// Point-in-time view of [`ConnectionState`], served by `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub mode: ConnectionMode,
    pub ssid: Option<String>,
    pub ip: Option<String>,
    pub retry_interval_ms: u64,
}
