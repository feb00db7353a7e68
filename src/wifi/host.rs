//! Host radio.
//!
//! On host systems the OS handles networking. This radio accepts every
//! association request immediately and reports the machine's local address,
//! so the manager, API and ticker can be exercised without hardware.

use super::radio::{RadioError, WifiRadio};
use log::info;
use std::net::{IpAddr, Ipv4Addr};

/// Host stand-in for the WiFi driver.
#[derive(Debug, Default)]
pub struct HostRadio {
    associated: Option<String>,
    access_point: Option<String>,
    ip_addr: Option<IpAddr>,
}

impl HostRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// SSID of the simulated access point, if running.
    pub fn access_point(&self) -> Option<&str> {
        self.access_point.as_deref()
    }

    /// Get the primary local IP address.
    ///
    /// Creates a UDP socket and "connects" it to a public IP (nothing is
    /// sent), then reads which local address the OS picked.
    fn detect_local_ip() -> Option<IpAddr> {
        use std::net::UdpSocket;

        let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect("8.8.8.8:80").ok()?;
        let local_addr = socket.local_addr().ok()?;
        Some(local_addr.ip())
    }
}

impl WifiRadio for HostRadio {
    fn set_hostname(&mut self, hostname: &str) -> Result<(), RadioError> {
        info!("Host radio: hostname {} (not applied on host)", hostname);
        Ok(())
    }

    fn begin_connect(&mut self, ssid: &str, _password: &str) -> Result<(), RadioError> {
        if ssid.is_empty() {
            return Err(RadioError::InvalidSsid);
        }
        self.ip_addr =
            Some(Self::detect_local_ip().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        self.associated = Some(ssid.to_string());
        info!("Host radio: associated with {}", ssid);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.associated.is_some()
    }

    fn disconnect(&mut self) -> Result<(), RadioError> {
        self.associated = None;
        self.ip_addr = None;
        Ok(())
    }

    fn ip_addr(&self) -> Option<IpAddr> {
        self.associated.as_ref().and(self.ip_addr)
    }

    fn start_access_point(&mut self, ssid: &str, _password: &str) -> Result<(), RadioError> {
        info!("Host radio: access point {} up", ssid);
        self.access_point = Some(ssid.to_string());
        Ok(())
    }

    fn stop_access_point(&mut self) -> Result<(), RadioError> {
        if let Some(ssid) = self.access_point.take() {
            info!("Host radio: access point {} down", ssid);
        }
        Ok(())
    }
}
