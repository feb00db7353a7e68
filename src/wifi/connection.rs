//! ESP-IDF WiFi driver wrapper.
//!
//! Uses the non-blocking `EspWifi` driver: the connection manager polls
//! [`WifiRadio::is_connected`] with its own timeout. Station and access point
//! can run together (mixed mode), which keeps the self-hosted network up
//! while a retry attempt is in flight.

use super::radio::{RadioError, WifiRadio};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
};
use log::{info, warn};
use std::net::IpAddr;

/// Channel used by the self-hosted network.
const AP_CHANNEL: u8 = 1;

/// Maximum simultaneous clients on the self-hosted network.
const AP_MAX_CONNECTIONS: u16 = 4;

/// ESP32 radio.
pub struct EspRadio<'a> {
    wifi: EspWifi<'a>,
    client: Option<ClientConfiguration>,
    access_point: Option<AccessPointConfiguration>,
}

impl<'a> EspRadio<'a> {
    /// Create the WiFi driver. The radio is started on first use.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, RadioError> {
        let wifi = EspWifi::new(modem, sysloop, nvs)?;
        Ok(Self {
            wifi,
            client: None,
            access_point: None,
        })
    }

    /// Push the combined station/AP configuration to the driver.
    fn apply(&mut self) -> Result<(), RadioError> {
        let config = match (&self.client, &self.access_point) {
            (Some(client), Some(ap)) => Configuration::Mixed(client.clone(), ap.clone()),
            (Some(client), None) => Configuration::Client(client.clone()),
            (None, Some(ap)) => Configuration::AccessPoint(ap.clone()),
            (None, None) => Configuration::None,
        };
        self.wifi.set_configuration(&config)?;
        if !self.wifi.is_started()? {
            self.wifi.start()?;
        }
        Ok(())
    }
}

impl WifiRadio for EspRadio<'_> {
    fn set_hostname(&mut self, hostname: &str) -> Result<(), RadioError> {
        self.wifi.sta_netif_mut().set_hostname(hostname)?;
        Ok(())
    }

    fn begin_connect(&mut self, ssid: &str, password: &str) -> Result<(), RadioError> {
        info!("Connecting to WiFi: {}", ssid);

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        self.client = Some(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| RadioError::InvalidSsid)?,
            password: password
                .try_into()
                .map_err(|_| RadioError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        self.apply()?;

        // Returns once the request is queued; association completes in the
        // background and is observed through is_connected().
        self.wifi.connect()?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.sta_netif().is_up().unwrap_or(false)
    }

    fn disconnect(&mut self) -> Result<(), RadioError> {
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi disconnect failed: {:?}", e);
        }
        self.client = None;
        self.apply()
    }

    fn ip_addr(&self) -> Option<IpAddr> {
        if !self.is_connected() {
            return None;
        }
        let info = self.wifi.sta_netif().get_ip_info().ok()?;
        format!("{}", info.ip).parse().ok()
    }

    fn start_access_point(&mut self, ssid: &str, password: &str) -> Result<(), RadioError> {
        self.access_point = Some(AccessPointConfiguration {
            ssid: ssid.try_into().map_err(|_| RadioError::InvalidSsid)?,
            password: password
                .try_into()
                .map_err(|_| RadioError::InvalidPassword)?,
            auth_method: AuthMethod::WPA2Personal,
            channel: AP_CHANNEL,
            max_connections: AP_MAX_CONNECTIONS,
            ..Default::default()
        });
        self.apply()?;
        info!("Access point {} started", ssid);
        Ok(())
    }

    fn stop_access_point(&mut self) -> Result<(), RadioError> {
        if self.access_point.take().is_some() {
            self.apply()?;
            info!("Access point stopped");
        }
        Ok(())
    }
}
