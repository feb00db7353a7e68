//! Self-hosted access point used when no known network is reachable.

use super::radio::WifiRadio;
use super::state::ConnectionState;
use crate::log_buffer::LogSink;
use crate::status::{StatusIndicator, BLINK_ACCESS_POINT_MS};

/// Starts and stops the device's own network.
#[derive(Debug)]
pub struct AccessPointController {
    ssid: String,
    password: String,
    active: bool,
}

impl AccessPointController {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Bring up the access point and enter [`AccessPoint`] mode.
    ///
    /// Idempotent: if already running the radio is left alone, but the state
    /// and indicator are still reasserted. A radio failure is logged and the
    /// device stays in access-point mode so retries keep running.
    ///
    /// [`AccessPoint`]: super::ConnectionMode::AccessPoint
    pub fn start<R: WifiRadio + ?Sized>(
        &mut self,
        radio: &mut R,
        state: &mut ConnectionState,
        indicator: &dyn StatusIndicator,
        log: &dyn LogSink,
    ) {
        if !self.active {
            match radio.start_access_point(&self.ssid, &self.password) {
                Ok(()) => {
                    self.active = true;
                    log.append(&format!("Started AP mode: {}", self.ssid));
                }
                Err(e) => log.append(&format!("Failed to start AP mode: {}", e)),
            }
        }
        state.set_access_point();
        indicator.set_blink_interval(BLINK_ACCESS_POINT_MS);
    }

    /// Tear down the access point. No-op when not running.
    pub fn stop<R: WifiRadio + ?Sized>(&mut self, radio: &mut R, log: &dyn LogSink) {
        if !self.active {
            return;
        }
        match radio.stop_access_point() {
            Ok(()) => log.append("Stopped AP mode"),
            Err(e) => log.append(&format!("Failed to stop AP mode: {}", e)),
        }
        self.active = false;
    }
}
