//! Pin-controller ESP32 firmware library: WiFi connectivity.
//!
//! This library contains the connectivity manager and its network API. Apart
//! from the ESP-IDF radio and NVS storage (behind the `esp32` feature),
//! everything is platform-independent and tested on the host machine.

pub mod config;
pub mod log_buffer;
pub mod network;
pub mod status;
#[cfg(test)]
mod testutil;
pub mod wifi;

// Re-export commonly used items
pub use config::{ConfigError, DeviceConfig, NetworkCredential};
pub use log_buffer::{LogBuffer, LogSink};
pub use network::ApiServer;
pub use status::{SharedBlinkInterval, StatusIndicator, StatusLed};
pub use wifi::{
    ConnectError, ConnectionManager, ConnectionMode, CredentialStorage, FileStorage, RetryTicker,
    SharedManager, StoreError, WifiRadio,
};
