//! WiFi connectivity management.
//!
//! # Components
//!
//! - [`store`] - Ordered set of known networks, persisted on every change
//! - [`storage`] - Durable storage backends (file on host, NVS on ESP32)
//! - [`state`] - Current connection mode, SSID and address
//! - [`access_point`] - Self-hosted fallback network
//! - [`manager`] - Association state machine tying the above together
//! - [`ticker`] - Background thread driving periodic reconnection
//! - [`radio`] - Driver abstraction; `EspRadio` on ESP32, [`HostRadio`] on host

mod access_point;
#[cfg(feature = "esp32")]
mod connection;
mod host;
mod manager;
#[cfg(feature = "esp32")]
mod nvs;
mod radio;
mod state;
mod storage;
mod store;
mod ticker;

pub use access_point::AccessPointController;
#[cfg(feature = "esp32")]
pub use connection::EspRadio;
pub use host::HostRadio;
pub use manager::{ConnectError, Connected, ConnectionManager, SharedManager};
#[cfg(feature = "esp32")]
pub use nvs::NvsStorage;
pub use radio::{RadioError, WifiRadio};
pub use state::{ConnectionMode, ConnectionState, StatusSnapshot};
pub use storage::{decode, default_store_path, encode, CredentialStorage, FileStorage, StoreError};
pub use store::NetworkStore;
pub use ticker::RetryTicker;
