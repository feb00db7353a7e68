//! Connection manager state machine.
//!
//! ```text
//!                 initialize (store empty)
//!  Disconnected ─────────────────────────────────────────► AccessPoint
//!       │                                                    ▲   │
//!       │ initialize (default or first)                fail  │   │ retry_tick
//!       ▼                                                    │   ▼
//!   Connecting ──────────────────────────────────────────────┘ Connecting
//!       │ success                                                │ success
//!       ▼                                                        ▼
//!   Connected ◄──────────────────────────────────────────────────┘
//!       │ link lost (check_link)
//!       └──────────────────────────────────────────────────► AccessPoint
//! ```
//!
//! `request_connect` may be called from any mode. Every attempt is bounded by
//! `DeviceConfig::connect_timeout` and resolves to `Connected` or
//! `AccessPoint`; the manager never rests in `Connecting`.
//!
//! One manager exists per process. It is shared between the API server and
//! the retry ticker as a [`SharedManager`]; each trigger holds the lock for
//! one transition.

use super::access_point::AccessPointController;
use super::radio::{RadioError, WifiRadio};
use super::state::{ConnectionMode, ConnectionState, StatusSnapshot};
use super::storage::{CredentialStorage, StoreError};
use super::store::NetworkStore;
use crate::config::{ConfigError, DeviceConfig, NetworkCredential};
use crate::log_buffer::LogSink;
use crate::status::{StatusIndicator, BLINK_IDLE_MS, BLINK_SOLID_MS};
use log::debug;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

/// Manager shared between request handlers and the ticker.
pub type SharedManager<R> = Arc<Mutex<ConnectionManager<R>>>;

/// Result of a successful association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connected {
    pub ssid: String,
    pub ip: IpAddr,
}

/// Errors from [`ConnectionManager::request_connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// A required request field is absent.
    MissingField(&'static str),
    /// SSID is not stored and no password was supplied.
    MissingCredential(String),
    /// Supplied SSID or password fails validation.
    InvalidCredential(ConfigError),
    /// No association within the connect timeout. AP mode was restarted.
    AssociationTimeout { ssid: String },
    /// The radio rejected the request. AP mode was restarted.
    Radio(RadioError),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing field: {}", field),
            Self::MissingCredential(ssid) => {
                write!(f, "missing password for unknown SSID: {}", ssid)
            }
            Self::InvalidCredential(e) => write!(f, "invalid credential: {}", e),
            Self::AssociationTimeout { ssid } => {
                write!(f, "timed out connecting to {}", ssid)
            }
            Self::Radio(e) => write!(f, "radio error: {}", e),
        }
    }
}

impl std::error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidCredential(e) => Some(e),
            Self::Radio(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RadioError> for ConnectError {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

impl From<ConfigError> for ConnectError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidCredential(e)
    }
}

/// Owns the network store, connection state and access point.
pub struct ConnectionManager<R: WifiRadio> {
    config: DeviceConfig,
    radio: R,
    store: NetworkStore,
    state: ConnectionState,
    access_point: AccessPointController,
    indicator: Box<dyn StatusIndicator>,
    log: Box<dyn LogSink>,
}

impl<R: WifiRadio> ConnectionManager<R> {
    /// Create a manager in `Disconnected` mode. Storage is not read until
    /// [`initialize`](Self::initialize).
    pub fn new(
        config: DeviceConfig,
        radio: R,
        storage: Box<dyn CredentialStorage>,
        indicator: Box<dyn StatusIndicator>,
        log: Box<dyn LogSink>,
    ) -> Self {
        indicator.set_blink_interval(BLINK_IDLE_MS);
        let access_point = AccessPointController::new(&config.ap_ssid, &config.ap_password);
        let state = ConnectionState::new(config.retry_interval_ms());
        Self {
            config,
            radio,
            store: NetworkStore::new(storage),
            state,
            access_point,
            indicator,
            log,
        }
    }

    /// Wrap in a [`SharedManager`].
    pub fn into_shared(self) -> SharedManager<R> {
        Arc::new(Mutex::new(self))
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn mode(&self) -> ConnectionMode {
        self.state.mode()
    }

    pub fn status(&self) -> StatusSnapshot {
        self.state.snapshot()
    }

    /// Known networks in store order.
    pub fn networks(&self) -> &[NetworkCredential] {
        self.store.list()
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Load stored networks and join the default (or first) one.
    ///
    /// Falls back to access-point mode when nothing is stored, storage is
    /// unreadable, or the attempt times out.
    pub fn initialize(&mut self) -> ConnectionMode {
        if let Err(e) = self.store.load() {
            self.log
                .append(&format!("Failed to load networks, assuming none: {}", e));
        }

        if let Err(e) = self.radio.set_hostname(&self.config.ap_ssid) {
            self.log.append(&format!("Failed to set hostname: {}", e));
        }

        let Some(credential) = self.store.find_default_or_first().cloned() else {
            self.log.append("No saved networks, starting AP mode");
            self.fall_back_to_access_point();
            return self.mode();
        };

        match self.attempt(&credential.ssid, &credential.password) {
            Ok(connected) => self.on_connected(connected),
            Err(e) => {
                self.log
                    .append(&format!("Failed to connect ({}), starting AP mode", e));
                self.fall_back_to_access_point();
            }
        }
        self.mode()
    }

    /// One reconnection pass. No-op unless in access-point mode.
    ///
    /// When a default network is stored only that network is tried;
    /// otherwise every stored network is tried in order until one succeeds.
    ///
    /// Runs the whole pass in one call. [`RetryTicker`](super::RetryTicker)
    /// drives [`retry_candidates`](Self::retry_candidates) and
    /// [`retry_attempt`](Self::retry_attempt) instead, so the manager is
    /// locked for one attempt at a time.
    pub fn retry_tick(&mut self) -> ConnectionMode {
        for credential in self.retry_candidates() {
            if self.retry_attempt(&credential) != ConnectionMode::AccessPoint {
                break;
            }
        }
        self.mode()
    }

    /// Networks the next reconnection pass should try, in order.
    ///
    /// Empty unless in access-point mode. Only the default network when one
    /// is flagged, otherwise every stored network.
    pub fn retry_candidates(&self) -> Vec<NetworkCredential> {
        if self.mode() != ConnectionMode::AccessPoint {
            debug!("Retry skipped in mode {}", self.mode());
            return Vec::new();
        }
        match self.store.default_network() {
            Some(default) => vec![default.clone()],
            None => self.store.list().to_vec(),
        }
    }

    /// Try one reconnection candidate while the access point stays up.
    ///
    /// Skipped when the mode has left `AccessPoint` or the network was
    /// deleted since the candidates were taken. Returns the resulting mode;
    /// `Connected` ends the pass.
    pub fn retry_attempt(&mut self, credential: &NetworkCredential) -> ConnectionMode {
        if self.mode() != ConnectionMode::AccessPoint {
            return self.mode();
        }
        if self.store.get(&credential.ssid).is_none() {
            debug!("Retry skipped, {} no longer stored", credential.ssid);
            return self.mode();
        }

        match self.attempt(&credential.ssid, &credential.password) {
            Ok(connected) => {
                self.access_point.stop(&mut self.radio, self.log.as_ref());
                self.on_connected(connected);
            }
            Err(e) => {
                self.log.append(&format!("Retry failed: {}", e));
                self.fall_back_to_access_point();
            }
        }
        self.mode()
    }

    /// Join `ssid`, using the stored password unless `password` is given.
    ///
    /// An explicit password is used for this attempt only and is not stored.
    /// Validation errors leave the state untouched; association failures
    /// restart the access point.
    pub fn request_connect(
        &mut self,
        ssid: Option<&str>,
        password: Option<&str>,
    ) -> Result<Connected, ConnectError> {
        let ssid = match ssid {
            Some(ssid) if !ssid.is_empty() => ssid,
            _ => return Err(ConnectError::MissingField("ssid")),
        };

        let password = match (password, self.store.get(ssid)) {
            (Some(password), _) => password.to_string(),
            (None, Some(stored)) => stored.password.clone(),
            (None, None) => return Err(ConnectError::MissingCredential(ssid.to_string())),
        };
        let credential = NetworkCredential::new(ssid, password, false)?;

        self.access_point.stop(&mut self.radio, self.log.as_ref());

        match self.attempt(&credential.ssid, &credential.password) {
            Ok(connected) => {
                self.on_connected(connected.clone());
                Ok(connected)
            }
            Err(e) => {
                self.log.append(&format!(
                    "Failed to connect to {} ({}), AP mode restarted",
                    ssid, e
                ));
                self.fall_back_to_access_point();
                Err(e)
            }
        }
    }

    /// Detect link loss while connected and fall back to access-point mode.
    pub fn check_link(&mut self) -> ConnectionMode {
        if self.mode() == ConnectionMode::Connected && !self.radio.is_connected() {
            let ssid = self.state.current_ssid().unwrap_or_default().to_string();
            self.log.append(&format!("WiFi link to {} lost", ssid));
            self.state.set_disconnected();
            self.indicator.set_blink_interval(BLINK_IDLE_MS);
            self.fall_back_to_access_point();
        }
        self.mode()
    }

    /// Insert or replace a stored network. Persisted before returning.
    ///
    /// On a storage error the in-memory change is kept.
    pub fn add_or_update_network(
        &mut self,
        credential: NetworkCredential,
    ) -> Result<(), StoreError> {
        let ssid = credential.ssid.clone();
        let is_default = credential.is_default;
        let result = self.store.upsert(credential);
        match &result {
            Ok(()) if is_default => self
                .log
                .append(&format!("Network {} saved as default", ssid)),
            Ok(()) => self.log.append(&format!("Network {} saved", ssid)),
            Err(e) => self
                .log
                .append(&format!("Failed to persist network {}: {}", ssid, e)),
        }
        result
    }

    /// Remove a stored network. Returns whether it existed.
    pub fn delete_network(&mut self, ssid: &str) -> Result<bool, StoreError> {
        let result = self.store.remove(ssid);
        match &result {
            Ok(true) => self.log.append(&format!("Network {} deleted", ssid)),
            Ok(false) => {}
            Err(e) => self.log.append(&format!(
                "Network {} deleted but not persisted: {}",
                ssid, e
            )),
        }
        result
    }

    /// Accept a credential from the configuration portal.
    ///
    /// Known SSIDs keep their default flag; new ones are not default.
    pub fn submit_portal_credential(
        &mut self,
        mut credential: NetworkCredential,
    ) -> Result<(), StoreError> {
        credential.is_default = self
            .store
            .get(&credential.ssid)
            .map(|existing| existing.is_default)
            .unwrap_or(false);
        self.log.append(&format!(
            "New network {} added through portal",
            credential.ssid
        ));
        self.add_or_update_network(credential)
    }

    /// Issue a connect request and poll until connected or timed out.
    ///
    /// Leaves the mode in `Connecting`; callers resolve it. While the access
    /// point is up the indicator keeps its access-point blink.
    fn attempt(&mut self, ssid: &str, password: &str) -> Result<Connected, ConnectError> {
        self.state.begin_attempt(ssid);
        if !self.access_point.is_active() {
            self.indicator.set_blink_interval(BLINK_IDLE_MS);
        }
        self.log
            .append(&format!("Attempting to connect to WiFi: {}", ssid));

        self.radio.begin_connect(ssid, password)?;

        let started = Instant::now();
        loop {
            if self.radio.is_connected() {
                let ip = self
                    .radio
                    .ip_addr()
                    .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
                return Ok(Connected {
                    ssid: ssid.to_string(),
                    ip,
                });
            }
            if started.elapsed() >= self.config.connect_timeout {
                if let Err(e) = self.radio.disconnect() {
                    self.log
                        .append(&format!("Failed to abandon association: {}", e));
                }
                return Err(ConnectError::AssociationTimeout {
                    ssid: ssid.to_string(),
                });
            }
            thread::sleep(self.config.poll_interval);
        }
    }

    fn on_connected(&mut self, connected: Connected) {
        self.state.set_connected(&connected.ssid, connected.ip);
        self.indicator.set_blink_interval(BLINK_SOLID_MS);
        self.log.append(&format!(
            "Connected to WiFi {}: {}",
            connected.ssid, connected.ip
        ));
    }

    fn fall_back_to_access_point(&mut self) {
        self.access_point.start(
            &mut self.radio,
            &mut self.state,
            self.indicator.as_ref(),
            self.log.as_ref(),
        );
    }
}
