//! Durable storage for known network credentials.
//!
//! Credentials persist as a compact JSON array in insertion order:
//!
//! ```json
//! [{"ssid":"home","password":"secret","isDefault":true}]
//! ```
//!
//! On host builds the array lives in `~/.pin-controller-esp32/networks.json`.
//! On ESP32 it is a single NVS blob (see `NvsStorage`).

use crate::config::NetworkCredential;
use log::{debug, info, warn};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Passive durable storage collaborator.
///
/// Read once at startup, written after every store mutation.
pub trait CredentialStorage: Send {
    /// Read all stored credentials.
    ///
    /// A missing file or key is not an error: it yields an empty list.
    fn load(&self) -> Result<Vec<NetworkCredential>, StoreError>;

    /// Replace the stored credentials.
    ///
    /// A failed or interrupted write must leave the previous content readable.
    fn save(&mut self, credentials: &[NetworkCredential]) -> Result<(), StoreError>;
}

/// Errors from durable storage.
#[derive(Debug)]
pub enum StoreError {
    /// Stored data could not be parsed.
    Corrupt(String),
    /// Storage could not be read or written.
    Io(io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupt(msg) => write!(f, "stored networks are corrupt: {}", msg),
            Self::Io(e) => write!(f, "storage I/O failure: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Corrupt(_) => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Serialize credentials to the persisted byte format.
pub fn encode(credentials: &[NetworkCredential]) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(credentials).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Parse the persisted byte format.
///
/// Empty input is treated as an empty list. Entries that parse but fail
/// validation (e.g. an oversized SSID) are dropped with a warning; only
/// unparseable content is [`StoreError::Corrupt`].
pub fn decode(bytes: &[u8]) -> Result<Vec<NetworkCredential>, StoreError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let mut credentials: Vec<NetworkCredential> =
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    credentials.retain(|credential| match credential.validate() {
        Ok(()) => true,
        Err(e) => {
            warn!("Skipping stored network {:?}: {}", credential.ssid, e);
            false
        }
    });
    Ok(credentials)
}

/// Get the default credentials file path.
///
/// Returns `~/.pin-controller-esp32/networks.json`
pub fn default_store_path() -> io::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "HOME not set"))?;
    Ok(PathBuf::from(home)
        .join(".pin-controller-esp32")
        .join("networks.json"))
}

/// File-backed credential storage.
///
/// Writes go to a sibling temp file which is synced and then renamed over the
/// target, so a torn write never replaces readable content.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at a specific path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at [`default_store_path`].
    pub fn at_default_path() -> io::Result<Self> {
        Ok(Self::new(default_store_path()?))
    }

    /// Path of the credentials file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CredentialStorage for FileStorage {
    fn load(&self) -> Result<Vec<NetworkCredential>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No networks file found at {:?}", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let credentials = decode(&bytes)?;
        info!(
            "Loaded {} network(s) from {:?}",
            credentials.len(),
            self.path
        );
        Ok(credentials)
    }

    fn save(&mut self, credentials: &[NetworkCredential]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let bytes = encode(credentials)?;
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        debug!(
            "Saved {} network(s) to {:?}",
            credentials.len(),
            self.path
        );
        Ok(())
    }
}
