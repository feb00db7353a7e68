//! NVS persistence for known networks.
//!
//! Stores the credential list in ESP32's Non-Volatile Storage so it survives
//! reboots. NVS commits a single key atomically, so the JSON array is written
//! as one blob and read back to catch silent flash failures.

use super::storage::{decode, encode, CredentialStorage, StoreError};
use crate::config::NetworkCredential;
use esp_idf_svc::nvs::{EspNvs, EspNvsPartition, NvsDefault};
use esp_idf_sys::EspError;
use log::{error, info};
use std::io;

/// NVS namespace for WiFi configuration.
const NVS_NAMESPACE: &str = "wifi_config";

/// NVS key for the stored network list.
const NVS_KEY: &str = "networks";

/// Upper bound for the serialized list.
/// Roughly 16 networks with maximum-length SSID and password.
const MAX_BLOB_SIZE: usize = 2048;

/// NVS-backed credential storage.
pub struct NvsStorage {
    nvs: EspNvs<NvsDefault>,
}

impl NvsStorage {
    /// Open the WiFi namespace on the default NVS partition.
    pub fn new(partition: EspNvsPartition<NvsDefault>) -> Result<Self, EspError> {
        let nvs = EspNvs::new(partition, NVS_NAMESPACE, true)?;
        Ok(Self { nvs })
    }
}

fn esp_to_store(e: EspError) -> StoreError {
    StoreError::Io(io::Error::new(
        io::ErrorKind::Other,
        format!("ESP error: {:?}", e),
    ))
}

impl CredentialStorage for NvsStorage {
    fn load(&self) -> Result<Vec<NetworkCredential>, StoreError> {
        let mut buf = vec![0u8; MAX_BLOB_SIZE];
        match self.nvs.get_raw(NVS_KEY, &mut buf).map_err(esp_to_store)? {
            Some(bytes) => decode(bytes),
            None => {
                log::debug!("No networks found in NVS");
                Ok(Vec::new())
            }
        }
    }

    fn save(&mut self, credentials: &[NetworkCredential]) -> Result<(), StoreError> {
        let bytes = encode(credentials)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "network list too large: {} bytes (max {})",
                    bytes.len(),
                    MAX_BLOB_SIZE
                ),
            )));
        }

        self.nvs.set_raw(NVS_KEY, &bytes).map_err(esp_to_store)?;

        let mut verify_buf = vec![0u8; MAX_BLOB_SIZE];
        let read_back = self
            .nvs
            .get_raw(NVS_KEY, &mut verify_buf)
            .map_err(esp_to_store)?;
        if read_back != Some(bytes.as_slice()) {
            error!("Network list verification failed - data mismatch after save");
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "NVS read-back mismatch",
            )));
        }

        info!("Saved {} network(s) to NVS", credentials.len());
        Ok(())
    }
}
