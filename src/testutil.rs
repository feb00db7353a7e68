//! Shared test doubles for unit tests.

use crate::config::{DeviceConfig, NetworkCredential};
use crate::wifi::{CredentialStorage, RadioError, StoreError, WifiRadio};
use std::collections::HashSet;
use std::env;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

// Counter to ensure unique test files even in parallel execution
static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Unique path in the system temp dir.
pub fn unique_temp_path(tag: &str) -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let pid = std::process::id();
    env::temp_dir().join(format!("pin-controller-test-{}-{}-{}.json", tag, pid, id))
}

/// Credential with password `<ssid>-password`.
pub fn cred(ssid: &str, is_default: bool) -> NetworkCredential {
    NetworkCredential::new(ssid, format!("{}-password", ssid), is_default).unwrap()
}

/// Config with millisecond timeouts so failing attempts return quickly.
pub fn fast_config() -> DeviceConfig {
    DeviceConfig {
        ap_ssid: "TestController".into(),
        ap_password: "testpass".into(),
        connect_timeout: Duration::from_millis(20),
        poll_interval: Duration::from_millis(2),
        retry_interval: Duration::from_millis(50),
        listen_port: 0,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct MemoryInner {
    contents: Vec<NetworkCredential>,
    corrupt: bool,
    fail_saves: bool,
    saves: usize,
}

/// In-memory storage. Clones share contents.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStorage {
    pub fn contents(&self) -> Vec<NetworkCredential> {
        lock(&self.inner).contents.clone()
    }

    pub fn set_contents(&self, contents: Vec<NetworkCredential>) {
        let mut inner = lock(&self.inner);
        inner.contents = contents;
        inner.corrupt = false;
    }

    /// Make the next loads fail with `Corrupt`.
    pub fn corrupt(&self) {
        lock(&self.inner).corrupt = true;
    }

    pub fn fail_saves(&self, fail: bool) {
        lock(&self.inner).fail_saves = fail;
    }

    pub fn save_count(&self) -> usize {
        lock(&self.inner).saves
    }
}

impl CredentialStorage for MemoryStorage {
    fn load(&self) -> Result<Vec<NetworkCredential>, StoreError> {
        let inner = lock(&self.inner);
        if inner.corrupt {
            return Err(StoreError::Corrupt("test corruption".into()));
        }
        Ok(inner.contents.clone())
    }

    fn save(&mut self, credentials: &[NetworkCredential]) -> Result<(), StoreError> {
        let mut inner = lock(&self.inner);
        if inner.fail_saves {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::Other,
                "test write failure",
            )));
        }
        inner.contents = credentials.to_vec();
        inner.corrupt = false;
        inner.saves += 1;
        Ok(())
    }
}

#[derive(Default)]
struct RadioInner {
    reachable: HashSet<String>,
    associated: Option<String>,
    attempts: Vec<String>,
    last_password: Option<String>,
    ap_running: bool,
    ap_starts: usize,
    hostname: Option<String>,
    fail_connect: bool,
}

/// Radio that associates instantly with reachable SSIDs and never with
/// others. Clones share state, so a test keeps a handle after moving one
/// into the manager.
#[derive(Clone, Default)]
pub struct MockRadio {
    inner: Arc<Mutex<RadioInner>>,
}

impl MockRadio {
    pub const IP: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 42));

    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reachable(&self, ssid: &str, reachable: bool) {
        let mut inner = lock(&self.inner);
        if reachable {
            inner.reachable.insert(ssid.to_string());
        } else {
            inner.reachable.remove(ssid);
        }
    }

    /// Simulate the access point dropping the station.
    pub fn drop_link(&self) {
        lock(&self.inner).associated = None;
    }

    pub fn fail_connect(&self, fail: bool) {
        lock(&self.inner).fail_connect = fail;
    }

    /// SSIDs passed to `begin_connect`, in order.
    pub fn attempts(&self) -> Vec<String> {
        lock(&self.inner).attempts.clone()
    }

    pub fn last_password(&self) -> Option<String> {
        lock(&self.inner).last_password.clone()
    }

    pub fn ap_running(&self) -> bool {
        lock(&self.inner).ap_running
    }

    pub fn ap_starts(&self) -> usize {
        lock(&self.inner).ap_starts
    }

    pub fn hostname(&self) -> Option<String> {
        lock(&self.inner).hostname.clone()
    }
}

impl WifiRadio for MockRadio {
    fn set_hostname(&mut self, hostname: &str) -> Result<(), RadioError> {
        lock(&self.inner).hostname = Some(hostname.to_string());
        Ok(())
    }

    fn begin_connect(&mut self, ssid: &str, password: &str) -> Result<(), RadioError> {
        let mut inner = lock(&self.inner);
        if inner.fail_connect {
            return Err(RadioError::Driver("test driver failure".into()));
        }
        inner.attempts.push(ssid.to_string());
        inner.last_password = Some(password.to_string());
        inner.associated = if inner.reachable.contains(ssid) {
            Some(ssid.to_string())
        } else {
            None
        };
        Ok(())
    }

    fn is_connected(&self) -> bool {
        lock(&self.inner).associated.is_some()
    }

    fn disconnect(&mut self) -> Result<(), RadioError> {
        lock(&self.inner).associated = None;
        Ok(())
    }

    fn ip_addr(&self) -> Option<IpAddr> {
        self.is_connected().then_some(Self::IP)
    }

    fn start_access_point(&mut self, _ssid: &str, _password: &str) -> Result<(), RadioError> {
        let mut inner = lock(&self.inner);
        inner.ap_running = true;
        inner.ap_starts += 1;
        Ok(())
    }

    fn stop_access_point(&mut self) -> Result<(), RadioError> {
        lock(&self.inner).ap_running = false;
        Ok(())
    }
}
