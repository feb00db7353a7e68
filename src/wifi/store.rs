//! Ordered set of known networks.
//!
//! The store keeps the in-memory list and writes it to durable storage after
//! every mutation. Invariants held after any sequence of calls:
//!
//! - at most one entry per SSID
//! - at most one entry flagged as default
//! - entries keep insertion order; replacing an SSID keeps its position

use super::storage::{CredentialStorage, StoreError};
use crate::config::NetworkCredential;

/// In-memory credential list backed by a [`CredentialStorage`].
pub struct NetworkStore {
    networks: Vec<NetworkCredential>,
    storage: Box<dyn CredentialStorage>,
}

impl NetworkStore {
    /// Create an empty store. Call [`load`](Self::load) to read storage.
    pub fn new(storage: Box<dyn CredentialStorage>) -> Self {
        Self {
            networks: Vec::new(),
            storage,
        }
    }

    /// Replace the in-memory list with the stored one.
    ///
    /// On error the in-memory list is left empty; the caller decides how to
    /// report it.
    pub fn load(&mut self) -> Result<usize, StoreError> {
        self.networks.clear();
        self.networks = self.storage.load()?;
        Ok(self.networks.len())
    }

    /// Write the in-memory list to storage.
    pub fn save(&mut self) -> Result<(), StoreError> {
        self.storage.save(&self.networks)
    }

    /// Insert or replace a credential, then persist.
    ///
    /// A credential flagged as default clears the flag on every other entry.
    /// The in-memory change is kept even if persisting fails.
    pub fn upsert(&mut self, credential: NetworkCredential) -> Result<(), StoreError> {
        if credential.is_default {
            for network in &mut self.networks {
                network.is_default = false;
            }
        }

        match self
            .networks
            .iter_mut()
            .find(|n| n.ssid == credential.ssid)
        {
            Some(existing) => *existing = credential,
            None => self.networks.push(credential),
        }

        self.save()
    }

    /// Remove the entry with `ssid`, persisting if anything was removed.
    ///
    /// Returns `Ok(false)` without touching storage when the SSID is unknown.
    pub fn remove(&mut self, ssid: &str) -> Result<bool, StoreError> {
        let Some(index) = self.networks.iter().position(|n| n.ssid == ssid) else {
            return Ok(false);
        };
        // Dropping the credential zeroes its password.
        self.networks.remove(index);
        self.save()?;
        Ok(true)
    }

    /// The default-flagged entry, else the first entry, else `None`.
    pub fn find_default_or_first(&self) -> Option<&NetworkCredential> {
        self.default_network().or_else(|| self.networks.first())
    }

    /// The default-flagged entry, if any.
    pub fn default_network(&self) -> Option<&NetworkCredential> {
        self.networks.iter().find(|n| n.is_default)
    }

    /// Look up an entry by SSID.
    pub fn get(&self, ssid: &str) -> Option<&NetworkCredential> {
        self.networks.iter().find(|n| n.ssid == ssid)
    }

    /// All entries in store order.
    pub fn list(&self) -> &[NetworkCredential] {
        &self.networks
    }

    /// Number of stored networks.
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    /// Whether no networks are stored.
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{cred, MemoryStorage};

    fn store() -> (NetworkStore, MemoryStorage) {
        let storage = MemoryStorage::default();
        (NetworkStore::new(Box::new(storage.clone())), storage)
    }

    fn ssids(store: &NetworkStore) -> Vec<&str> {
        store.list().iter().map(|n| n.ssid.as_str()).collect()
    }

    #[test]
    fn test_upsert_appends_in_order() {
        let (mut store, _) = store();
        store.upsert(cred("a", false)).unwrap();
        store.upsert(cred("b", false)).unwrap();
        store.upsert(cred("c", false)).unwrap();
        assert_eq!(ssids(&store), ["a", "b", "c"]);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let (mut store, _) = store();
        store.upsert(cred("a", false)).unwrap();
        store.upsert(cred("b", false)).unwrap();
        store.upsert(cred("c", false)).unwrap();

        let mut updated = cred("b", false);
        updated.password = "changed".into();
        store.upsert(updated).unwrap();

        assert_eq!(ssids(&store), ["a", "b", "c"]);
        assert_eq!(store.get("b").unwrap().password, "changed");
    }

    #[test]
    fn test_new_default_clears_others() {
        let (mut store, storage) = store();
        store.upsert(cred("home", true)).unwrap();
        store.upsert(cred("office", false)).unwrap();
        store.upsert(cred("guest", true)).unwrap();

        let defaults: Vec<_> = store.list().iter().filter(|n| n.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].ssid, "guest");

        let persisted = storage.contents();
        assert_eq!(persisted.iter().filter(|n| n.is_default).count(), 1);
        assert!(persisted.iter().any(|n| n.ssid == "guest" && n.is_default));
    }

    #[test]
    fn test_invariants_hold_over_upsert_sequence() {
        let (mut store, _) = store();
        let sequence = [
            ("a", true),
            ("b", false),
            ("a", false),
            ("c", true),
            ("b", true),
            ("c", false),
            ("d", false),
            ("b", true),
        ];
        for (ssid, is_default) in sequence {
            store.upsert(cred(ssid, is_default)).unwrap();

            let mut seen = ssids(&store);
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), store.len());
            assert!(store.list().iter().filter(|n| n.is_default).count() <= 1);
        }
        assert_eq!(ssids(&store), ["a", "b", "c", "d"]);
        assert_eq!(store.default_network().unwrap().ssid, "b");
    }

    #[test]
    fn test_clearing_default_flag_on_same_ssid() {
        let (mut store, _) = store();
        store.upsert(cred("a", true)).unwrap();
        store.upsert(cred("a", false)).unwrap();
        assert!(store.default_network().is_none());
    }

    #[test]
    fn test_remove() {
        let (mut store, storage) = store();
        store.upsert(cred("a", false)).unwrap();
        store.upsert(cred("b", false)).unwrap();

        assert!(store.remove("a").unwrap());
        assert_eq!(ssids(&store), ["b"]);
        assert_eq!(storage.contents().len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (mut store, storage) = store();
        store.upsert(cred("a", false)).unwrap();
        let saves = storage.save_count();

        assert!(!store.remove("zzz").unwrap());
        assert_eq!(storage.save_count(), saves);
    }

    #[test]
    fn test_find_default_or_first() {
        let (mut store, _) = store();
        assert!(store.find_default_or_first().is_none());

        store.upsert(cred("first", false)).unwrap();
        store.upsert(cred("second", false)).unwrap();
        assert_eq!(store.find_default_or_first().unwrap().ssid, "first");

        store.upsert(cred("second", true)).unwrap();
        assert_eq!(store.find_default_or_first().unwrap().ssid, "second");
    }

    #[test]
    fn test_save_failure_keeps_change() {
        let (mut store, storage) = store();
        storage.fail_saves(true);

        assert!(matches!(
            store.upsert(cred("a", false)),
            Err(StoreError::Io(_))
        ));
        assert_eq!(ssids(&store), ["a"]);

        storage.fail_saves(false);
        store.save().unwrap();
        assert_eq!(storage.contents().len(), 1);
    }

    #[test]
    fn test_load_replaces_memory() {
        let (mut store, storage) = store();
        storage.set_contents(vec![cred("x", false), cred("y", true)]);
        assert_eq!(store.load().unwrap(), 2);
        assert_eq!(ssids(&store), ["x", "y"]);
    }

    #[test]
    fn test_load_error_leaves_empty() {
        let (mut store, storage) = store();
        store.upsert(cred("a", false)).unwrap();
        storage.corrupt();
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
        assert!(store.is_empty());
    }
}
