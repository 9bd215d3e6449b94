//! Where credentials live between restarts, keyed by entry id.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::types::Credential;

pub const CREDENTIALS_FILENAME: &str = "credentials.json";

pub trait CredentialStore: Send + Sync {
    fn get(&self, entry_id: &str) -> Result<Option<Credential>>;
    fn set(&self, entry_id: &str, credential: &Credential) -> Result<()>;
    /// Returns whether an entry was removed.
    fn delete(&self, entry_id: &str) -> Result<bool>;
    fn entries(&self) -> Result<Vec<(String, Credential)>>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredEntries {
    #[serde(default)]
    entries: BTreeMap<String, Credential>,
}

/// Persists every entry in one JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // serialises read-modify-write of the file
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(CREDENTIALS_FILENAME),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<StoredEntries> {
        if !self.path.exists() {
            info!("No credentials file found at {:?}", self.path);
            return Ok(StoredEntries::default());
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Written to a sibling temp file (owner-only on unix) and renamed over
    /// the old one, so a crash mid-write leaves the previous file intact.
    fn save(&self, stored: &StoredEntries) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(stored)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for JsonFileStore {
    fn get(&self, entry_id: &str) -> Result<Option<Credential>> {
        let _guard = self.locked();
        Ok(self.load()?.entries.remove(entry_id))
    }

    fn set(&self, entry_id: &str, credential: &Credential) -> Result<()> {
        let _guard = self.locked();
        let mut stored = self.load()?;
        stored.entries.insert(entry_id.to_string(), credential.clone());
        self.save(&stored)
    }

    fn delete(&self, entry_id: &str) -> Result<bool> {
        let _guard = self.locked();
        let mut stored = self.load()?;
        if stored.entries.remove(entry_id).is_none() {
            return Ok(false);
        }
        self.save(&stored)?;
        Ok(true)
    }

    fn entries(&self) -> Result<Vec<(String, Credential)>> {
        let _guard = self.locked();
        Ok(self.load()?.entries.into_iter().collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Credential>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Credential>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, entry_id: &str) -> Result<Option<Credential>> {
        Ok(self.map().get(entry_id).cloned())
    }

    fn set(&self, entry_id: &str, credential: &Credential) -> Result<()> {
        self.map().insert(entry_id.to_string(), credential.clone());
        Ok(())
    }

    fn delete(&self, entry_id: &str) -> Result<bool> {
        Ok(self.map().remove(entry_id).is_some())
    }

    fn entries(&self) -> Result<Vec<(String, Credential)>> {
        Ok(self
            .map()
            .iter()
            .map(|(id, credential)| (id.clone(), credential.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let credential = Credential::new("s3cret", "dev1");

        JsonFileStore::new(dir.path()).set("entry-a", &credential).unwrap();

        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.get("entry-a").unwrap(), Some(credential));
        assert_eq!(reopened.get("entry-b").unwrap(), None);
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.entries().unwrap().is_empty());
        assert!(!store.delete("nothing").unwrap());
    }

    #[test]
    fn file_store_delete_only_removes_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.set("a", &Credential::new("s1", "d1")).unwrap();
        store.set("b", &Credential::new("s2", "d2")).unwrap();

        assert!(store.delete("a").unwrap());

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "b");
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CREDENTIALS_FILENAME), "{not json").unwrap();

        let err = JsonFileStore::new(dir.path()).get("a").unwrap_err();
        assert_eq!(err.kind(), "storage_error");
    }

    #[test]
    fn file_store_rewrite_leaves_only_the_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.set("a", &Credential::new("s1", "d1")).unwrap();
        store.set("b", &Credential::new("s2", "d2")).unwrap();
        store.delete("a").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(CREDENTIALS_FILENAME)]);
        assert_eq!(store.entries().unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        JsonFileStore::new(dir.path())
            .set("a", &Credential::new("s", "d"))
            .unwrap();

        let mode = fs::metadata(dir.path().join(CREDENTIALS_FILENAME))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        store.set("a", &Credential::new("s", "d")).unwrap();
        assert!(store.get("a").unwrap().is_some());
        assert!(store.delete("a").unwrap());
        assert!(store.get("a").unwrap().is_none());
    }
}
