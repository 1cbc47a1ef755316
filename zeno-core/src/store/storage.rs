//! Durable key-value storage backends.
//!
//! Stores persist through the [`Storage`] trait, a synchronous string-to-string
//! map in the manner of a browser's local storage. Reads and writes block the
//! calling thread, which keeps the "persist once immediately" guarantee of a
//! store's sync effect intact.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, StoreError};

/// Synchronous durable key-value storage.
pub trait Storage: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing what was there.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-process storage. Clones share their contents, so a clone handed to a
/// second registry sees everything the first one wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Storage backed by a directory, one file per key.
///
/// Keys are escaped into file names, so any string is a valid key. Writes go
/// to a temporary file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|err| StoreError::storage(&dir.display().to_string(), err))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", escape_key(key)))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::storage(key, err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|err| {
            let _ = fs::remove_file(&tmp);
            StoreError::storage(key, err)
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::storage(key, err)),
        }
    }
}

/// Map a key to a file-name-safe string. ASCII alphanumerics, `-` and `_`
/// pass through; every other byte becomes `%XX`.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "zeno-storage-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));

        storage.remove("k").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn memory_storage_clones_share_contents() {
        let first = MemoryStorage::new();
        let second = first.clone();

        first.set("zeno-store-a", "{}").unwrap();
        assert_eq!(second.get("zeno-store-a").unwrap().as_deref(), Some("{}"));
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = scratch_dir("roundtrip");
        let storage = FileStorage::open(&dir).unwrap();
        assert_eq!(storage.get("zeno-store-videos").unwrap(), None);

        storage.set("zeno-store-videos", r#"{"currentStep":2}"#).unwrap();

        let reopened = FileStorage::open(&dir).unwrap();
        assert_eq!(
            reopened.get("zeno-store-videos").unwrap().as_deref(),
            Some(r#"{"currentStep":2}"#)
        );

        reopened.remove("zeno-store-videos").unwrap();
        reopened.remove("zeno-store-videos").unwrap();
        assert_eq!(storage.get("zeno-store-videos").unwrap(), None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let dir = scratch_dir("failed-write");
        let storage = FileStorage::open(&dir).unwrap();

        // A directory where the value file belongs makes the rename fail.
        let blocked = dir.join("zeno-store-auth.json");
        fs::create_dir_all(&blocked).unwrap();
        fs::write(blocked.join("keep"), "x").unwrap();

        let err = storage.set("zeno-store-auth", "{}").unwrap_err();
        assert!(matches!(err, StoreError::Storage { .. }));
        assert!(!dir.join("zeno-store-auth.json.tmp").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn keys_are_escaped_into_file_names() {
        assert_eq!(escape_key("zeno-store-videos"), "zeno-store-videos");
        assert_eq!(escape_key("a/b c"), "a%2Fb%20c");
        assert_eq!(escape_key("../x"), "%2E%2E%2Fx");
    }
}
