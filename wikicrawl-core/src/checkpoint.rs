// Checkpoint persistence: digest naming, file and in-memory stores

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("checkpoint I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("checkpoint (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no checkpoint stored at {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Named blob storage for engine checkpoints.
pub trait CheckpointStore: Send + Sync {
    /// Replace the blob at `key`. Readers see either the old or the new blob.
    fn save(&self, key: &str, blob: &[u8]) -> Result<()>;

    fn load(&self, key: &str) -> Result<Vec<u8>>;

    fn exists(&self, key: &str) -> bool;
}

pub fn save_json<T: Serialize + ?Sized>(store: &dyn CheckpointStore, key: &str, value: &T) -> Result<()> {
    let blob = serde_json::to_vec(value)?;
    store.save(key, &blob)
}

pub fn load_json<T: DeserializeOwned>(store: &dyn CheckpointStore, key: &str) -> Result<T> {
    let blob = store.load(key)?;
    Ok(serde_json::from_slice(&blob)?)
}

/// Fixed-length artifact name for an arbitrary identifier (hex SHA-256).
pub fn derive_key(identifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The page name part of a wiki URL: everything after the first `/wiki/`.
pub fn strip_page_prefix(url: &str) -> &str {
    match url.find("/wiki/") {
        Some(idx) => &url[idx + "/wiki/".len()..],
        None => url,
    }
}

/// Name of a side artifact stored next to `key`: the suffix goes before the
/// extension, so `Data/full.json` + `dict` is `Data/fulldict.json`.
pub fn companion_key(key: &str, suffix: &str) -> String {
    let path = Path::new(key);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => path
            .with_file_name(format!(
                "{}{}.{}",
                stem.to_string_lossy(),
                suffix,
                ext.to_string_lossy()
            ))
            .to_string_lossy()
            .into_owned(),
        _ => format!("{key}{suffix}"),
    }
}

/// Checkpoints as files under a root directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn io_error(key: &str, source: io::Error) -> CheckpointError {
        CheckpointError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl CheckpointStore for FileStore {
    fn save(&self, key: &str, blob: &[u8]) -> Result<()> {
        let target = self.path_for(key);
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| Self::io_error(key, e))?;

        // Write beside the target so the final rename stays on one filesystem
        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| Self::io_error(key, e))?;
        temp.write_all(blob).map_err(|e| Self::io_error(key, e))?;
        temp.as_file().sync_all().map_err(|e| Self::io_error(key, e))?;
        temp.persist(&target)
            .map_err(|e| Self::io_error(key, e.error))?;

        debug!("Saved checkpoint {} ({} bytes)", target.display(), blob.len());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key);
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CheckpointError::NotFound(path.display().to_string()),
            _ => Self::io_error(key, e),
        })
    }

    fn exists(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }
}

/// In-process store that also remembers the order keys were saved in.
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    history: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key passed to `save`, oldest first.
    pub fn save_history(&self) -> Vec<String> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn save_count(&self, key: &str) -> usize {
        self.save_history().iter().filter(|k| k.as_str() == key).count()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .blobs
            .lock()
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl CheckpointStore for MemoryStore {
    fn save(&self, key: &str, blob: &[u8]) -> Result<()> {
        let mut blobs = self.blobs.lock().map_err(|_| poisoned(key))?;
        blobs.insert(key.to_string(), blob.to_vec());
        drop(blobs);
        self.history
            .lock()
            .map_err(|_| poisoned(key))?
            .push(key.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .map_err(|_| poisoned(key))?
            .get(key)
            .cloned()
            .ok_or_else(|| CheckpointError::NotFound(key.to_string()))
    }

    fn exists(&self, key: &str) -> bool {
        self.blobs
            .lock()
            .map(|b| b.contains_key(key))
            .unwrap_or(false)
    }
}

fn poisoned(key: &str) -> CheckpointError {
    CheckpointError::Io {
        key: key.to_string(),
        source: io::Error::other("memory store lock poisoned"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_is_fixed_length_hex() {
        let short = derive_key("A");
        let long = derive_key(&"Very_long_page_name/with?odd&chars".repeat(20));
        assert_eq!(short.len(), 64);
        assert_eq!(long.len(), 64);
        assert!(short.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(short, derive_key("A"));
        assert_ne!(short, derive_key("B"));
    }

    #[test]
    fn test_strip_page_prefix() {
        assert_eq!(
            strip_page_prefix("https://en.wikipedia.org/wiki/Entscheidungsproblem"),
            "Entscheidungsproblem"
        );
        assert_eq!(strip_page_prefix("A"), "A");
    }

    #[test]
    fn test_companion_key() {
        assert_eq!(companion_key("Data/fullnet1.json", "dict"), "Data/fullnet1dict.json");
        assert_eq!(companion_key("abc-def.json", "KEY"), "abc-defKEY.json");
        assert_eq!(companion_key("graph", "dict"), "graphdict");
    }

    #[test]
    fn test_memory_store_history() {
        let store = MemoryStore::new();
        store.save("a", b"1").unwrap();
        store.save("b", b"2").unwrap();
        store.save("a", b"3").unwrap();

        assert_eq!(store.load("a").unwrap(), b"3");
        assert_eq!(store.save_count("a"), 2);
        assert_eq!(store.save_history(), vec!["a", "b", "a"]);
        assert!(matches!(store.load("zzz"), Err(CheckpointError::NotFound(_))));
    }
}
