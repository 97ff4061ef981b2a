//! Durable key-value storage for fingerprint entries.
//!
//! The engine only needs three operations from its backing store, so hosts
//! can plug in whatever they already run (a database table, a cache daemon)
//! by implementing [`KvStore`]. Two implementations ship with the crate:
//! [`FileKvStore`] for plain-filesystem hosts and [`MemoryKvStore`] for
//! tests and ephemeral setups.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use cachet_util::fs::{now_epoch, write_atomic};
use cachet_util::hash::sha256_short;

use crate::error::EngineError;

/// Minimal contract the engine requires from a key-value store.
pub trait KvStore {
    /// Looks up the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error only for store-level failures; a missing, corrupt,
    /// or expired entry reads as `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>, EngineError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// `ttl` of `None` means the entry never expires.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted.
    fn save(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), EngineError>;

    /// Deletes every entry whose key starts with `prefix` and returns the
    /// number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated or an entry
    /// cannot be removed.
    fn delete_prefix(&self, prefix: &str) -> Result<usize, EngineError>;
}

/// On-disk envelope for one stored entry.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    /// The full key, kept inside the file because file names truncate it.
    key: String,
    value: String,
    /// Epoch seconds after which the entry reads as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<u64>,
}

impl Envelope {
    fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// File-backed store keeping one JSON envelope per key.
///
/// Reads are fail-safe: a missing, unreadable, corrupt, or expired envelope
/// reads as absent rather than erroring, so a damaged store costs a rebuild
/// instead of taking the host down.
#[derive(Debug)]
pub struct FileKvStore {
    root: PathBuf,
}

impl FileKvStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// the first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File holding the envelope for `key`.
    ///
    /// The name keeps a sanitized slice of the key for debuggability and a
    /// short digest for uniqueness, so keys that sanitize identically still
    /// land in distinct files.
    fn entry_path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .take(80)
            .collect();
        let digest = sha256_short(key.as_bytes());
        self.root.join(format!("{safe}-{digest}.json"))
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        let path = self.entry_path(key);
        let Ok(raw) = std::fs::read_to_string(&path) else {
            return Ok(None);
        };
        let Ok(envelope) = serde_json::from_str::<Envelope>(&raw) else {
            return Ok(None);
        };
        if envelope.key != key || envelope.is_expired(now_epoch()) {
            return Ok(None);
        }
        Ok(Some(envelope.value))
    }

    fn save(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), EngineError> {
        let envelope = Envelope {
            key: key.to_owned(),
            value: value.to_owned(),
            expires_at: ttl.map(|ttl| now_epoch().saturating_add(ttl.as_secs())),
        };
        let raw = serde_json::to_string_pretty(&envelope).map_err(|e| EngineError::Entry {
            key: key.to_owned(),
            message: e.to_string(),
        })?;
        write_atomic(&self.entry_path(key), raw.as_bytes())?;
        Ok(())
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize, EngineError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(EngineError::Io {
                    path: self.root.display().to_string(),
                    source,
                });
            }
        };
        let mut removed = 0;
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(raw) = std::fs::read_to_string(&path) else {
                continue;
            };
            // Envelopes we cannot parse are left alone.
            let Ok(envelope) = serde_json::from_str::<Envelope>(&raw) else {
                continue;
            };
            if envelope.key.starts_with(prefix) {
                std::fs::remove_file(&path).map_err(|source| EngineError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Option<u64>,
}

/// In-memory store for tests and hosts that accept losing fingerprints on
/// restart.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryKvStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(
        &self,
        key: &str,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, MemoryEntry>>, EngineError> {
        self.entries.lock().map_err(|_| EngineError::Store {
            key: key.to_owned(),
            message: "store mutex poisoned".to_owned(),
        })
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        let entries = self.locked(key)?;
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };
        if entry.expires_at.is_some_and(|deadline| deadline <= now_epoch()) {
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    fn save(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), EngineError> {
        let entry = MemoryEntry {
            value: value.to_owned(),
            expires_at: ttl.map(|ttl| now_epoch().saturating_add(ttl.as_secs())),
        };
        self.locked(key)?.insert(key.to_owned(), entry);
        Ok(())
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize, EngineError> {
        let mut entries = self.locked(prefix)?;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok(before.saturating_sub(entries.len()))
    }
}
