//! Fingerprint keys, entries, and the typed cache that persists them.
//!
//! A fingerprint records what produced an output artifact: the build time
//! and a deterministic descriptor of the inputs. The bundler compares a
//! loaded fingerprint against the current asset set to decide whether the
//! artifact on disk is still trustworthy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::store::KvStore;

/// Namespace prefix shared by every fingerprint key, so the whole family
/// can be flushed with one prefix delete.
pub const KEY_PREFIX: &str = "assets-";

/// Encoding version stamped into stored entries. Entries carrying any other
/// version read as absent, which forces a rebuild instead of trusting a
/// format this code no longer understands.
const SCHEMA_VERSION: u32 = 1;

/// Cache key for one `(output URL, minify)` combination.
///
/// The minified and unminified builds of the same output are distinct
/// artifacts and must never share a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FingerprintKey(String);

impl FingerprintKey {
    /// Derives the key for `output_url`, suffixed when minification is on.
    #[must_use]
    pub fn derive(output_url: &str, minify: bool) -> Self {
        let suffix = if minify { "-min" } else { "" };
        Self(format!("{KEY_PREFIX}{output_url}{suffix}"))
    }

    /// The raw store key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FingerprintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What produced an output artifact, recorded after each successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintEntry {
    /// Encoding version, see [`SCHEMA_VERSION`].
    pub schema: u32,
    /// Epoch seconds of the last successful build.
    pub built_at: u64,
    /// Descriptor of the inputs at build time, see
    /// [`AssetSet::descriptor`](crate::assets::AssetSet::descriptor).
    pub inputs: String,
}

impl FingerprintEntry {
    /// A current-schema entry for a build finished at `built_at`.
    #[must_use]
    pub fn new(built_at: u64, inputs: impl Into<String>) -> Self {
        Self {
            schema: SCHEMA_VERSION,
            built_at,
            inputs: inputs.into(),
        }
    }
}

/// Typed wrapper over a [`KvStore`] holding fingerprint entries as JSON.
#[derive(Debug)]
pub struct FingerprintCache<S: KvStore> {
    store: S,
}

impl<S: KvStore> FingerprintCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the entry for `key`.
    ///
    /// A missing, undecodable, or wrong-schema entry reads as `None`; a bad
    /// fingerprint must cost a rebuild, never an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backing store itself fails.
    pub fn load(&self, key: &FingerprintKey) -> Result<Option<FingerprintEntry>, EngineError> {
        let Some(raw) = self.store.get(key.as_str())? else {
            return Ok(None);
        };
        let Ok(entry) = serde_json::from_str::<FingerprintEntry>(&raw) else {
            return Ok(None);
        };
        if entry.schema != SCHEMA_VERSION {
            return Ok(None);
        }
        Ok(Some(entry))
    }

    /// Records `entry` under `key` with no expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be encoded or persisted.
    pub fn record(&self, key: &FingerprintKey, entry: &FingerprintEntry) -> Result<(), EngineError> {
        let raw = serde_json::to_string(entry).map_err(|e| EngineError::Entry {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.store.save(key.as_str(), &raw, None)
    }

    /// Deletes every entry in the fingerprint namespace and returns the
    /// number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot delete.
    pub fn flush(&self) -> Result<usize, EngineError> {
        self.store.delete_prefix(KEY_PREFIX)
    }
}
