//! Asset registration, staleness detection, and the bundle compiler for cachet.

pub mod assets;
pub mod build;
pub mod compile;
pub mod error;
pub mod fingerprint;
pub mod store;

pub use assets::{AssetEntry, AssetSet, DirScanOptions};
pub use build::{Bundler, SaveOutcome, SaveResult};
pub use compile::Compiler;
pub use error::EngineError;
pub use fingerprint::{FingerprintCache, FingerprintEntry, FingerprintKey};
pub use store::{FileKvStore, KvStore, MemoryKvStore};
