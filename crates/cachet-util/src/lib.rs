//! Shared plumbing for the cachet asset pipeline.
//!
//! Filesystem helpers, content hashing, and the common error type the
//! higher-level crates build on.

#![forbid(unsafe_code)]

pub mod error;
pub mod fs;
pub mod hash;

pub use error::UtilError;
