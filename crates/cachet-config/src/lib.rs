//! Host configuration and path resolution for cachet.

pub mod host;
pub mod roots;

pub use host::{ConfigError, HostConfig, Mode};
pub use roots::{PathError, Roots};
