//! Mapping between user-supplied asset paths, canonical filesystem paths,
//! and public URLs.
//!
//! Callers hand the bundler paths in whatever form their templates use:
//! already-absolute paths under the host root, or paths relative to one of a
//! small set of anchor directories (`"app/main.css"`, `"/app/main.css"`).
//! `Roots` turns all of them into one canonical form so that duplicate
//! detection and fingerprinting see the same file as the same file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The root anchors a host exposes to the asset pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roots {
    /// Canonical absolute root of the host installation on disk.
    pub fs_root: PathBuf,
    /// Public URL prefix that `fs_root` is served under (`""` for the domain
    /// root, `"/myapp"` for a subdirectory install).
    pub url_root: String,
    /// First-level directory names recognized as anchors for relative input.
    #[serde(default = "default_anchors")]
    pub anchors: Vec<String>,
}

fn default_anchors() -> Vec<String> {
    vec!["app".to_owned(), "framework".to_owned()]
}

impl Roots {
    /// Create a resolver with the default anchor set (`app`, `framework`).
    pub fn new(fs_root: impl Into<PathBuf>, url_root: impl Into<String>) -> Self {
        Self {
            fs_root: fs_root.into(),
            url_root: url_root.into(),
            anchors: default_anchors(),
        }
    }

    /// Resolve `input` to a canonical absolute path.
    ///
    /// Accepts paths already under `fs_root`, or paths starting with
    /// `<anchor>/` or `/<anchor>/`. Backslash separators are normalized and
    /// any trailing separator is stripped from the result.
    ///
    /// # Errors
    /// Returns [`PathError::Unresolvable`] if the input is neither under
    /// `fs_root` nor anchored.
    pub fn to_path(&self, input: &str) -> Result<PathBuf, PathError> {
        Ok(PathBuf::from(self.resolve(input)?))
    }

    /// Resolve `input` like [`Roots::to_path`], then map the `fs_root` prefix
    /// to the `url_root` prefix.
    ///
    /// # Errors
    /// Returns [`PathError::Unresolvable`] if the input cannot be resolved.
    pub fn to_url(&self, input: &str) -> Result<String, PathError> {
        let canonical = self.resolve(input)?;
        let root = self.fs_root_str();
        let url_prefix = self.url_root.strip_suffix('/').unwrap_or(&self.url_root);
        let relative = canonical.strip_prefix(&root).unwrap_or(canonical.as_str());
        if relative.is_empty() {
            // The root directory itself.
            Ok(format!("{url_prefix}/"))
        } else {
            Ok(format!("{url_prefix}{relative}"))
        }
    }

    /// Map an already-canonical path back to its public URL.
    ///
    /// # Errors
    /// Returns [`PathError::Unresolvable`] if `path` is not under `fs_root`.
    pub fn path_to_url(&self, path: &Path) -> Result<String, PathError> {
        self.to_url(&path.display().to_string())
    }

    fn resolve(&self, input: &str) -> Result<String, PathError> {
        let normalized = input.replace('\\', "/");
        // A trailing separator is appended for matching so a bare directory
        // name compares against anchor prefixes; it is stripped again before
        // returning.
        let probe = if normalized.ends_with('/') {
            normalized.clone()
        } else {
            format!("{normalized}/")
        };

        let root = self.fs_root_str();
        let root_prefix = format!("{root}/");
        if probe.starts_with(&root_prefix) {
            return Ok(strip_trailing(&normalized).to_owned());
        }

        for anchor in &self.anchors {
            let slashed = format!("/{anchor}/");
            if probe.starts_with(&slashed) {
                let relative = probe.get(1..).unwrap_or(&probe);
                return Ok(format!("{root}/{}", strip_trailing(relative)));
            }
            let bare = format!("{anchor}/");
            if probe.starts_with(&bare) {
                return Ok(format!("{root}/{}", strip_trailing(&probe)));
            }
        }

        Err(PathError::Unresolvable {
            input: input.to_owned(),
            root,
        })
    }

    fn fs_root_str(&self) -> String {
        let s = self.fs_root.display().to_string().replace('\\', "/");
        strip_trailing(&s).to_owned()
    }
}

fn strip_trailing(s: &str) -> &str {
    s.strip_suffix('/').unwrap_or(s)
}

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("cannot resolve {input}: not under {root} and no anchor matches")]
    Unresolvable { input: String, root: String },
}
