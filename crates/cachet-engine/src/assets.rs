//! Ordered registration of the source files that make up one bundle.

use std::collections::BTreeSet;
use std::path::PathBuf;

use cachet_config::HostConfig;
use cachet_minify::SUPPORTED_EXTENSIONS;
use cachet_util::fs::list_files;

use crate::error::EngineError;

/// One registered source file: its canonical path on disk and the public
/// URL it is served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub path: PathBuf,
    pub url: String,
}

/// Options for [`AssetSet::add_all`] directory scans.
#[derive(Debug, Clone, Default)]
pub struct DirScanOptions {
    /// Extension to match, without the dot. `None` scans for the supported
    /// defaults (`js`, `css`).
    pub extension: Option<String>,
    /// Include files whose names start with `.`.
    pub include_hidden: bool,
    /// Include files whose names start with `_`.
    pub include_underscore: bool,
    /// Exclude every scanned file from minification.
    pub prevent_minify: bool,
}

/// The ordered, duplicate-free set of source files for one output artifact.
///
/// Registration order is meaningful: the merged output concatenates files
/// in exactly this order, and the [descriptor](AssetSet::descriptor) that
/// fingerprints a build encodes it. Outside development mode every add is a
/// complete no-op, so production requests never pay for path resolution or
/// directory scans.
#[derive(Debug, Clone, Default)]
pub struct AssetSet {
    entries: Vec<AssetEntry>,
    kind: Option<String>,
    no_minify: BTreeSet<String>,
}

impl AssetSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one file.
    ///
    /// `input` is resolved through the configured roots; re-adding a file
    /// keeps its original position. With `prevent_minify` the file's URL is
    /// recorded so minified builds carry its content verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if `input` cannot be resolved. Outside development
    /// mode the call never errors.
    pub fn add(
        &mut self,
        config: &HostConfig,
        input: &str,
        prevent_minify: bool,
    ) -> Result<&mut Self, EngineError> {
        if !config.mode.is_development() {
            return Ok(self);
        }
        let path = config.roots.to_path(input)?;
        let url = config.roots.path_to_url(&path)?;

        if self.kind.is_none() {
            self.kind = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);
        }
        if prevent_minify {
            self.no_minify.insert(url.clone());
        }
        if !self.entries.iter().any(|e| e.path == path) {
            self.entries.push(AssetEntry { path, url });
        }
        Ok(self)
    }

    /// Registers every matching file directly inside `dir_input`, sorted by
    /// name. Not recursive.
    ///
    /// Files starting with `.` or `_` are skipped unless the corresponding
    /// option is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be resolved or listed.
    /// Outside development mode the call never errors.
    pub fn add_all(
        &mut self,
        config: &HostConfig,
        dir_input: &str,
        options: &DirScanOptions,
    ) -> Result<&mut Self, EngineError> {
        if !config.mode.is_development() {
            return Ok(self);
        }
        let dir = config.roots.to_path(dir_input)?;
        let extensions: Vec<&str> = match options.extension.as_deref() {
            Some(ext) => vec![ext],
            None => SUPPORTED_EXTENSIONS.to_vec(),
        };

        for file in list_files(&dir, &extensions)? {
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if name.starts_with('.') && !options.include_hidden {
                continue;
            }
            if name.starts_with('_') && !options.include_underscore {
                continue;
            }
            self.add(config, &file.display().to_string(), options.prevent_minify)?;
        }
        Ok(self)
    }

    /// The registered files in order, as URLs or as filesystem paths.
    #[must_use]
    pub fn files_array(&self, as_urls: bool) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| {
                if as_urls {
                    e.url.clone()
                } else {
                    e.path.display().to_string()
                }
            })
            .collect()
    }

    /// Deterministic descriptor of membership, order, and minify exclusions.
    ///
    /// Two sets produce the same descriptor exactly when they would produce
    /// the same build, so this string is what fingerprints record.
    #[must_use]
    pub fn descriptor(&self) -> String {
        let urls = self.files_array(true).join(",");
        let excluded: Vec<&str> = self.no_minify.iter().map(String::as_str).collect();
        format!("{urls};no-minify:{}", excluded.join(","))
    }

    /// Lowercase extension of the first file added, if any had one.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Whether `url` was registered with minification prevented.
    #[must_use]
    pub fn is_no_minify(&self, url: &str) -> bool {
        self.no_minify.contains(url)
    }

    #[must_use]
    pub fn entries(&self) -> &[AssetEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
