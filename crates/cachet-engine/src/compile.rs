//! Merging an asset set into one output artifact, minified or not.

use std::io::ErrorKind;
use std::path::Path;

use cachet_minify::MinifierSet;
use cachet_util::fs::write_atomic;
use cachet_util::hash::sha256_short;

use crate::assets::AssetSet;
use crate::error::EngineError;

/// An excluded file's placeholder and the verbatim content that replaces it.
struct Substitution {
    marker: String,
    content: String,
    url: String,
}

/// Merges an asset set's files into a single output file.
pub struct Compiler<'a> {
    minifiers: &'a MinifierSet,
}

impl<'a> Compiler<'a> {
    pub fn new(minifiers: &'a MinifierSet) -> Self {
        Self { minifiers }
    }

    /// Compiles `assets` into `output_path`.
    ///
    /// Without `minify`, file contents are concatenated in registration
    /// order, each followed by a newline; a source missing on disk leaves a
    /// `file not found` comment in the artifact instead of failing the
    /// merge. With `minify`, every source must be readable, files marked
    /// no-minify travel through the minifier as placeholder comments, and a
    /// post-pass swaps each placeholder back for the verbatim source.
    ///
    /// # Errors
    ///
    /// Returns an error if the set is empty, no minifier is registered for
    /// its kind, a source required for a minified build cannot be read, a
    /// source contains an active placeholder, or the artifact cannot be
    /// written.
    pub fn compile(
        &self,
        assets: &AssetSet,
        output_path: &Path,
        minify: bool,
    ) -> Result<(), EngineError> {
        if assets.is_empty() {
            return Err(EngineError::EmptyAssetSet {
                output: output_path.display().to_string(),
            });
        }
        if minify {
            self.compile_minified(assets, output_path)
        } else {
            merge_raw(assets, output_path)
        }
    }

    fn compile_minified(&self, assets: &AssetSet, output_path: &Path) -> Result<(), EngineError> {
        let Some(kind) = assets.kind() else {
            return Err(EngineError::EmptyAssetSet {
                output: output_path.display().to_string(),
            });
        };
        let Some(minifier) = self.minifiers.get(kind) else {
            return Err(EngineError::UnsupportedKind {
                kind: kind.to_owned(),
            });
        };

        // Excluded files are read up front so a missing one fails the build
        // before anything is written.
        let mut substitutions: Vec<Substitution> = Vec::new();
        for entry in assets.entries() {
            if assets.is_no_minify(&entry.url) {
                substitutions.push(Substitution {
                    marker: placeholder_for(&entry.url),
                    content: read_source(&entry.path)?,
                    url: entry.url.clone(),
                });
            }
        }
        for sub in &substitutions {
            ensure_no_collision(&sub.content, &sub.url, &substitutions)?;
        }

        // Phase 1: stitch the minifier input, standing excluded files in as
        // placeholder comments that ride through minification untouched.
        let mut combined = String::new();
        for entry in assets.entries() {
            if assets.is_no_minify(&entry.url) {
                combined.push_str(&placeholder_for(&entry.url));
            } else {
                let content = read_source(&entry.path)?;
                ensure_no_collision(&content, &entry.url, &substitutions)?;
                combined.push_str(&content);
            }
            combined.push('\n');
        }

        let minified = minifier.minify(&combined)?;
        write_atomic(output_path, minified.as_bytes())?;

        // Phase 2: re-read the artifact and swap each placeholder for the
        // verbatim source it stands for.
        if !substitutions.is_empty() {
            let mut merged = read_source(output_path)?;
            for sub in &substitutions {
                merged = merged.replace(&sub.marker, &sub.content);
            }
            write_atomic(output_path, merged.as_bytes())?;
        }
        Ok(())
    }
}

fn merge_raw(assets: &AssetSet, output_path: &Path) -> Result<(), EngineError> {
    let mut merged = String::new();
    for entry in assets.entries() {
        match std::fs::read_to_string(&entry.path) {
            Ok(content) => merged.push_str(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                merged.push_str(&missing_marker(&entry.path));
            }
            Err(source) => {
                return Err(EngineError::Io {
                    path: entry.path.display().to_string(),
                    source,
                });
            }
        }
        merged.push('\n');
    }
    write_atomic(output_path, merged.as_bytes())?;
    Ok(())
}

fn read_source(path: &Path) -> Result<String, EngineError> {
    std::fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn ensure_no_collision(
    content: &str,
    url: &str,
    substitutions: &[Substitution],
) -> Result<(), EngineError> {
    for sub in substitutions {
        if content.contains(&sub.marker) {
            return Err(EngineError::PlaceholderCollision {
                url: url.to_owned(),
                reserved_for: sub.url.clone(),
            });
        }
    }
    Ok(())
}

/// Placeholder comment standing in for an excluded file. Bang comments
/// survive both built-in minifiers, and the token ties the comment back to
/// one specific source URL.
fn placeholder_for(url: &str) -> String {
    format!("/*! cachet:keep:{} */", sha256_short(url.as_bytes()))
}

/// Marker left in a raw merge where a listed source does not exist.
fn missing_marker(path: &Path) -> String {
    format!("/* file not found: {} */", path.display())
}
