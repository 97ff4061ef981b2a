//! The save entry point: decide staleness, recompile, record fingerprints.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use cachet_config::HostConfig;
use cachet_minify::{AssetKind, MinifierSet};

use crate::assets::AssetSet;
use crate::compile::Compiler;
use crate::error::EngineError;
use crate::fingerprint::{FingerprintCache, FingerprintEntry, FingerprintKey};
use crate::store::KvStore;

/// How a save call concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The guard condition was false; nothing was resolved or written.
    Skipped,
    /// The artifact on disk was still trustworthy.
    Unchanged,
    /// The artifact was recompiled and its fingerprint re-recorded.
    Rebuilt,
}

/// What a save call produced.
#[derive(Debug)]
pub struct SaveResult {
    pub outcome: SaveOutcome,
    /// Canonical path of the output artifact. For [`SaveOutcome::Skipped`]
    /// the requested output is carried through unresolved.
    pub output_path: PathBuf,
    pub duration: Duration,
}

/// Ties together staleness checks, compilation, and fingerprint
/// bookkeeping for one host.
///
/// Saves are not coordinated across processes: two concurrent saves of the
/// same target may both recompile, and the last writer wins.
pub struct Bundler<S: KvStore> {
    config: HostConfig,
    fingerprints: FingerprintCache<S>,
    minifiers: MinifierSet,
}

impl<S: KvStore> Bundler<S> {
    pub fn new(config: HostConfig, store: S, minifiers: MinifierSet) -> Self {
        Self {
            config,
            fingerprints: FingerprintCache::new(store),
            minifiers,
        }
    }

    /// The host configuration this bundler was built with.
    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// The fingerprint cache backing this bundler.
    #[must_use]
    pub fn fingerprints(&self) -> &FingerprintCache<S> {
        &self.fingerprints
    }

    /// Merges `assets` into `output`, recompiling only when stale.
    ///
    /// `output` is resolved through the configured roots like any source
    /// path. A rebuild writes the artifact and records a fresh fingerprint;
    /// a fresh artifact returns [`SaveOutcome::Unchanged`] without touching
    /// disk.
    ///
    /// # Errors
    ///
    /// Returns an error if `output` cannot be resolved, the set is empty
    /// when a rebuild is needed, compilation fails, or the fingerprint
    /// cannot be recorded.
    pub fn save_to(
        &self,
        assets: &AssetSet,
        output: &str,
        minify: bool,
    ) -> Result<SaveResult, EngineError> {
        let start = Instant::now();

        // 1. Resolve the target and derive its fingerprint key.
        let output_path = self.config.roots.to_path(output)?;
        let output_url = self.config.roots.path_to_url(&output_path)?;
        let key = FingerprintKey::derive(&output_url, minify);

        // 2. Fresh artifacts are served as-is.
        if !self.is_stale(assets, &output_path, &key)? {
            return Ok(SaveResult {
                outcome: SaveOutcome::Unchanged,
                output_path,
                duration: start.elapsed(),
            });
        }

        // 3. Recompile.
        if let Some(parent) = output_path.parent() {
            cachet_util::fs::ensure_dir(parent)?;
        }
        if assets.is_empty() {
            return Err(EngineError::EmptyAssetSet { output: output_url });
        }
        Compiler::new(&self.minifiers).compile(assets, &output_path, minify)?;

        // 4. Record what this artifact was built from.
        let entry = FingerprintEntry::new(cachet_util::fs::now_epoch(), assets.descriptor());
        self.fingerprints.record(&key, &entry)?;

        let duration = start.elapsed();
        tracing::info!(
            output = %output_url,
            files = assets.len(),
            minify,
            elapsed = ?duration,
            "rebuilt bundle"
        );
        Ok(SaveResult {
            outcome: SaveOutcome::Rebuilt,
            output_path,
            duration,
        })
    }

    /// [`Bundler::save_to`] guarded by `condition`; when the guard is false
    /// the call is a complete no-op and reports [`SaveOutcome::Skipped`].
    ///
    /// # Errors
    ///
    /// Same as [`Bundler::save_to`]; a false guard never errors.
    pub fn save_if(
        &self,
        condition: bool,
        assets: &AssetSet,
        output: &str,
        minify: bool,
    ) -> Result<SaveResult, EngineError> {
        if !condition {
            return Ok(SaveResult {
                outcome: SaveOutcome::Skipped,
                output_path: PathBuf::from(output),
                duration: Duration::ZERO,
            });
        }
        self.save_to(assets, output, minify)
    }

    /// Whether the next [`Bundler::save_to`] for this target would
    /// recompile.
    ///
    /// # Errors
    ///
    /// Returns an error if `output` cannot be resolved or the fingerprint
    /// store fails.
    pub fn should_rebuild(
        &self,
        assets: &AssetSet,
        output: &str,
        minify: bool,
    ) -> Result<bool, EngineError> {
        let output_path = self.config.roots.to_path(output)?;
        let output_url = self.config.roots.path_to_url(&output_path)?;
        self.is_stale(assets, &output_path, &FingerprintKey::derive(&output_url, minify))
    }

    fn is_stale(
        &self,
        assets: &AssetSet,
        output_path: &Path,
        key: &FingerprintKey,
    ) -> Result<bool, EngineError> {
        // Force wins over everything else.
        if self.config.force_rebuild {
            return Ok(true);
        }
        // Production serves whatever is on disk.
        if !self.config.mode.is_development() {
            return Ok(false);
        }
        if !output_path.exists() {
            return Ok(true);
        }
        let Some(entry) = self.fingerprints.load(key)? else {
            return Ok(true);
        };
        if entry.inputs != assets.descriptor() {
            return Ok(true);
        }
        // Same inputs; rebuild only if something was touched after the
        // recorded build. A file whose mtime cannot be read counts as
        // touched.
        let mut newest = cachet_util::fs::modified_epoch(output_path).unwrap_or(u64::MAX);
        for entry_file in assets.entries() {
            let mtime = cachet_util::fs::modified_epoch(&entry_file.path).unwrap_or(u64::MAX);
            newest = newest.max(mtime);
        }
        Ok(newest > entry.built_at)
    }

    /// Deletes every fingerprint this bundler's namespace holds and returns
    /// the number removed. The next save for each target then re-verifies
    /// against the real inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot delete.
    pub fn invalidate_all(&self) -> Result<usize, EngineError> {
        let removed = self.fingerprints.flush()?;
        tracing::debug!(removed, "flushed fingerprint namespace");
        Ok(removed)
    }

    /// Renders the HTML include tag for a built artifact, with an
    /// `?m=<mtime>` cache-busting parameter when the artifact exists.
    ///
    /// # Errors
    ///
    /// Returns an error if `output` cannot be resolved or its extension is
    /// not a supported asset kind.
    pub fn html_tag(&self, output: &str) -> Result<String, EngineError> {
        let output_path = self.config.roots.to_path(output)?;
        let output_url = self.config.roots.path_to_url(&output_path)?;
        let extension = output_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let Some(kind) = AssetKind::from_extension(extension) else {
            return Err(EngineError::UnsupportedKind {
                kind: extension.to_owned(),
            });
        };
        let href = match cachet_util::fs::modified_epoch(&output_path) {
            Ok(mtime) => format!("{output_url}?m={mtime}"),
            Err(_) => output_url,
        };
        Ok(match kind {
            AssetKind::Js => format!(r#"<script src="{href}"></script>"#),
            AssetKind::Css => format!(r#"<link rel="stylesheet" href="{href}">"#),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use cachet_config::{Mode, Roots};

    use crate::store::MemoryKvStore;

    use super::*;

    const OUTPUT: &str = "app/build/main.css";
    const OUTPUT_URL: &str = "/app/build/main.css";

    fn dev_bundler(tmp: &tempfile::TempDir) -> Bundler<MemoryKvStore> {
        let mut config = HostConfig::new(Roots::new(tmp.path().display().to_string(), ""));
        config.mode = Mode::Development;
        Bundler::new(config, MemoryKvStore::new(), MinifierSet::with_defaults())
    }

    fn write_app_file(tmp: &tempfile::TempDir, name: &str, content: &str) {
        let dir = tmp.path().join("app");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    fn asset_set(bundler: &Bundler<MemoryKvStore>, names: &[&str]) -> AssetSet {
        let mut assets = AssetSet::new();
        for name in names {
            assets
                .add(bundler.config(), &format!("app/{name}"), false)
                .unwrap();
        }
        assets
    }

    #[test]
    fn first_save_builds_then_stays_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "a.css", "a;");
        write_app_file(&tmp, "b.css", "b;");
        let bundler = dev_bundler(&tmp);
        let assets = asset_set(&bundler, &["a.css", "b.css"]);

        let first = bundler.save_to(&assets, OUTPUT, false).unwrap();
        assert_eq!(first.outcome, SaveOutcome::Rebuilt);
        assert_eq!(first.output_path, tmp.path().join("app/build/main.css"));
        let built = fs::read_to_string(&first.output_path).unwrap();
        assert_eq!(built, "a;\nb;\n");

        let second = bundler.save_to(&assets, OUTPUT, false).unwrap();
        assert_eq!(second.outcome, SaveOutcome::Unchanged);
        assert_eq!(fs::read_to_string(&second.output_path).unwrap(), built);
    }

    #[test]
    fn reordered_inputs_trigger_rebuild() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "a.css", "a;");
        write_app_file(&tmp, "b.css", "b;");
        let bundler = dev_bundler(&tmp);

        let forward = asset_set(&bundler, &["a.css", "b.css"]);
        bundler.save_to(&forward, OUTPUT, false).unwrap();

        let reversed = asset_set(&bundler, &["b.css", "a.css"]);
        let result = bundler.save_to(&reversed, OUTPUT, false).unwrap();
        assert_eq!(result.outcome, SaveOutcome::Rebuilt);
        assert_eq!(fs::read_to_string(&result.output_path).unwrap(), "b;\na;\n");
    }

    #[test]
    fn membership_change_triggers_rebuild() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "a.css", "a;");
        write_app_file(&tmp, "b.css", "b;");
        let bundler = dev_bundler(&tmp);

        let both = asset_set(&bundler, &["a.css", "b.css"]);
        bundler.save_to(&both, OUTPUT, false).unwrap();

        let narrowed = asset_set(&bundler, &["a.css"]);
        let result = bundler.save_to(&narrowed, OUTPUT, false).unwrap();
        assert_eq!(result.outcome, SaveOutcome::Rebuilt);
        assert_eq!(fs::read_to_string(&result.output_path).unwrap(), "a;\n");
    }

    #[test]
    fn force_rebuild_overrides_freshness() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "a.css", "a;");
        let mut config = HostConfig::new(Roots::new(tmp.path().display().to_string(), ""));
        config.mode = Mode::Development;
        config.force_rebuild = true;
        let bundler = Bundler::new(config, MemoryKvStore::new(), MinifierSet::with_defaults());
        let assets = asset_set(&bundler, &["a.css"]);

        assert_eq!(
            bundler.save_to(&assets, OUTPUT, false).unwrap().outcome,
            SaveOutcome::Rebuilt
        );
        assert_eq!(
            bundler.save_to(&assets, OUTPUT, false).unwrap().outcome,
            SaveOutcome::Rebuilt
        );
    }

    #[test]
    fn production_mode_never_builds() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "a.css", "a;");
        let config = HostConfig::new(Roots::new(tmp.path().display().to_string(), ""));
        let bundler = Bundler::new(config, MemoryKvStore::new(), MinifierSet::with_defaults());
        // Adds are gated too, so the set stays empty.
        let assets = asset_set(&bundler, &["a.css"]);
        assert!(assets.is_empty());

        let result = bundler.save_to(&assets, OUTPUT, false).unwrap();
        assert_eq!(result.outcome, SaveOutcome::Unchanged);
        assert!(!result.output_path.exists());
        let key = FingerprintKey::derive(OUTPUT_URL, false);
        assert_eq!(bundler.fingerprints().load(&key).unwrap(), None);
    }

    #[test]
    fn stale_recorded_build_time_triggers_rebuild() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "a.css", "a;");
        let bundler = dev_bundler(&tmp);
        let assets = asset_set(&bundler, &["a.css"]);
        bundler.save_to(&assets, OUTPUT, false).unwrap();

        // Backdate the recorded build instead of sleeping past mtime
        // granularity.
        let key = FingerprintKey::derive(OUTPUT_URL, false);
        let recorded = bundler.fingerprints().load(&key).unwrap().unwrap();
        bundler
            .fingerprints()
            .record(&key, &FingerprintEntry::new(0, recorded.inputs))
            .unwrap();

        let result = bundler.save_to(&assets, OUTPUT, false).unwrap();
        assert_eq!(result.outcome, SaveOutcome::Rebuilt);
    }

    #[test]
    fn missing_output_triggers_rebuild() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "a.css", "a;");
        let bundler = dev_bundler(&tmp);
        let assets = asset_set(&bundler, &["a.css"]);

        let first = bundler.save_to(&assets, OUTPUT, false).unwrap();
        fs::remove_file(&first.output_path).unwrap();

        let result = bundler.save_to(&assets, OUTPUT, false).unwrap();
        assert_eq!(result.outcome, SaveOutcome::Rebuilt);
        assert!(result.output_path.exists());
    }

    #[test]
    fn missing_source_keeps_target_stale() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "a.css", "a;");
        let bundler = dev_bundler(&tmp);
        let assets = asset_set(&bundler, &["a.css", "ghost.css"]);

        assert_eq!(
            bundler.save_to(&assets, OUTPUT, false).unwrap().outcome,
            SaveOutcome::Rebuilt
        );
        // The unreadable source keeps counting as touched.
        assert_eq!(
            bundler.save_to(&assets, OUTPUT, false).unwrap().outcome,
            SaveOutcome::Rebuilt
        );
    }

    #[test]
    fn invalidate_all_forces_reverification() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "a.css", "a;");
        write_app_file(&tmp, "b.js", "b;");
        let bundler = dev_bundler(&tmp);
        let css = asset_set(&bundler, &["a.css"]);
        let js = asset_set(&bundler, &["b.js"]);
        bundler.save_to(&css, OUTPUT, false).unwrap();
        bundler.save_to(&js, "app/build/main.js", false).unwrap();

        assert_eq!(bundler.invalidate_all().unwrap(), 2);
        assert_eq!(
            bundler.save_to(&css, OUTPUT, false).unwrap().outcome,
            SaveOutcome::Rebuilt
        );
        assert_eq!(
            bundler
                .save_to(&js, "app/build/main.js", false)
                .unwrap()
                .outcome,
            SaveOutcome::Rebuilt
        );
    }

    #[test]
    fn save_if_false_is_a_complete_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let bundler = dev_bundler(&tmp);
        let assets = AssetSet::new();

        // Even an unresolvable output does not error: nothing is resolved.
        let result = bundler.save_if(false, &assets, "/elsewhere/out.css", false).unwrap();
        assert_eq!(result.outcome, SaveOutcome::Skipped);
        assert_eq!(result.output_path, PathBuf::from("/elsewhere/out.css"));
        assert_eq!(result.duration, Duration::ZERO);
    }

    #[test]
    fn save_if_true_delegates() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "a.css", "a;");
        let bundler = dev_bundler(&tmp);
        let assets = asset_set(&bundler, &["a.css"]);

        let result = bundler.save_if(true, &assets, OUTPUT, false).unwrap();
        assert_eq!(result.outcome, SaveOutcome::Rebuilt);
    }

    #[test]
    fn empty_set_cannot_build() {
        let tmp = tempfile::tempdir().unwrap();
        let bundler = dev_bundler(&tmp);
        let assets = AssetSet::new();

        let result = bundler.save_to(&assets, OUTPUT, false);
        assert!(matches!(result, Err(EngineError::EmptyAssetSet { .. })));
    }

    #[test]
    fn minified_and_plain_targets_fingerprint_separately() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "a.css", "a { color: red }");
        let bundler = dev_bundler(&tmp);
        let assets = asset_set(&bundler, &["a.css"]);

        bundler.save_to(&assets, OUTPUT, true).unwrap();

        let minified = FingerprintKey::derive(OUTPUT_URL, true);
        let plain = FingerprintKey::derive(OUTPUT_URL, false);
        assert!(bundler.fingerprints().load(&minified).unwrap().is_some());
        assert_eq!(bundler.fingerprints().load(&plain).unwrap(), None);
    }

    #[test]
    fn should_rebuild_matches_save_behavior() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "a.css", "a;");
        let bundler = dev_bundler(&tmp);
        let assets = asset_set(&bundler, &["a.css"]);

        assert!(bundler.should_rebuild(&assets, OUTPUT, false).unwrap());
        bundler.save_to(&assets, OUTPUT, false).unwrap();
        assert!(!bundler.should_rebuild(&assets, OUTPUT, false).unwrap());
    }

    #[test]
    fn html_tag_for_built_css_carries_mtime() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "a.css", "a;");
        let bundler = dev_bundler(&tmp);
        let assets = asset_set(&bundler, &["a.css"]);
        let built = bundler.save_to(&assets, OUTPUT, false).unwrap();

        let mtime = cachet_util::fs::modified_epoch(&built.output_path).unwrap();
        assert_eq!(
            bundler.html_tag(OUTPUT).unwrap(),
            format!(r#"<link rel="stylesheet" href="{OUTPUT_URL}?m={mtime}">"#)
        );
    }

    #[test]
    fn html_tag_for_built_js_renders_script() {
        let tmp = tempfile::tempdir().unwrap();
        write_app_file(&tmp, "b.js", "b;");
        let bundler = dev_bundler(&tmp);
        let assets = asset_set(&bundler, &["b.js"]);
        let built = bundler.save_to(&assets, "app/build/main.js", false).unwrap();

        let mtime = cachet_util::fs::modified_epoch(&built.output_path).unwrap();
        assert_eq!(
            bundler.html_tag("app/build/main.js").unwrap(),
            format!(r#"<script src="/app/build/main.js?m={mtime}"></script>"#)
        );
    }

    #[test]
    fn html_tag_without_artifact_omits_cache_buster() {
        let tmp = tempfile::tempdir().unwrap();
        let bundler = dev_bundler(&tmp);
        assert_eq!(
            bundler.html_tag("app/build/ghost.css").unwrap(),
            r#"<link rel="stylesheet" href="/app/build/ghost.css">"#
        );
    }

    #[test]
    fn html_tag_rejects_unknown_extensions() {
        let tmp = tempfile::tempdir().unwrap();
        let bundler = dev_bundler(&tmp);
        let result = bundler.html_tag("app/readme.txt");
        assert!(matches!(
            result,
            Err(EngineError::UnsupportedKind { kind }) if kind == "txt"
        ));
    }
}
