//! The per-kind minifier registry.

use std::collections::HashMap;

use crate::css::CssMinifier;
use crate::error::MinifyError;
use crate::js::JsMinifier;
use crate::kind::AssetKind;

/// Whole-text minification for one asset language.
///
/// Implementations must preserve `/*! ... */` bang comments verbatim; the
/// merge pipeline embeds placeholders in that form to carry excluded files
/// through minification, and license headers conventionally use it too.
pub trait Minifier {
    /// Minify whole source text into whole output text.
    ///
    /// # Errors
    /// Returns an error if the source cannot be processed.
    fn minify(&self, source: &str) -> Result<String, MinifyError>;
}

/// Registry mapping an asset kind (lowercase extension) to its minifier.
///
/// Lookups are case-insensitive. Hosts can override a built-in or add kinds
/// the built-ins do not cover (`"less"`, `"svg"`, ...).
pub struct MinifierSet {
    minifiers: HashMap<String, Box<dyn Minifier>>,
}

impl MinifierSet {
    /// A registry with no minifiers at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            minifiers: HashMap::new(),
        }
    }

    /// A registry with the built-in CSS and JS minifiers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut set = Self::empty();
        set.register(AssetKind::Css.extension(), Box::new(CssMinifier));
        set.register(AssetKind::Js.extension(), Box::new(JsMinifier));
        set
    }

    /// Register `minifier` for `kind`, replacing any existing registration.
    pub fn register(&mut self, kind: impl Into<String>, minifier: Box<dyn Minifier>) {
        self.minifiers
            .insert(kind.into().to_ascii_lowercase(), minifier);
    }

    /// Look up the minifier for `kind`, if one is registered.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&dyn Minifier> {
        self.minifiers
            .get(&kind.to_ascii_lowercase())
            .map(Box::as_ref)
    }
}

impl Default for MinifierSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Upper;

    impl Minifier for Upper {
        fn minify(&self, source: &str) -> Result<String, MinifyError> {
            Ok(source.to_ascii_uppercase())
        }
    }

    #[test]
    fn defaults_cover_css_and_js() {
        let set = MinifierSet::with_defaults();
        assert!(set.get("css").is_some());
        assert!(set.get("js").is_some());
        assert!(set.get("less").is_none());
    }

    #[test]
    fn empty_has_nothing() {
        let set = MinifierSet::empty();
        assert!(set.get("css").is_none());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let set = MinifierSet::with_defaults();
        assert!(set.get("CSS").is_some());
        assert!(set.get("Js").is_some());
    }

    #[test]
    fn register_adds_new_kind() {
        let mut set = MinifierSet::with_defaults();
        set.register("less", Box::new(Upper));
        let out = set.get("less").unwrap().minify("abc").unwrap();
        assert_eq!(out, "ABC");
    }

    #[test]
    fn register_overrides_builtin() {
        let mut set = MinifierSet::with_defaults();
        set.register("css", Box::new(Upper));
        let out = set.get("css").unwrap().minify("a{}").unwrap();
        assert_eq!(out, "A{}");
    }
}
