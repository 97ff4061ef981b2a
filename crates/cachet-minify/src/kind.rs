//! Asset kinds the pipeline understands out of the box.

use std::fmt;

/// Extensions scanned by default when a directory is added without an
/// explicit filter.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["js", "css"];

/// An asset language with built-in support.
///
/// Note that merging (non-minified builds) works for any extension; this
/// enum only matters where the pipeline must understand the language:
/// minification and HTML tag rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Css,
    Js,
}

impl AssetKind {
    /// Map a file extension (case-insensitive) to its kind.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "css" => Some(AssetKind::Css),
            "js" => Some(AssetKind::Js),
            _ => None,
        }
    }

    /// The canonical lowercase extension for this kind.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Css => "css",
            AssetKind::Js => "js",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
