//! Asset kinds, the minifier seam, and the built-in light minifiers.
//!
//! The merge pipeline only ever talks to [`Minifier::minify`]: whole source
//! text in, whole minified text out. Hosts that want a heavier optimizer
//! register their own implementation per kind; the built-ins here are
//! deliberately conservative and never reorder or join statements.

pub mod css;
pub mod error;
pub mod js;
pub mod kind;
pub mod registry;

pub use css::CssMinifier;
pub use error::MinifyError;
pub use js::JsMinifier;
pub use kind::{AssetKind, SUPPORTED_EXTENSIONS};
pub use registry::{Minifier, MinifierSet};
