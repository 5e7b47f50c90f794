//! URL construction helpers for templated and locally-served assets.
//!
//! Template expansion and prefix handling are split into focused submodules
//! so placeholder substitution, mode-dependent prefix derivation, and the
//! literal-prefix extraction used for tag matching can be tested on their
//! own. The same code serves the asset list builder and the tag
//! post-processor.

mod prefix;
mod template;

pub use prefix::{ensure_trailing_slash, url_prefix};
pub use template::{TemplateError, expand_template, template_prefix};
