//! Post-processing of emitted HTML asset tags.
//!
//! A separate enrichment phase over the rendered tag set: the asset lists
//! are computed first as pure values, then matching tags are decorated with
//! cross-origin and subresource-integrity attributes. Integrity hashing is
//! behind a trait so hosts and tests can supply their own collaborator.

mod integrity;
mod process;

pub use integrity::{FetchIntegrityProvider, IntegrityError, IntegrityProvider, encode_integrity};
pub use process::{HtmlTag, TagProcessOptions, process_tags};
