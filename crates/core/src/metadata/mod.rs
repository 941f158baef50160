//! Filename metadata extraction.

mod extractor;
mod patterns;
mod template;
mod types;

pub use extractor::{strip_extension, MetadataExtractor};
pub use template::{FilenameTemplate, TemplateError};
pub use types::{Category, Metadata, PatternId, Provenance};
