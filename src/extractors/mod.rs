// src/extractors/mod.rs
pub mod pattern;
pub mod section;

// Re-export key extraction types for convenience
pub use pattern::{is_version_heading, Pattern, VersionTest, VersionToken};
pub use section::{extract, fallback_message, Extraction, MatchConfig, SectionExtractor};
