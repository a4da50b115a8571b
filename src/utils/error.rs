// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

// Errors raised while locating the package descriptor
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("No package.json or Cargo.toml found from {}", start.display())]
    NotFound { start: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed package descriptor {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("Package descriptor {} has no version", path.display())]
    MissingVersion { path: PathBuf },
}

#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("Could not read changelog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// Raised when a `key=value` pattern entry cannot be understood
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PatternError {
    #[error("Expected KEY=VALUE, got '{0}'")]
    MissingSeparator(String),

    #[error("Unknown block field '{0}' (expected one of: type, depth, text, lang, ordered, start)")]
    UnknownField(String),
}

// Bad `--match` input never gets here; the CLI reports it as a usage error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Package metadata lookup failed: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Changelog unavailable: {0}")]
    Changelog(#[from] ChangelogError),
}
