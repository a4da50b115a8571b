// src/lib.rs

//! Show the changelog section for a package's current version.
//!
//! [`run`] finds the nearest `package.json` or `Cargo.toml`, reads the changelog
//! next to it, extracts the section for the package's version and renders it for
//! a terminal. The extraction itself lives in [`extractors`] and can be used on
//! already-parsed documents.

pub mod changelog;
pub mod extractors;
pub mod markdown;
pub mod package;
pub mod render;
pub mod utils;

pub use changelog::{run, Options, WhatsNew};
pub use extractors::{extract, fallback_message, Extraction, MatchConfig, Pattern};
pub use utils::AppError;
