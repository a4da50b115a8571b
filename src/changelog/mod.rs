// src/changelog/mod.rs
use std::path::{Path, PathBuf};

use crate::extractors::{fallback_message, Extraction, MatchConfig, SectionExtractor};
use crate::markdown;
use crate::package;
use crate::render::{self, RendererOptions};
use crate::utils::error::{AppError, ChangelogError};

pub const DEFAULT_CHANGELOG: &str = "CHANGELOG.md";

/// Everything `run` needs besides the starting path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Changelog location relative to the package descriptor's directory
    pub changelog: PathBuf,
    pub matching: MatchConfig,
    pub renderer: RendererOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            changelog: PathBuf::from(DEFAULT_CHANGELOG),
            matching: MatchConfig::default(),
            renderer: RendererOptions::default(),
        }
    }
}

/// Rendered changes for the package's current version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsNew {
    pub version: String,
    pub changelog: PathBuf,
    /// `false` when `changes` is the fallback sentence
    pub section_found: bool,
    pub changes: String,
}

/// Reads a changelog as UTF-8 text.
pub async fn read(path: &Path) -> Result<String, ChangelogError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ChangelogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!("Read changelog {} ({} bytes)", path.display(), content.len());
    Ok(content)
}

/// Where the changelog lives for a given descriptor.
pub fn changelog_path(descriptor: &Path, changelog: &Path) -> PathBuf {
    // `join` keeps an absolute `changelog` as-is
    descriptor
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(changelog)
}

/// Renders the changelog section for a changelog text and version.
pub fn changes_for(text: &str, version: &str, options: &Options) -> (bool, String) {
    let document = markdown::parse(text);
    match SectionExtractor::new(options.matching.clone()).extract(&document, version) {
        Extraction::Found(section) => (true, render::render(&section, &options.renderer)),
        Extraction::NotFound => {
            tracing::info!("No changelog section for version {}", version);
            (false, fallback_message(version))
        }
    }
}

/// Looks up the package around `start`, reads its changelog and renders the
/// section for the package's version.
///
/// Metadata and file failures come back as errors before anything is parsed. A
/// missing section is not an error.
pub async fn run(start: impl AsRef<Path>, options: &Options) -> Result<WhatsNew, AppError> {
    let metadata = package::resolve(start).await?;
    tracing::info!(
        "Package version {} from {}",
        metadata.version,
        metadata.path.display()
    );

    let path = changelog_path(&metadata.path, &options.changelog);
    tracing::info!("Reading changelog: {}", path.display());
    let text = read(&path).await?;

    let (section_found, changes) = changes_for(&text, &metadata.version, options);
    Ok(WhatsNew {
        version: metadata.version,
        changelog: path,
        section_found,
        changes,
    })
}
