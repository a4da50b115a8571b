// src/extractors/section.rs

// --- Imports ---
use crate::extractors::pattern::{is_version_heading, Pattern, VersionTest, VersionToken};
use crate::markdown::{self, Document, Field};

// --- Configuration ---

/// How version headings are recognised and what gets wrapped around the section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    pub pattern: Pattern,
    pub version_field: Field,
    /// Markdown prepended to the section
    pub header: Option<String>,
    /// Markdown appended to the section
    pub footer: Option<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            pattern: Pattern::default(),
            version_field: Field::Text,
            header: None,
            footer: None,
        }
    }
}

// --- Data Structures ---

/// Outcome of looking for a version's section.
///
/// `NotFound` is distinct from a found-but-empty section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Found(Document),
    NotFound,
}

/// What callers show when the changelog has nothing for `version`.
pub fn fallback_message(version: &str) -> String {
    format!(
        "What's new for version {}?  Who knows?!\n\nSomebody should fix this.",
        version
    )
}

// --- Main Extractor Structure ---
pub struct SectionExtractor {
    config: MatchConfig,
}

impl SectionExtractor {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Pulls out the blocks belonging to `version`, wrapped in the configured
    /// header/footer.
    ///
    /// The section runs from the first version heading mentioning `version` up to,
    /// but not including, the next version heading that doesn't. Without such a
    /// heading it runs to the end of the document.
    pub fn extract(&self, document: &Document, version: &str) -> Extraction {
        let token = VersionToken::new(version);
        let blocks = &document.blocks;

        let Some(start) = self.find_heading(blocks, 0, &token, VersionTest::Matches) else {
            tracing::debug!(
                "No heading for version {} matching {} in {} blocks",
                version,
                self.config.pattern,
                blocks.len()
            );
            return Extraction::NotFound;
        };
        tracing::debug!("found version {} at index {}", version, start);

        // Falling off the end means this is the only (or oldest) version section
        let end = self
            .find_heading(blocks, start + 1, &token, VersionTest::DoesNotMatch)
            .unwrap_or(blocks.len());
        tracing::debug!("taking blocks from {} to {}", start, end);

        let mut section = Document::new(blocks[start..end].to_vec(), document.links.clone());
        self.splice_header(&mut section);
        self.splice_footer(&mut section);

        Extraction::Found(section)
    }

    fn find_heading(
        &self,
        blocks: &[markdown::Block],
        from: usize,
        token: &VersionToken,
        test: VersionTest,
    ) -> Option<usize> {
        blocks
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, block)| {
                is_version_heading(block, &self.config.pattern, self.config.version_field, token, test)
            })
            .map(|(idx, _)| idx)
    }

    // Header links only fill gaps; the changelog's own definitions win
    fn splice_header(&self, section: &mut Document) {
        let Some(header) = self.config.header.as_deref() else {
            return;
        };
        let parsed = markdown::parse(header);
        tracing::trace!("prepending {} header blocks", parsed.blocks.len());

        let mut blocks = parsed.blocks;
        blocks.append(&mut section.blocks);
        section.blocks = blocks;
        section.links.merge_under(parsed.links);
    }

    // Footer links override whatever was there
    fn splice_footer(&self, section: &mut Document) {
        let Some(footer) = self.config.footer.as_deref() else {
            return;
        };
        let parsed = markdown::parse(footer);
        tracing::trace!("appending {} footer blocks", parsed.blocks.len());

        section.blocks.extend(parsed.blocks);
        section.links.merge_over(parsed.links);
    }
}

/// Convenience wrapper around [`SectionExtractor::extract`].
pub fn extract(document: &Document, version: &str, config: &MatchConfig) -> Extraction {
    SectionExtractor::new(config.clone()).extract(document, version)
}
