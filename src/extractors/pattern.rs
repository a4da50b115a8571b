// src/extractors/pattern.rs

//! Recognising "version heading" blocks.
//!
//! A [`Pattern`] is a small bag of expected field values. A block satisfies it when
//! every pattern field the block carries holds the expected value; fields the block
//! doesn't carry are skipped. The version field is then searched for the
//! [`VersionToken`].

use std::fmt;
use std::str::FromStr;

use crate::markdown::{Block, Field, Scalar};
use crate::utils::error::PatternError;

// --- Pattern ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    fields: Vec<(Field, Scalar)>,
}

impl Pattern {
    /// A pattern that every block satisfies structurally.
    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds (or replaces) an expected field value.
    pub fn with(mut self, field: Field, value: impl Into<Scalar>) -> Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &(Field, Scalar)> {
        self.fields.iter()
    }

    /// Structural half of the match. The first mismatching field decides.
    pub fn is_satisfied_by(&self, block: &Block) -> bool {
        for (field, expected) in &self.fields {
            if let Some(actual) = block.field(*field) {
                if actual != *expected {
                    return false;
                }
                tracing::trace!("found matching {}: {}", field, actual);
            }
        }
        true
    }

    /// Builds a pattern from `key=value` entries, later keys winning.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        entries.into_iter().try_fold(Pattern::empty(), |pattern, entry| {
            let (field, value) = parse_entry(entry.as_ref())?;
            Ok(pattern.with(field, value))
        })
    }
}

/// `{type: heading, depth: 2}`
impl Default for Pattern {
    fn default() -> Self {
        Pattern::empty().with(Field::Type, "heading").with(Field::Depth, 2i64)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, value)| format!("{}={}", field, value))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    /// Comma-separated `key=value` entries, e.g. `type=heading,depth=3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::from_entries(s.split(',').map(str::trim).filter(|e| !e.is_empty()))
    }
}

fn parse_entry(entry: &str) -> Result<(Field, Scalar), PatternError> {
    let (key, value) = entry
        .split_once('=')
        .ok_or_else(|| PatternError::MissingSeparator(entry.to_string()))?;
    let field: Field = key.parse()?;
    Ok((field, Scalar::infer(value.trim())))
}

// --- Version token ---

/// A version string searched for inside heading text.
///
/// The token may appear anywhere in the text, but must be followed by the end of
/// the text or by something other than `.`, so `1.2` does not hit `1.2.3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn is_found_in(&self, text: &str) -> bool {
        let token = self.0.as_str();
        if token.is_empty() {
            return false;
        }
        // Every start offset, so overlapping occurrences (`1.1` in `1.1.1`) are seen
        text.char_indices().any(|(at, _)| {
            text[at..].starts_with(token) && !text[at + token.len()..].starts_with('.')
        })
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Shared predicate ---

/// Which way the version test must go for a block to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionTest {
    /// The start of the wanted section
    Matches,
    /// The start of any other version's section
    DoesNotMatch,
}

/// Decides whether `block` is a version heading of the requested polarity.
///
/// Both scans of the extractor go through here so structural matching can't drift
/// between them.
pub fn is_version_heading(
    block: &Block,
    pattern: &Pattern,
    version_field: Field,
    version: &VersionToken,
    test: VersionTest,
) -> bool {
    let Some(value) = block.field(version_field) else {
        return false;
    };
    if !pattern.is_satisfied_by(block) {
        return false;
    }

    let text = value.to_string();
    let found = version.is_found_in(&text);
    match test {
        VersionTest::Matches => {
            if found {
                tracing::debug!("found version matching {} in {:?}", version, text);
            }
            found
        }
        VersionTest::DoesNotMatch => {
            if !found {
                tracing::debug!("found version NOT matching {} in {:?}", version, text);
            }
            !found
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{Inline, ListItem};

    fn heading(depth: u8, text: &str) -> Block {
        Block::Heading {
            depth,
            content: vec![Inline::Text(text.to_string())],
        }
    }

    fn paragraph(text: &str) -> Block {
        Block::Paragraph {
            content: vec![Inline::Text(text.to_string())],
        }
    }

    #[test]
    fn test_version_token_boundary() {
        let short = VersionToken::new("1.2");
        assert!(short.is_found_in("1.2"));
        assert!(short.is_found_in("1.2 "));
        assert!(!short.is_found_in("1.2.3"));
        assert!(VersionToken::new("1.2.3").is_found_in("1.2.3"));
    }

    #[test]
    fn test_version_token_later_occurrence_counts() {
        // First hit is followed by '.', the second isn't
        assert!(VersionToken::new("1.2").is_found_in("1.2.3 (was 1.2)"));
        assert!(VersionToken::new("2.0.0").is_found_in("[2.0.0](https://example.com) - 2020-01-01"));
    }

    #[test]
    fn test_version_token_overlapping_occurrence_counts() {
        // `1.1` at offset 0 is followed by '.', at offset 2 it ends the text
        assert!(VersionToken::new("1.1").is_found_in("1.1.1"));
        assert!(!VersionToken::new("1.1").is_found_in("1.1.2"));
    }

    #[test]
    fn test_empty_token_never_matches() {
        assert!(!VersionToken::new("").is_found_in("anything"));
    }

    #[test]
    fn test_default_pattern() {
        let pattern = Pattern::default();
        assert!(pattern.is_satisfied_by(&heading(2, "1.0.0")));
        assert!(!pattern.is_satisfied_by(&heading(3, "1.0.0")));
        assert!(!pattern.is_satisfied_by(&paragraph("1.0.0")));
    }

    #[test]
    fn test_fields_absent_from_block_are_ignored() {
        // Paragraphs carry no depth, so only `type` is compared
        let pattern = Pattern::empty().with(Field::Type, "paragraph").with(Field::Depth, 2i64);
        assert!(pattern.is_satisfied_by(&paragraph("1.0.0")));
    }

    #[test]
    fn test_block_without_version_field_never_matches() {
        let version = VersionToken::new("1.0.0");
        let list = Block::List {
            ordered: false,
            start: None,
            items: vec![ListItem {
                task: None,
                blocks: vec![paragraph("1.0.0")],
            }],
        };
        for test in [VersionTest::Matches, VersionTest::DoesNotMatch] {
            assert!(!is_version_heading(&list, &Pattern::empty(), Field::Text, &version, test));
            assert!(!is_version_heading(&Block::Rule, &Pattern::empty(), Field::Text, &version, test));
        }
    }

    #[test]
    fn test_predicate_polarity() {
        let version = VersionToken::new("2.0.0");
        let pattern = Pattern::default();
        let current = heading(2, "2.0.0");
        let older = heading(2, "1.9.0");
        let nested = heading(3, "1.9.0");

        assert!(is_version_heading(&current, &pattern, Field::Text, &version, VersionTest::Matches));
        assert!(!is_version_heading(&current, &pattern, Field::Text, &version, VersionTest::DoesNotMatch));
        assert!(is_version_heading(&older, &pattern, Field::Text, &version, VersionTest::DoesNotMatch));
        // Structural mismatch fails both ways
        assert!(!is_version_heading(&nested, &pattern, Field::Text, &version, VersionTest::DoesNotMatch));
        assert!(!is_version_heading(&nested, &pattern, Field::Text, &version, VersionTest::Matches));
    }

    #[test]
    fn test_pattern_from_str() {
        let pattern: Pattern = "type=heading, depth=3".parse().expect("valid pattern");
        assert_eq!(pattern, Pattern::empty().with(Field::Type, "heading").with(Field::Depth, 3i64));
        assert_eq!(pattern.to_string(), "{type=heading, depth=3}");

        assert_eq!(
            "depth".parse::<Pattern>(),
            Err(PatternError::MissingSeparator("depth".into()))
        );
        assert_eq!(
            "level=2".parse::<Pattern>(),
            Err(PatternError::UnknownField("level".into()))
        );
    }

    #[test]
    fn test_pattern_with_replaces_existing_field() {
        let pattern = Pattern::default().with(Field::Depth, 1i64);
        assert_eq!(pattern.fields().count(), 2);
        assert!(pattern.is_satisfied_by(&heading(1, "x")));
    }
}
