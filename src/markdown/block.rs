// src/markdown/block.rs
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::PatternError;

// --- Inline content ---

/// Where a link points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Destination known at parse time (inline link or a reference defined in the same text)
    Url(String),
    /// Reference label that was not defined in the parsed text; resolved against the
    /// document's [`LinkTable`] when rendering
    Reference(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Html(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link {
        target: LinkTarget,
        title: Option<String>,
        children: Vec<Inline>,
    },
    Image {
        target: LinkTarget,
        alt: Vec<Inline>,
    },
    SoftBreak,
    HardBreak,
}

/// Concatenates the human-readable text of a run of inlines.
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    push_plain(inlines, &mut out);
    out
}

fn push_plain(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(t) | Inline::Code(t) | Inline::Html(t) => out.push_str(t),
            Inline::Emphasis(c) | Inline::Strong(c) | Inline::Strikethrough(c) => push_plain(c, out),
            Inline::Link { children, .. } => push_plain(children, out),
            Inline::Image { alt, .. } => push_plain(alt, out),
            Inline::SoftBreak => out.push(' '),
            Inline::HardBreak => out.push('\n'),
        }
    }
}

// --- Blocks ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// `Some(checked)` for task list items
    pub task: Option<bool>,
    pub blocks: Vec<Block>,
}

/// One structural unit of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { depth: u8, content: Vec<Inline> },
    Paragraph { content: Vec<Inline> },
    List {
        ordered: bool,
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    Code { lang: Option<String>, text: String },
    BlockQuote { blocks: Vec<Block> },
    Html { text: String },
    Table {
        header: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    Rule,
}

impl Block {
    /// Name reported for the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Heading { .. } => "heading",
            Block::Paragraph { .. } => "paragraph",
            Block::List { .. } => "list",
            Block::Code { .. } => "code",
            Block::BlockQuote { .. } => "blockquote",
            Block::Html { .. } => "html",
            Block::Table { .. } => "table",
            Block::Rule => "hr",
        }
    }

    /// Returns the value of a named field, or `None` when this kind of block
    /// does not carry it.
    pub fn field(&self, field: Field) -> Option<Scalar> {
        match (field, self) {
            (Field::Type, _) => Some(Scalar::Str(self.kind().to_string())),
            (Field::Depth, Block::Heading { depth, .. }) => Some(Scalar::Int(i64::from(*depth))),
            (Field::Text, _) => self.text().map(Scalar::Str),
            (Field::Lang, Block::Code { lang, .. }) => lang.clone().map(Scalar::Str),
            (Field::Ordered, Block::List { ordered, .. }) => Some(Scalar::Bool(*ordered)),
            (Field::Start, Block::List { start: Some(n), .. }) => i64::try_from(*n).ok().map(Scalar::Int),
            _ => None,
        }
    }

    fn text(&self) -> Option<String> {
        match self {
            Block::Heading { content, .. } | Block::Paragraph { content } => Some(plain_text(content)),
            Block::Code { text, .. } | Block::Html { text } => Some(text.clone()),
            Block::BlockQuote { blocks } => Some(
                blocks
                    .iter()
                    .filter_map(Block::text)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Block::List { .. } | Block::Table { .. } | Block::Rule => None,
        }
    }
}

// --- Fields & scalars ---

/// The block fields a pattern or version lookup may refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Type,
    Depth,
    Text,
    Lang,
    Ordered,
    Start,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Type => "type",
            Field::Depth => "depth",
            Field::Text => "text",
            Field::Lang => "lang",
            Field::Ordered => "ordered",
            Field::Start => "start",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "type" => Ok(Field::Type),
            "depth" => Ok(Field::Depth),
            "text" => Ok(Field::Text),
            "lang" => Ok(Field::Lang),
            "ordered" => Ok(Field::Ordered),
            "start" => Ok(Field::Start),
            other => Err(PatternError::UnknownField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl Scalar {
    /// Reads a textual value, preferring booleans, then integers, then strings.
    pub fn infer(raw: &str) -> Self {
        if let Ok(b) = raw.parse::<bool>() {
            Scalar::Bool(b)
        } else if let Ok(n) = raw.parse::<i64>() {
            Scalar::Int(n)
        } else {
            Scalar::Str(raw.to_string())
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => f.write_str(s),
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

// --- Link references ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDef {
    pub href: String,
    pub title: Option<String>,
}

/// Reference-style link definitions keyed by case-folded label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    defs: BTreeMap<String, LinkDef>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(label: &str) -> String {
        label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
    }

    pub fn insert(&mut self, label: &str, def: LinkDef) {
        self.defs.insert(Self::normalize(label), def);
    }

    pub fn get(&self, label: &str) -> Option<&LinkDef> {
        self.defs.get(&Self::normalize(label))
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Adds every definition from `other` whose label is not already present.
    pub fn merge_under(&mut self, other: LinkTable) {
        for (label, def) in other.defs {
            self.defs.entry(label).or_insert(def);
        }
    }

    /// Adds every definition from `other`, replacing existing labels.
    pub fn merge_over(&mut self, other: LinkTable) {
        self.defs.extend(other.defs);
    }
}

/// A block sequence together with the link definitions it can resolve against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
    pub links: LinkTable,
}

impl Document {
    pub fn new(blocks: Vec<Block>, links: LinkTable) -> Self {
        Self { blocks, links }
    }
}
