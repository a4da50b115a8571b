// src/markdown/parser.rs

//! Turns markdown text into a [`Document`].
//!
//! pulldown-cmark hands us a flat stream of start/end events. The builder keeps a
//! stack of open containers (block quotes, lists, list items) and at most one open
//! leaf (heading, paragraph, table cell) that collects inline spans.

use pulldown_cmark::{BrokenLink, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};

use super::block::{Block, Document, Inline, LinkDef, LinkTable, LinkTarget, ListItem};

/// Parses markdown into blocks plus the reference definitions it declares.
pub fn parse(text: &str) -> Document {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_with_broken_link_callback(text, options, Some(keep_reference));

    let mut links = LinkTable::new();
    for (label, def) in parser.reference_definitions().iter() {
        links.insert(
            label,
            LinkDef {
                href: def.dest.to_string(),
                title: def.title.as_ref().map(|t| t.to_string()),
            },
        );
    }

    let mut builder = DocumentBuilder::new();
    for event in parser {
        builder.process_event(event);
    }
    let blocks = builder.finalize();

    tracing::trace!("Parsed {} blocks, {} link definitions", blocks.len(), links.len());
    Document::new(blocks, links)
}

// Undefined references stay links; the label rides along as the destination and is
// recognised later through the `*Unknown` link types.
fn keep_reference<'a>(link: BrokenLink<'a>) -> Option<(CowStr<'a>, CowStr<'a>)> {
    Some((link.reference, CowStr::Borrowed("")))
}

fn link_target(link_type: LinkType, dest: CowStr<'_>) -> LinkTarget {
    match link_type {
        LinkType::ReferenceUnknown | LinkType::CollapsedUnknown | LinkType::ShortcutUnknown => {
            LinkTarget::Reference(dest.to_string())
        }
        _ => LinkTarget::Url(dest.to_string()),
    }
}

// --- Builder state ---

enum Container {
    Root(Vec<Block>),
    Quote(Vec<Block>),
    List {
        ordered: bool,
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    Item {
        task: Option<bool>,
        blocks: Vec<Block>,
    },
}

enum LeafKind {
    Heading(u8),
    Paragraph,
    Cell,
}

enum SpanKind {
    Emphasis,
    Strong,
    Strikethrough,
    Link { target: LinkTarget, title: Option<String> },
    Image { target: LinkTarget },
}

struct Span {
    kind: SpanKind,
    children: Vec<Inline>,
}

// Adjacent text events are merged so `[`, `]` and entity splits don't fragment runs
fn push_merged(children: &mut Vec<Inline>, inline: Inline) {
    if let (Inline::Text(next), Some(Inline::Text(prev))) = (&inline, children.last_mut()) {
        prev.push_str(next);
        return;
    }
    children.push(inline);
}

impl Span {
    fn into_inline(self) -> Inline {
        match self.kind {
            SpanKind::Emphasis => Inline::Emphasis(self.children),
            SpanKind::Strong => Inline::Strong(self.children),
            SpanKind::Strikethrough => Inline::Strikethrough(self.children),
            SpanKind::Link { target, title } => Inline::Link {
                target,
                title,
                children: self.children,
            },
            SpanKind::Image { target } => Inline::Image {
                target,
                alt: self.children,
            },
        }
    }
}

struct Leaf {
    kind: LeafKind,
    content: Vec<Inline>,
    open: Vec<Span>,
}

impl Leaf {
    fn new(kind: LeafKind) -> Self {
        Self {
            kind,
            content: Vec::new(),
            open: Vec::new(),
        }
    }

    fn open_span(&mut self, kind: SpanKind) {
        self.open.push(Span {
            kind,
            children: Vec::new(),
        });
    }

    fn push(&mut self, inline: Inline) {
        match self.open.last_mut() {
            Some(span) => push_merged(&mut span.children, inline),
            None => push_merged(&mut self.content, inline),
        }
    }

    fn close_span(&mut self) {
        if let Some(span) = self.open.pop() {
            self.push(span.into_inline());
        }
    }

    fn into_content(mut self) -> Vec<Inline> {
        while !self.open.is_empty() {
            self.close_span();
        }
        self.content
    }
}

#[derive(Default)]
struct TableState {
    header: Vec<Vec<Inline>>,
    rows: Vec<Vec<Vec<Inline>>>,
    row: Vec<Vec<Inline>>,
}

struct DocumentBuilder {
    containers: Vec<Container>,
    leaf: Option<Leaf>,
    code: Option<(Option<String>, String)>,
    html: Option<String>,
    table: Option<TableState>,
}

impl DocumentBuilder {
    fn new() -> Self {
        Self {
            containers: vec![Container::Root(Vec::new())],
            leaf: None,
            code: None,
            html: None,
            table: None,
        }
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some((_, code)) = self.code.as_mut() {
                    code.push_str(&text);
                } else if let Some(html) = self.html.as_mut() {
                    html.push_str(&text);
                } else {
                    self.inline(Inline::Text(text.to_string()));
                }
            }
            Event::Code(code) => self.inline(Inline::Code(code.to_string())),
            Event::Html(html) => match self.html.as_mut() {
                Some(buffer) => buffer.push_str(&html),
                None => self.inline(Inline::Html(html.to_string())),
            },
            Event::InlineHtml(html) => self.inline(Inline::Html(html.to_string())),
            Event::SoftBreak => self.inline(Inline::SoftBreak),
            Event::HardBreak => self.inline(Inline::HardBreak),
            Event::Rule => {
                self.flush_leaf();
                self.push_block(Block::Rule);
            }
            Event::TaskListMarker(checked) => {
                if let Some(Container::Item { task, .. }) = self.containers.last_mut() {
                    *task = Some(checked);
                }
            }
            Event::FootnoteReference(label) => self.inline(Inline::Text(format!("[^{}]", label))),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Paragraph => {
                self.flush_leaf();
                self.leaf = Some(Leaf::new(LeafKind::Paragraph));
            }
            Tag::Heading { level, .. } => {
                self.flush_leaf();
                self.leaf = Some(Leaf::new(LeafKind::Heading(level as u8)));
            }
            Tag::BlockQuote(_) => {
                self.flush_leaf();
                self.containers.push(Container::Quote(Vec::new()));
            }
            Tag::List(start) => {
                self.flush_leaf();
                self.containers.push(Container::List {
                    ordered: start.is_some(),
                    start,
                    items: Vec::new(),
                });
            }
            Tag::Item => {
                self.flush_leaf();
                self.containers.push(Container::Item {
                    task: None,
                    blocks: Vec::new(),
                });
            }
            Tag::CodeBlock(kind) => {
                self.flush_leaf();
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some((lang, String::new()));
            }
            Tag::HtmlBlock => {
                self.flush_leaf();
                self.html = Some(String::new());
            }
            Tag::Table(_) => {
                self.flush_leaf();
                self.table = Some(TableState::default());
            }
            Tag::TableCell => self.leaf = Some(Leaf::new(LeafKind::Cell)),
            Tag::Emphasis => self.open_span(SpanKind::Emphasis),
            Tag::Strong => self.open_span(SpanKind::Strong),
            Tag::Strikethrough => self.open_span(SpanKind::Strikethrough),
            Tag::Link { link_type, dest_url, title, .. } => {
                let title = (!title.is_empty()).then(|| title.to_string());
                self.open_span(SpanKind::Link {
                    target: link_target(link_type, dest_url),
                    title,
                });
            }
            Tag::Image { link_type, dest_url, .. } => self.open_span(SpanKind::Image {
                target: link_target(link_type, dest_url),
            }),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::TableCell => self.flush_leaf(),
            TagEnd::BlockQuote(_) => {
                self.flush_leaf();
                if let Some(Container::Quote(blocks)) = self.pop_container() {
                    self.push_block(Block::BlockQuote { blocks });
                }
            }
            TagEnd::List(_) => {
                self.flush_leaf();
                if let Some(Container::List { ordered, start, items }) = self.pop_container() {
                    self.push_block(Block::List { ordered, start, items });
                }
            }
            TagEnd::Item => {
                self.flush_leaf();
                if let Some(Container::Item { task, blocks }) = self.pop_container() {
                    if let Some(Container::List { items, .. }) = self.containers.last_mut() {
                        items.push(ListItem { task, blocks });
                    }
                }
            }
            TagEnd::CodeBlock => {
                if let Some((lang, mut text)) = self.code.take() {
                    if text.ends_with('\n') {
                        text.pop();
                    }
                    self.push_block(Block::Code { lang, text });
                }
            }
            TagEnd::HtmlBlock => {
                if let Some(text) = self.html.take() {
                    self.push_block(Block::Html {
                        text: text.trim_end().to_string(),
                    });
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.header = std::mem::take(&mut table.row);
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.push_block(Block::Table {
                        header: table.header,
                        rows: table.rows,
                    });
                }
            }
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::Image => {
                if let Some(leaf) = self.leaf.as_mut() {
                    leaf.close_span();
                }
            }
            _ => {}
        }
    }

    fn open_span(&mut self, kind: SpanKind) {
        self.leaf
            .get_or_insert_with(|| Leaf::new(LeafKind::Paragraph))
            .open_span(kind);
    }

    /// Inline content outside an explicit leaf belongs to a tight list item.
    fn inline(&mut self, inline: Inline) {
        self.leaf
            .get_or_insert_with(|| Leaf::new(LeafKind::Paragraph))
            .push(inline);
    }

    fn flush_leaf(&mut self) {
        let Some(leaf) = self.leaf.take() else {
            return;
        };
        match leaf.kind {
            LeafKind::Heading(depth) => {
                let content = leaf.into_content();
                self.push_block(Block::Heading { depth, content });
            }
            LeafKind::Paragraph => {
                let content = leaf.into_content();
                if !content.is_empty() {
                    self.push_block(Block::Paragraph { content });
                }
            }
            LeafKind::Cell => {
                let content = leaf.into_content();
                if let Some(table) = self.table.as_mut() {
                    table.row.push(content);
                }
            }
        }
    }

    fn pop_container(&mut self) -> Option<Container> {
        // The root is never popped
        if self.containers.len() > 1 {
            self.containers.pop()
        } else {
            None
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.containers.last_mut() {
            Some(Container::Root(blocks))
            | Some(Container::Quote(blocks))
            | Some(Container::Item { blocks, .. }) => blocks.push(block),
            Some(Container::List { items, .. }) => items.push(ListItem {
                task: None,
                blocks: vec![block],
            }),
            None => {}
        }
    }

    fn finalize(mut self) -> Vec<Block> {
        self.flush_leaf();
        // Unbalanced containers can't come out of pulldown-cmark, but fold them anyway
        while self.containers.len() > 1 {
            match self.pop_container() {
                Some(Container::Quote(blocks)) => self.push_block(Block::BlockQuote { blocks }),
                Some(Container::List { ordered, start, items }) => {
                    self.push_block(Block::List { ordered, start, items })
                }
                Some(Container::Item { task, blocks }) => {
                    if let Some(Container::List { items, .. }) = self.containers.last_mut() {
                        items.push(ListItem { task, blocks });
                    }
                }
                Some(Container::Root(_)) | None => break,
            }
        }
        match self.containers.pop() {
            Some(Container::Root(blocks)) => blocks,
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::block::{plain_text, Field, Scalar};

    #[test]
    fn test_headings_and_paragraphs() {
        let doc = parse("# Changelog\n\n## 2.0.0\n\nSome *new* things.\n");
        assert_eq!(doc.blocks.len(), 3);
        assert_eq!(doc.blocks[1].field(Field::Depth), Some(Scalar::Int(2)));
        assert_eq!(doc.blocks[1].field(Field::Text), Some(Scalar::from("2.0.0")));
        assert_eq!(doc.blocks[2].field(Field::Text), Some(Scalar::from("Some new things.")));
    }

    #[test]
    fn test_linked_heading_text_is_plain() {
        let doc = parse("## [1.2.3](https://example.com/compare) / 2021-04-01\n");
        match &doc.blocks[0] {
            Block::Heading { content, .. } => assert_eq!(plain_text(content), "1.2.3 / 2021-04-01"),
            other => panic!("expected heading, got {:?}", other),
        }
    }

    #[test]
    fn test_tight_list_items_become_paragraphs() {
        let doc = parse("- one\n- [x] two\n  - nested\n");
        let Block::List { ordered, items, .. } = &doc.blocks[0] else {
            panic!("expected list, got {:?}", doc.blocks[0]);
        };
        assert!(!ordered);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].blocks[0].field(Field::Text), Some(Scalar::from("one")));
        assert_eq!(items[1].task, Some(true));
        assert!(matches!(items[1].blocks[1], Block::List { .. }));
    }

    #[test]
    fn test_code_block_and_rule() {
        let doc = parse("```rust\nfn main() {}\n```\n\n---\n");
        assert_eq!(
            doc.blocks[0],
            Block::Code {
                lang: Some("rust".into()),
                text: "fn main() {}".into()
            }
        );
        assert_eq!(doc.blocks[1], Block::Rule);
    }

    #[test]
    fn test_reference_definitions_collected() {
        let doc = parse("See [the docs][Docs].\n\n[docs]: https://example.com \"Docs\"\n");
        let def = doc.links.get("DOCS").expect("definition");
        assert_eq!(def.href, "https://example.com");
        assert_eq!(def.title.as_deref(), Some("Docs"));
        let Block::Paragraph { content } = &doc.blocks[0] else {
            panic!("expected paragraph");
        };
        assert!(content.iter().any(|i| matches!(
            i,
            Inline::Link { target: LinkTarget::Url(url), .. } if url == "https://example.com"
        )));
    }

    #[test]
    fn test_undefined_reference_kept_by_label() {
        let doc = parse("Read the [notes][release-notes].\n");
        let Block::Paragraph { content } = &doc.blocks[0] else {
            panic!("expected paragraph");
        };
        assert!(content.iter().any(|i| matches!(
            i,
            Inline::Link { target: LinkTarget::Reference(label), .. } if label == "release-notes"
        )));
    }

    #[test]
    fn test_table() {
        let doc = parse("| a | b |\n|---|---|\n| 1 | 2 |\n");
        let Block::Table { header, rows } = &doc.blocks[0] else {
            panic!("expected table, got {:?}", doc.blocks[0]);
        };
        assert_eq!(header.len(), 2);
        assert_eq!(rows.len(), 1);
        assert_eq!(plain_text(&rows[0][1]), "2");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").blocks.is_empty());
    }
}
