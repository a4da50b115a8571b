// src/render/terminal.rs

//! Renders a [`Document`] as text for a terminal.
//!
//! Output keeps a markdown-ish shape (`#` heading prefixes, `*` bullets, indented
//! code) and layers ANSI styling on top via owo-colors:
//!
//! - headings are **bold**: magenta + underlined at depth 1, green below that
//! - inline code and code blocks are yellow
//! - links are blue + underlined, shown after their text
//! - block quotes are gray italic
//!
//! With colors off the same layout is produced with no escape codes.

use std::io::IsTerminal;

use owo_colors::{OwoColorize, Style};

use crate::markdown::{plain_text, Block, Document, Inline, LinkTable, LinkTarget, ListItem};

/// Whether ANSI styling is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Color when stdout is a terminal and `NO_COLOR` is unset
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn enabled(self) -> bool {
        match self {
            ColorMode::Auto => std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal(),
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererOptions {
    /// Spaces used for each level of indentation
    pub tab: usize,
    /// Target line width for rules and reflowed paragraphs
    pub width: usize,
    /// Re-wrap paragraph text to `width`
    pub reflow: bool,
    pub colors: ColorMode,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            tab: 2,
            width: 80,
            reflow: false,
            colors: ColorMode::Auto,
        }
    }
}

/// Renders `document`, resolving reference links against its link table.
pub fn render(document: &Document, options: &RendererOptions) -> String {
    let renderer = TerminalRenderer {
        options,
        links: &document.links,
        colors: options.colors.enabled(),
    };
    renderer.blocks(&document.blocks, options.width, "\n\n")
}

struct TerminalRenderer<'a> {
    options: &'a RendererOptions,
    links: &'a LinkTable,
    colors: bool,
}

impl TerminalRenderer<'_> {
    fn paint(&self, text: &str, style: Style) -> String {
        if self.colors {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn indent(&self, text: &str) -> String {
        let pad = " ".repeat(self.options.tab);
        text.lines()
            .map(|line| if line.is_empty() { String::new() } else { format!("{}{}", pad, line) })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn blocks(&self, blocks: &[Block], width: usize, separator: &str) -> String {
        blocks
            .iter()
            .map(|block| self.block(block, width))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn block(&self, block: &Block, width: usize) -> String {
        match block {
            Block::Heading { depth, content } => {
                let text = format!("{} {}", "#".repeat(usize::from(*depth)), self.inlines(content));
                let style = if *depth == 1 {
                    Style::new().magenta().underline().bold()
                } else {
                    Style::new().green().bold()
                };
                self.paint(&text, style)
            }
            Block::Paragraph { content } => {
                let text = self.inlines(content);
                if self.options.reflow {
                    textwrap::fill(&text, width.max(1))
                } else {
                    text
                }
            }
            Block::List { ordered, start, items } => {
                let first = start.unwrap_or(1);
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        let marker = if *ordered {
                            format!("{}.", first + idx as u64)
                        } else {
                            "*".to_string()
                        };
                        self.list_item(&marker, item, width)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Block::Code { text, .. } => {
                let style = Style::new().yellow();
                let painted = text
                    .lines()
                    .map(|line| self.paint(line, style))
                    .collect::<Vec<_>>()
                    .join("\n");
                self.indent(&painted)
            }
            Block::BlockQuote { blocks } => {
                let inner = self.blocks(blocks, width.saturating_sub(self.options.tab), "\n\n");
                let style = Style::new().bright_black().italic();
                let painted = inner
                    .lines()
                    .map(|line| self.paint(line, style))
                    .collect::<Vec<_>>()
                    .join("\n");
                self.indent(&painted)
            }
            Block::Html { text } => text.clone(),
            Block::Table { header, rows } => self.table(header, rows),
            Block::Rule => "-".repeat(width),
        }
    }

    fn list_item(&self, marker: &str, item: &ListItem, width: usize) -> String {
        let task = match item.task {
            Some(true) => "[x] ",
            Some(false) => "[ ] ",
            None => "",
        };
        let body = self.blocks(&item.blocks, width.saturating_sub(self.options.tab), "\n");
        let mut lines = body.lines();
        let head = format!("{} {}{}", marker, task, lines.next().unwrap_or_default());
        let rest: Vec<&str> = lines.collect();
        if rest.is_empty() {
            head
        } else {
            format!("{}\n{}", head, self.indent(&rest.join("\n")))
        }
    }

    fn table(&self, header: &[Vec<Inline>], rows: &[Vec<Vec<Inline>>]) -> String {
        let header: Vec<String> = header.iter().map(|cell| self.inlines(cell)).collect();
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|cell| self.inlines(cell)).collect())
            .collect();

        let columns = rows.iter().map(Vec::len).chain([header.len()]).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in rows.iter().chain([&header]) {
            for (idx, cell) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(textwrap::core::display_width(cell));
            }
        }

        let line = |cells: &[String]| -> String {
            widths
                .iter()
                .enumerate()
                .map(|(idx, w)| {
                    let cell = cells.get(idx).map(String::as_str).unwrap_or("");
                    let pad = w.saturating_sub(textwrap::core::display_width(cell));
                    format!("{}{}", cell, " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let bold_header: Vec<String> = header
            .iter()
            .map(|cell| self.paint(cell, Style::new().bold()))
            .collect();
        let mut out = vec![
            line(bold_header.as_slice()),
            widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"),
        ];
        out.extend(rows.iter().map(|row| line(row.as_slice())));
        out.join("\n")
    }

    fn inlines(&self, inlines: &[Inline]) -> String {
        inlines.iter().map(|inline| self.inline(inline)).collect()
    }

    fn inline(&self, inline: &Inline) -> String {
        match inline {
            Inline::Text(text) | Inline::Html(text) => text.clone(),
            Inline::Code(code) => self.paint(code, Style::new().yellow()),
            Inline::Emphasis(children) => self.paint(&self.inlines(children), Style::new().italic()),
            Inline::Strong(children) => self.paint(&self.inlines(children), Style::new().bold()),
            Inline::Strikethrough(children) => {
                self.paint(&self.inlines(children), Style::new().dimmed().strikethrough())
            }
            Inline::Link { target, children, .. } => {
                let text = self.inlines(children);
                let Some(href) = self.resolve(target) else {
                    return format!("[{}]", text);
                };
                let link = self.paint(href, Style::new().blue().underline());
                if plain_text(children) == href || children.is_empty() {
                    link
                } else {
                    format!("{} ({})", text, link)
                }
            }
            Inline::Image { target, alt } => {
                let href = self.resolve(target).unwrap_or_default();
                self.paint(&format!("![{}]({})", plain_text(alt), href), Style::new().dimmed())
            }
            Inline::SoftBreak => {
                if self.options.reflow {
                    " ".to_string()
                } else {
                    "\n".to_string()
                }
            }
            Inline::HardBreak => "\n".to_string(),
        }
    }

    fn resolve<'t>(&'t self, target: &'t LinkTarget) -> Option<&'t str> {
        match target {
            LinkTarget::Url(url) => Some(url.as_str()),
            LinkTarget::Reference(label) => self.links.get(label).map(|def| def.href.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{parse, LinkDef};

    fn plain() -> RendererOptions {
        RendererOptions {
            colors: ColorMode::Never,
            ..RendererOptions::default()
        }
    }

    #[test]
    fn test_default_options() {
        let options = RendererOptions::default();
        assert_eq!(options.tab, 2);
        assert_eq!(options.colors, ColorMode::Auto);
        assert!(!options.reflow);
    }

    #[test]
    fn test_plain_layout() {
        let doc = parse("## 2.0.0\n\nSome **bold** text.\n\n- one\n- two\n\n```\nlet x = 1;\n```\n");
        assert_eq!(
            render(&doc, &plain()),
            "## 2.0.0\n\nSome bold text.\n\n* one\n* two\n\n  let x = 1;"
        );
    }

    #[test]
    fn test_ordered_and_task_lists() {
        let doc = parse("3. three\n4. four\n\n- [x] done\n- [ ] todo\n");
        assert_eq!(render(&doc, &plain()), "3. three\n4. four\n\n* [x] done\n* [ ] todo");
    }

    #[test]
    fn test_nested_list_indented_by_tab() {
        let doc = parse("- parent\n  - child\n");
        let options = RendererOptions { tab: 4, ..plain() };
        assert_eq!(render(&doc, &options), "* parent\n    * child");
    }

    #[test]
    fn test_links_show_destination() {
        let doc = parse("See [docs](https://example.com) or <https://example.org>.\n");
        assert_eq!(
            render(&doc, &plain()),
            "See docs (https://example.com) or https://example.org."
        );
    }

    #[test]
    fn test_reference_resolved_from_merged_table() {
        let mut doc = parse("Read the [notes].\n");
        assert_eq!(render(&doc, &plain()), "Read the [notes].");

        doc.links.insert("notes", LinkDef { href: "https://example.com/notes".into(), title: None });
        assert_eq!(render(&doc, &plain()), "Read the notes (https://example.com/notes).");
    }

    #[test]
    fn test_rule_and_quote() {
        let doc = parse("> quoted\n\n---\n");
        let options = RendererOptions { width: 5, ..plain() };
        assert_eq!(render(&doc, &options), "  quoted\n\n-----");
    }

    #[test]
    fn test_reflow_wraps_paragraphs() {
        let doc = parse("alpha beta gamma delta\n");
        let options = RendererOptions { width: 11, reflow: true, ..plain() };
        assert_eq!(render(&doc, &options), "alpha beta\ngamma delta");
    }

    #[test]
    fn test_table() {
        let doc = parse("| name | v |\n|---|---|\n| a | 10 |\n");
        assert_eq!(render(&doc, &plain()), "name | v\n-----+---\na    | 10");
    }

    #[test]
    fn test_colors_always_emits_escapes() {
        let doc = parse("# Title\n\nuse `code`\n");
        let options = RendererOptions { colors: ColorMode::Always, ..RendererOptions::default() };
        let out = render(&doc, &options);
        assert!(out.contains("\u{1b}["));
        assert!(out.contains("Title"));
    }
}
