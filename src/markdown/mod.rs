// src/markdown/mod.rs
pub mod block;
pub mod parser;

pub use block::{plain_text, Block, Document, Field, Inline, LinkDef, LinkTable, LinkTarget, ListItem, Scalar};
pub use parser::parse;
