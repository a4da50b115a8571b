// src/render/mod.rs
pub mod terminal;

pub use terminal::{render, ColorMode, RendererOptions};
