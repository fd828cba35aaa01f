//! Renderers over the assembled document tree.

pub mod json;
pub mod markdown;

use crate::error::{DocError, Result};
use crate::model::Documentation;

/// Turns a document tree into text. Rendering never mutates the tree.
pub trait Renderer {
    fn render(&self, doc: &Documentation) -> Result<String>;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "markdown" | "md" => Ok(Box::new(markdown::MarkdownRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(DocError::UnknownFormat(format.to_string())),
    }
}
