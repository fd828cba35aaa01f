//! JSON renderer: the document tree as structured output for tooling.
//!
//! Resolved descriptors are skipped; signatures, argument tables and
//! normalized text are all carried on the nodes themselves.

use crate::error::Result;
use crate::model::Documentation;
use crate::render::Renderer;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, doc: &Documentation) -> Result<String> {
        let mut out = serde_json::to_string_pretty(doc)?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
