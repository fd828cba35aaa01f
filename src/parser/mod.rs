//! Comment corpus parsing.

pub mod signature;
pub mod xml;

use crate::error::{DocError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub use xml::Corpus;

/// Corpus path for a module: same path, `.xml` extension.
pub fn corpus_path(module_path: &Path) -> PathBuf {
    module_path.with_extension("xml")
}

/// Read and parse the corpus that accompanies `module_path`.
pub fn load_corpus(module_path: &Path) -> Result<Corpus> {
    let path = corpus_path(module_path);
    let content = fs::read_to_string(&path).map_err(|e| DocError::CorpusUnreadable {
        path: path.clone(),
        message: e.to_string(),
    })?;
    xml::parse(&content, &path)
}
