//! Error taxonomy for documentation builds.
//!
//! Local conditions (`MalformedEntry`, `MemberNotFound`, incidental
//! `ModuleLoad`) are absorbed where they are detected. Everything that
//! reaches the caller of a build is wrapped in [`DocError::Build`].

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("malformed entry '{id}': {reason}")]
    MalformedEntry { id: String, reason: String },

    #[error("unable to find type {full_name}")]
    TypeResolutionFailed { full_name: String },

    #[error("no member {owner}.{member}({}) matches", parameters.join(","))]
    MemberNotFound {
        owner: String,
        member: String,
        parameters: Vec<String>,
    },

    #[error("comment corpus {} is unreadable: {message}", path.display())]
    CorpusUnreadable { path: PathBuf, message: String },

    #[error("failed to load module {}: {message}", path.display())]
    ModuleLoad { path: PathBuf, message: String },

    #[error("unknown format: {0}. Use markdown or json")]
    UnknownFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unable to build documentation for '{}': {source}", path.display())]
    Build {
        path: PathBuf,
        #[source]
        source: Box<DocError>,
    },
}

impl DocError {
    /// Wrap a fatal cause with the subject module path.
    pub fn build(path: impl Into<PathBuf>, source: DocError) -> Self {
        match source {
            already @ DocError::Build { .. } => already,
            other => DocError::Build {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// Innermost cause, looking through any `Build` wrapper.
    pub fn root(&self) -> &DocError {
        match self {
            DocError::Build { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, DocError>;
