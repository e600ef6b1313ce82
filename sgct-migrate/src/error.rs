//! Error types for the migration engine.

use sgct_config::{SchemaError, ValidationReport};
use thiserror::Error;

/// Convenience alias used throughout the engine.
pub type Result<T, E = MigrateError> = std::result::Result<T, E>;

/// A field did not have the shape the rules expect.
///
/// `path` is a dotted location such as `nodes[0].windows[1].pos`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{path}: {kind}")]
pub struct ShapeError {
    pub path: String,
    pub kind: ShapeErrorKind,
}

/// Enumerates the ways a field can be mis-shaped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeErrorKind {
    #[error("expected a single-element sequence, found {0}")]
    NotWrapped(&'static str),
    #[error("expected exactly one element, found {0}")]
    WrongLength(usize),
    #[error("expected {expected} elements, found {found}")]
    WrongCount { expected: usize, found: usize },
    #[error("expected a mapping, found {0}")]
    NotAMapping(&'static str),
    #[error("expected a scalar, found {0}")]
    NotAScalar(&'static str),
    #[error("expected a sequence, found {0}")]
    NotASequence(&'static str),
    #[error("`{0}` is not a number")]
    NotANumber(String),
    #[error("missing field `{0}`")]
    MissingField(String),
    #[error("identifier `{value}` does not match `{prefix}<number>`")]
    BadIdentifier { value: String, prefix: String },
}

impl ShapeError {
    pub(crate) fn new(path: impl Into<String>, kind: ShapeErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Prefix the path with the location of the enclosing mapping.
    pub(crate) fn within(mut self, parent: &str) -> Self {
        if !parent.is_empty() {
            self.path = if self.path.is_empty() {
                parent.to_string()
            } else {
                format!("{parent}.{}", self.path)
            };
        }
        self
    }
}

/// Errors that abort a conversion.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("shape error at {0}")]
    Shape(#[from] ShapeError),
    #[error("unrecognized configuration version `{0}`, only legacy files and version 1 are supported")]
    UnrecognizedVersion(String),
    #[error("{path}: ambiguous projection, found markers {markers:?}")]
    AmbiguousProjection {
        path: String,
        markers: Vec<&'static str>,
    },
    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("converted document does not match the schema: {0}")]
    Invalid(ValidationReport),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
