use thiserror::Error;

use crate::validate::SchemaPath;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The schema breaks a structural rule at `path`.
    #[error("malformed schema at `{0}`: {1}")]
    Malformed(SchemaPath, String),

    /// The document is not shaped like a schema at all (wrong JSON types).
    #[error("invalid schema document at JSON path {path}: {message}")]
    Document { path: String, message: String },
}

impl SchemaError {
    pub fn malformed(path: &SchemaPath, reason: impl Into<String>) -> Self {
        SchemaError::Malformed(path.clone(), reason.into())
    }

    pub fn path(&self) -> Option<&SchemaPath> {
        match self {
            SchemaError::Malformed(path, _) => Some(path),
            SchemaError::Document { .. } => None,
        }
    }
}
