use std::path::PathBuf;
use thiserror::Error;

use crate::types::Operation;

pub type Result<T> = std::result::Result<T, BindingError>;

#[derive(Debug, Error)]
pub enum BindingError {
    /// The fragment or selection source was not valid GraphQL against the
    /// bound schema, or contained no fragment definition where one was
    /// required.
    #[error("Failed to parse fragment: {0}")]
    Parse(String),

    /// A requested field does not exist on the type it was looked up on.
    #[error("Field '{field}' not found on type '{type_name}'")]
    FieldNotFound { field: String, type_name: String },

    /// The schema declares no root type for the requested operation kind.
    #[error("Schema has no root type for {0} operations")]
    MissingRootType(Operation),

    /// A filter-schema file path does not reference an existing file.
    #[error("No schema found for path: {}", .0.display())]
    SchemaNotFound(PathBuf),

    /// Failures from the external delegation capability or the before
    /// hook, passed through unmodified.
    #[error(transparent)]
    Delegate(#[from] anyhow::Error),
}
