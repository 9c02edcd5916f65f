use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FlattenError>;

/// Errors raised while planning sheets or flattening records.
///
/// All variants are fatal: they indicate malformed input or a schema/data
/// shape the converter does not handle, so no partial sheet set is produced.
#[derive(Error, Debug)]
pub enum FlattenError {
    /// Contradictory or incomplete configuration, including a
    /// `root_list_path` that does not lead to a record sequence.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A `$ref` pointer that cannot be resolved within the document.
    #[error("unresolvable reference: {0}")]
    Reference(String),

    /// A schema type set or runtime value the converter does not handle.
    #[error("unsupported type at '{path}': {found}")]
    UnsupportedType { path: String, found: String },

    /// An array element contains the scalar-array join delimiter, which
    /// would make the joined cell ambiguous on reconstruction. Only raised
    /// under [`DelimiterPolicy::Reject`](crate::flatten::DelimiterPolicy).
    #[error("value at '{path}' contains the array delimiter '{delimiter}'")]
    DelimiterCollision { path: String, delimiter: char },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
