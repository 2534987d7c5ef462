//! Error types for checkout sequencing.

use thiserror::Error;

/// Errors raised while building a checkout sequence.
///
/// These are construction-time failures: they are returned before any
/// directive is produced. Command failures inside the sandbox are never
/// represented here; they are signalled through the `assert` flag on each
/// directive and surface at execution time.
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("missing required checkout field: {0}")]
    MissingField(&'static str),

    #[error("{field} must not start with '-': {value:?}")]
    OptionLikeValue { field: &'static str, value: String },

    #[error("invalid fetch depth: {0} (must be a positive integer)")]
    InvalidFetchDepth(u32),

    #[error("source key is not valid base64: {0}")]
    InvalidSourceKey(#[from] base64::DecodeError),

    #[error("invalid trusted host: {0:?}")]
    InvalidTrustedHost(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for checkout sequencing.
pub type Result<T> = std::result::Result<T, CheckoutError>;
