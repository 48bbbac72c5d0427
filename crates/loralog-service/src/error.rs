use loralog_store::StoreError;

/// Errors returned to query callers.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The requested limit is not a positive integer.
    #[error("limit must be a positive integer (got {0})")]
    InvalidLimit(i64),

    /// The store could not serve the read.
    #[error("query failed: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, QueryError>;
