use super::document::CompositeIndex;

/// Failures reported by a document store backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Permission denied")]
    PermissionDenied,

    /// The query needs a composite index that has not been provisioned
    #[error("The query requires an index on {index}")]
    FailedPrecondition { index: CompositeIndex },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid document {path}: {reason}")]
    InvalidDocument { path: String, reason: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
