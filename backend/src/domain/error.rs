use log::error;

use crate::storage::StoreError;

/// Errors surfaced by the tracker's domain services.
///
/// Messages are written for display: callers can show `to_string()` as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackerError {
    /// The child or another referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    /// The record belongs to someone else. The message names nothing about it.
    #[error("You do not have permission to access this child.")]
    Unauthorized,

    /// The store needs an index that has not been provisioned yet
    #[error("{remediation}")]
    QueryConfiguration { remediation: String },

    /// Network or store failure; the caller may retry
    #[error("Temporary storage failure: {0}")]
    TransientIo(String),

    /// Rejected user input on the child and behavior forms
    #[error("{0}")]
    Validation(String),

    /// A stored record could not be read
    #[error("Stored data is malformed: {0}")]
    InvalidRecord(String),
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        TrackerError::Validation(message.into())
    }

    /// Only transient I/O is worth retrying without user action
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrackerError::TransientIo(_))
    }
}

impl From<StoreError> for TrackerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(path) => TrackerError::NotFound(format!("Record not found: {}", path)),
            StoreError::PermissionDenied => TrackerError::Unauthorized,
            StoreError::FailedPrecondition { index } => {
                error!("Store rejected a query: missing index {}", index);
                TrackerError::QueryConfiguration {
                    remediation: format!(
                        "This view needs a composite index on {}. Create the index in the \
                         document store's index configuration with the fields in exactly this \
                         order, then reload once it has finished building, which can take a \
                         few minutes.",
                        index
                    ),
                }
            }
            StoreError::Unavailable(reason) => TrackerError::TransientIo(reason),
            StoreError::InvalidDocument { path, reason } => {
                TrackerError::InvalidRecord(format!("{}: {}", path, reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CompositeIndex;

    #[test]
    fn test_missing_index_maps_to_query_configuration() {
        let err: TrackerError = StoreError::FailedPrecondition {
            index: CompositeIndex::new("behaviors", &["childId", "parentId", "timestamp"]),
        }
        .into();

        match &err {
            TrackerError::QueryConfiguration { remediation } => {
                assert!(remediation.contains("'behaviors' (childId, parentId, timestamp)"));
            }
            other => panic!("expected QueryConfiguration, got {:?}", other),
        }
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_store_failures_keep_their_kind() {
        assert_eq!(TrackerError::from(StoreError::PermissionDenied), TrackerError::Unauthorized);

        let transient = TrackerError::from(StoreError::Unavailable("timeout".to_string()));
        assert_eq!(transient, TrackerError::TransientIo("timeout".to_string()));
        assert!(transient.is_retryable());

        assert!(matches!(
            TrackerError::from(StoreError::NotFound("children/x".to_string())),
            TrackerError::NotFound(_)
        ));
    }

    #[test]
    fn test_unauthorized_message_is_generic() {
        let message = TrackerError::Unauthorized.to_string();
        assert!(!message.contains("child::"));
        assert_eq!(message, "You do not have permission to access this child.");
    }
}
