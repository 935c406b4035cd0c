//! Store error handling
//!
//! Typed errors for gateway operations. Read failures are never fatal to a
//! view: callers keep their previous page state. Write failures are surfaced
//! and may be retried by resubmitting.

use thiserror::Error;
use uuid::Uuid;

/// Errors from the bookmark store gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Could not reach the store backend
    #[error("Store connection failed: {0}")]
    Connection(String),

    /// The store rejected or failed a query
    #[error("Store query failed: {0}")]
    Query(String),

    /// The access policy refused the operation outright
    #[error("Access denied by the store's row policy")]
    AccessDenied,

    /// The referenced row does not exist
    #[error("No row with id {id}")]
    NotFound { id: Uuid },

    /// The change-notification feed could not be opened
    #[error("Change feed unavailable: {0}")]
    Subscribe(String),
}

impl StoreError {
    /// Whether resubmitting the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Connection(_) | StoreError::Query(_) | StoreError::Subscribe(_)
        )
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(StoreError::Connection("refused".to_string()).is_retryable());
        assert!(StoreError::Query("timeout".to_string()).is_retryable());
        assert!(!StoreError::AccessDenied.is_retryable());
        assert!(!StoreError::NotFound { id: Uuid::nil() }.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::Connection("connection refused".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Store connection failed"));
        assert!(msg.contains("connection refused"));
    }
}
