//! Error types for taskrank
//!
//! Centralized error handling using thiserror. Validation failures get their
//! own enum so callers can tell a rejected mutation apart from storage trouble.

use thiserror::Error;

/// All error types that can occur in taskrank
#[derive(Debug, Error)]
pub enum TaskrankError {
    /// Snapshot or input rejected before any scoring happened
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Task not found in storage
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a task snapshot or a requested mutation is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid priority value {0}: must be between 0 and 100")]
    PriorityOutOfRange(i32),

    #[error("invalid bump count {0}: must not be negative")]
    NegativeBumpCount(i32),

    #[error("unknown status '{0}'")]
    UnknownStatus(String),

    #[error("unknown effort '{0}'")]
    UnknownEffort(String),

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("cannot move task {id} from {from} to {to}")]
    InvalidTransition { id: String, from: String, to: String },
}

/// Result type alias for taskrank operations
pub type Result<T> = std::result::Result<T, TaskrankError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_not_found_error() {
        let err = TaskrankError::TaskNotFound("001".to_string());
        assert_eq!(err.to_string(), "Task not found: 001");
    }

    #[test]
    fn test_storage_error() {
        let err = TaskrankError::Storage("file locked".to_string());
        assert_eq!(err.to_string(), "Storage error: file locked");
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: TaskrankError = ValidationError::PriorityOutOfRange(150).into();
        assert!(matches!(err, TaskrankError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation failed: invalid priority value 150: must be between 0 and 100"
        );
    }

    #[test]
    fn test_negative_bump_count_message() {
        let err = ValidationError::NegativeBumpCount(-2);
        assert_eq!(err.to_string(), "invalid bump count -2: must not be negative");
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = ValidationError::InvalidTransition {
            id: "t1".to_string(),
            from: "done".to_string(),
            to: "in_progress".to_string(),
        };
        assert_eq!(err.to_string(), "cannot move task t1 from done to in_progress");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TaskrankError = io_err.into();
        assert!(matches!(err, TaskrankError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: TaskrankError = json_err.into();
        assert!(matches!(err, TaskrankError::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(ValidationError::EmptyTitle.into())
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
