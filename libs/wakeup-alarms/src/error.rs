//! Alarm Core Error Types

use thiserror::Error;

/// Result type for alarm operations
pub type Result<T> = std::result::Result<T, AlarmError>;

/// Alarm core errors
#[derive(Debug, Error)]
pub enum AlarmError {
    /// Alarm not found
    #[error("Alarm not found: {0}")]
    AlarmNotFound(i64),

    /// History entry not found
    #[error("Alarm history not found: {0}")]
    HistoryNotFound(i64),

    /// Request data violates a model invariant
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl AlarmError {
    /// Whether the error names a record that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AlarmError::AlarmNotFound(_) | AlarmError::HistoryNotFound(_)
        )
    }
}

impl From<sqlx::Error> for AlarmError {
    fn from(err: sqlx::Error) -> Self {
        AlarmError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for AlarmError {
    fn from(err: serde_json::Error) -> Self {
        AlarmError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(AlarmError::AlarmNotFound(7).to_string(), "Alarm not found: 7");
        assert!(AlarmError::InvalidInput("repeat_days".into())
            .to_string()
            .starts_with("Invalid input"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(AlarmError::AlarmNotFound(1).is_not_found());
        assert!(AlarmError::HistoryNotFound(1).is_not_found());
        assert!(!AlarmError::DatabaseError("locked".into()).is_not_found());
    }
}
