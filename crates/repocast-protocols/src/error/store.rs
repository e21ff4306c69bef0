//! Settings store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = StoreError::NotFound("cron setting 'collect'".to_string());
        let display = err.to_string();
        assert!(display.contains("Not found"));
        assert!(display.contains("collect"));
    }

    #[test]
    fn test_invalid_input_error() {
        let err = StoreError::InvalidInput("name cannot be empty".to_string());
        assert!(err.to_string().contains("name cannot be empty"));
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let err = StoreError::from(json_err);
        assert!(matches!(err, StoreError::SerializationError(_)));
    }

    #[test]
    fn test_all_error_variants() {
        let errors: Vec<StoreError> = vec![
            StoreError::NotFound("a".to_string()),
            StoreError::InvalidInput("b".to_string()),
            StoreError::StorageError("c".to_string()),
            StoreError::QueryError("d".to_string()),
            StoreError::SerializationError("e".to_string()),
            StoreError::ConnectionError("f".to_string()),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
