//! Error types for the record facade.

use thiserror::Error;

/// Broad category of a [`RecordError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Construction,
    Validation,
    Schema,
    State,
    Consistency,
    Store,
}

/// Main error type for facade and store operations.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Unsupported construction input; no facade was built.
    #[error("[RecordFacade::construct] {reason}")]
    Construction { reason: String },

    /// Missing or empty field name, or a null field value.
    #[error("[{operation}] {message}")]
    Validation {
        operation: &'static str,
        message: String,
    },

    /// Field not defined on the bound table, or a field type mismatch.
    #[error("[{operation}] {message}")]
    Schema {
        operation: &'static str,
        message: String,
    },

    /// Operation attempted in an illegal lifecycle state.
    #[error("[{operation}] {message}")]
    State {
        operation: &'static str,
        message: String,
    },

    /// A row the facade relies on is missing from the store.
    #[error("[{operation}] {message}")]
    Consistency {
        operation: &'static str,
        message: String,
    },

    /// Failure raised by the store implementation itself.
    #[error("Store error: {0}")]
    Store(String),
}

impl RecordError {
    pub(crate) fn construction(reason: impl Into<String>) -> Self {
        RecordError::Construction {
            reason: reason.into(),
        }
    }

    pub(crate) fn validation(operation: &'static str, message: impl Into<String>) -> Self {
        RecordError::Validation {
            operation,
            message: message.into(),
        }
    }

    pub(crate) fn schema(operation: &'static str, message: impl Into<String>) -> Self {
        RecordError::Schema {
            operation,
            message: message.into(),
        }
    }

    pub(crate) fn state(operation: &'static str, message: impl Into<String>) -> Self {
        RecordError::State {
            operation,
            message: message.into(),
        }
    }

    pub(crate) fn consistency(operation: &'static str, message: impl Into<String>) -> Self {
        RecordError::Consistency {
            operation,
            message: message.into(),
        }
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordError::Construction { .. } => ErrorKind::Construction,
            RecordError::Validation { .. } => ErrorKind::Validation,
            RecordError::Schema { .. } => ErrorKind::Schema,
            RecordError::State { .. } => ErrorKind::State,
            RecordError::Consistency { .. } => ErrorKind::Consistency,
            RecordError::Store(_) => ErrorKind::Store,
        }
    }
}

impl From<std::io::Error> for RecordError {
    fn from(e: std::io::Error) -> Self {
        RecordError::Store(e.to_string())
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(e: serde_json::Error) -> Self {
        RecordError::Store(e.to_string())
    }
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_carries_operation() {
        let err = RecordError::schema(
            "RecordFacade::set_value",
            "\"missing\" is not a valid field name for table \"task\"",
        );
        assert_eq!(
            err.to_string(),
            "[RecordFacade::set_value] \"missing\" is not a valid field name for table \"task\""
        );
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_io_error_maps_to_store() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RecordError = io.into();
        assert_eq!(err.kind(), ErrorKind::Store);
    }
}
