//! Error types for the event scheduler

use thiserror::Error;

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, QueueError>;

/// Errors that can occur in the calendar queue
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueueError {
    /// Top or pop on an empty queue
    #[error("operation on empty calendar queue")]
    Empty,

    /// Invalid construction parameter
    #[error("invalid queue parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Internal invariant broken; indicates a bug, not a caller error
    #[error("calendar queue invariant violated: {reason}")]
    InvariantViolation {
        /// Reason for the violation
        reason: String,
    },
}

impl QueueError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create an invariant violation error
    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = QueueError::invalid_parameter("bucket_count", "0", "> 0");
        assert!(matches!(err, QueueError::InvalidParameter { .. }));

        let err = QueueError::invariant("scan found no event");
        assert!(matches!(err, QueueError::InvariantViolation { .. }));
    }

    #[test]
    fn test_error_display() {
        let msg = format!("{}", QueueError::Empty);
        assert!(msg.contains("empty"));

        let msg = format!("{}", QueueError::invalid_parameter("width", "0", "> 0.0"));
        assert!(msg.contains("width"));
        assert!(msg.contains("> 0.0"));
    }
}
