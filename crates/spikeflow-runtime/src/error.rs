//! Error types for the simulation runtime

use thiserror::Error;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur in the simulation runtime
///
/// [`RuntimeError::IndexOutOfRange`] is the only recoverable user-facing
/// category; the failed operation has no effect. The remaining categories
/// indicate a configuration mistake or a bug.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Scheduler layer error
    #[error("scheduler error: {source}")]
    Queue {
        #[from]
        /// Source queue error
        source: spikeflow_core::QueueError,
    },

    /// Synapse endpoint or scheduled-spike target exceeds the network size
    #[error("neuron index {index} out of range for network of size {size}")]
    IndexOutOfRange {
        /// Offending neuron index
        index: u32,
        /// Network size at the time of the call
        size: usize,
    },

    /// Invalid parameter value
    #[error("invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Simulation invariant broken; fatal
    #[error("simulation invariant violated: {reason}")]
    InvariantViolation {
        /// Reason for the violation
        reason: String,
    },
}

impl RuntimeError {
    /// Create an index out of range error
    pub fn index_out_of_range(index: u32, size: usize) -> Self {
        Self::IndexOutOfRange { index, size }
    }

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
        let err = RuntimeError::index_out_of_range(5, 2);
        assert!(matches!(err, RuntimeError::IndexOutOfRange { .. }));

        let err = RuntimeError::invalid_parameter("tau_m", "0.0", "> 0.0");
        assert!(matches!(err, RuntimeError::InvalidParameter { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = RuntimeError::index_out_of_range(5, 2);
        let msg = format!("{}", err);
        assert!(msg.contains("index 5"));
        assert!(msg.contains("size 2"));
    }

    #[test]
    fn test_queue_error_conversion() {
        let err: RuntimeError = spikeflow_core::QueueError::Empty.into();
        assert!(matches!(err, RuntimeError::Queue { .. }));
    }
}
