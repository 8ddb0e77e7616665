//! Error types for QPLUG
//!
//! Gantree: L0_Foundation → Errors
//!
//! Every failure is raised synchronously at the point of violation and
//! propagated to the caller. Nothing in the workspace retries.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Backend label used when an operation is attempted without a live engine
pub const NO_ENGINE: &str = "unallocated";

/// Main error type for QPLUG
/// Gantree: QplugError // enum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QplugError {
    // ========================================================================
    // Capability Errors
    // ========================================================================
    /// Gate or observable outside the session's effective catalog, or a gate
    /// applied while no engine is allocated
    #[error("Operation '{gate}' is not supported by the {backend} backend")]
    UnsupportedOperation { gate: String, backend: String },

    /// No estimation rule for this observable/backend pair
    #[error("Estimation of expectation values not implemented for observable '{observable}' on the {backend} backend")]
    EstimationNotImplemented { observable: String, backend: String },

    /// Second measurement on a single-measurement backend
    #[error("Only a single measurement is possible on the {backend} backend")]
    MultipleMeasurement { backend: String },

    /// Unrecognized backend selector
    #[error("Unknown backend '{0}'")]
    UnknownBackend(String),

    // ========================================================================
    // Parameter Errors
    // ========================================================================
    /// Symbolic parameter reference past the supplied values
    #[error("Parameter reference p{index} is unbound: only {available} value(s) supplied")]
    UnboundParameter { index: usize, available: usize },

    /// Parameter value outside the descriptor's domain
    #[error("Invalid value {value} for parameter {position} of '{gate}': {reason}")]
    InvalidParameter {
        gate: String,
        position: usize,
        value: f64,
        reason: String,
    },

    // ========================================================================
    // Circuit Errors
    // ========================================================================
    /// Malformed command (arity, parameter count, repeated qubits)
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Qubit index out of range
    #[error("Qubit {qubit} out of range: register holds {max} qubit(s)")]
    QubitOutOfRange { qubit: usize, max: usize },

    /// Declared output without a recorded estimate
    #[error("No result recorded for output qubit {qubit}")]
    MissingOutput { qubit: usize },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Execution attempted while another pass is running on the same session
    #[error("A circuit execution is already in progress on this session")]
    ExecutionInProgress,

    /// Engine released while qubits are still in superposition
    #[error("{count} qubit(s) still hold quantum state and must be measured before release")]
    UnmeasuredQubits { count: usize },

    /// Engine-level failure
    #[error("Backend error: {0}")]
    BackendError(String),

    // ========================================================================
    // Configuration / I/O Errors
    // ========================================================================
    /// Invalid plugin configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Result type alias for QPLUG operations
/// Gantree: QplugResult<T> // type alias
pub type QplugResult<T> = Result<T, QplugError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for QplugError {
    fn from(err: serde_json::Error) -> Self {
        QplugError::JsonError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl QplugError {
    /// Unsupported operation on a named backend
    pub fn unsupported(gate: impl Into<String>, backend: impl Into<String>) -> Self {
        QplugError::UnsupportedOperation {
            gate: gate.into(),
            backend: backend.into(),
        }
    }

    /// Operation attempted while no engine is allocated
    pub fn no_engine(gate: impl Into<String>) -> Self {
        Self::unsupported(gate, NO_ENGINE)
    }

    /// Check if error reports a capability gap
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            QplugError::UnsupportedOperation { .. }
                | QplugError::EstimationNotImplemented { .. }
                | QplugError::UnknownBackend(_)
        )
    }

    /// Check if error is a parameter error
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            QplugError::UnboundParameter { .. } | QplugError::InvalidParameter { .. }
        )
    }

    /// Check if the session must be reset before reuse
    pub fn requires_reset(&self) -> bool {
        !matches!(
            self,
            QplugError::UnknownBackend(_) | QplugError::ConfigError(_) | QplugError::JsonError(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display() {
        let err = QplugError::unsupported("Toffoli", "Simulator");
        assert!(err.to_string().contains("Toffoli"));
        assert!(err.to_string().contains("Simulator"));
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_no_engine() {
        let err = QplugError::no_engine("Rx");
        assert_eq!(
            err,
            QplugError::UnsupportedOperation {
                gate: "Rx".into(),
                backend: NO_ENGINE.into()
            }
        );
    }

    #[test]
    fn test_unbound_parameter() {
        let err = QplugError::UnboundParameter {
            index: 3,
            available: 2,
        };
        assert!(err.to_string().contains("p3"));
        assert!(err.is_parameter_error());
        assert!(!err.is_unsupported());
    }

    #[test]
    fn test_requires_reset() {
        assert!(QplugError::MultipleMeasurement {
            backend: "RemoteBackend".into()
        }
        .requires_reset());
        assert!(!QplugError::UnknownBackend("bogus".into()).requires_reset());
    }

    #[test]
    fn test_json_conversion() {
        let err: QplugError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, QplugError::JsonError(_)));
    }
}
