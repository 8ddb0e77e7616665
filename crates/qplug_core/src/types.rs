//! Core types for QPLUG
//!
//! Gantree: L0_Foundation → CoreTypes
//!
//! Type aliases, parameter references, and the estimate value shared by
//! the descriptor model, the engines, and the session layer.

use crate::error::{QplugError, QplugResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Qubit identifier (0-indexed)
pub type QubitId = usize;

/// Rotation angle in radians
pub type Angle = f64;

/// Parameter vector supplied at execution time
pub type ParamVec = Vec<f64>;

// ============================================================================
// Parameters
// ============================================================================

/// Positional reference into the parameter slice supplied at call time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParRef(pub usize);

impl ParRef {
    /// Referenced position
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ParRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Gate parameter: a literal or a symbolic reference
/// Gantree: Parameter // Literal | Ref
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    /// Fixed value
    Literal(f64),
    /// Resolved against the caller's values
    Ref(ParRef),
}

impl Parameter {
    /// Substitute against the supplied values
    pub fn resolve(&self, values: &[f64]) -> QplugResult<f64> {
        match self {
            Parameter::Literal(v) => Ok(*v),
            Parameter::Ref(r) => values
                .get(r.index())
                .copied()
                .ok_or(QplugError::UnboundParameter {
                    index: r.index(),
                    available: values.len(),
                }),
        }
    }

    /// Referenced position, if symbolic
    pub fn par_ref(&self) -> Option<ParRef> {
        match self {
            Parameter::Ref(r) => Some(*r),
            Parameter::Literal(_) => None,
        }
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Literal(value)
    }
}

impl From<ParRef> for Parameter {
    fn from(r: ParRef) -> Self {
        Parameter::Ref(r)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Literal(v) => write!(f, "{}", v),
            Parameter::Ref(r) => write!(f, "{}", r),
        }
    }
}

// ============================================================================
// Descriptor Metadata
// ============================================================================

/// Domain accepted by a descriptor's parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParamDomain {
    /// Any finite real number
    #[default]
    Real,
    /// Finite whole numbers
    Integer,
}

impl ParamDomain {
    /// Check a substituted value against the domain
    pub fn check(&self, gate: &str, position: usize, value: f64) -> QplugResult<()> {
        let reason = if !value.is_finite() {
            Some("must be finite")
        } else if *self == ParamDomain::Integer && value.fract() != 0.0 {
            Some("must be a whole number")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(QplugError::InvalidParameter {
                gate: gate.to_string(),
                position,
                value,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Gradient recipe tag carried for the host framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GradMethod {
    /// Finite differences
    #[default]
    Finite,
    /// Parameter-shift style analytic gradient
    Analytic,
    /// Not differentiable
    NotDifferentiable,
}

/// Single-qubit Pauli operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Pauli-X
    X,
    /// Pauli-Y
    Y,
    /// Pauli-Z
    Z,
}

impl Pauli {
    /// Short name
    pub fn name(&self) -> &'static str {
        match self {
            Pauli::X => "X",
            Pauli::Y => "Y",
            Pauli::Z => "Z",
        }
    }
}

// ============================================================================
// Estimate
// ============================================================================

/// Expectation value and variance returned for an observable
/// Gantree: Estimate // Single | PerQubit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Estimate {
    /// One observable on one target
    Single {
        /// Expectation value
        value: f64,
        /// Variance estimate
        variance: f64,
    },
    /// Parallel per-qubit sequences (composite "all qubits" observables)
    PerQubit {
        /// Expectation value per qubit, register order
        values: Vec<f64>,
        /// Variance per qubit, register order
        variances: Vec<f64>,
    },
}

impl Estimate {
    /// Create a single estimate
    pub fn single(value: f64, variance: f64) -> Self {
        Estimate::Single { value, variance }
    }

    /// Scalar expectation value, if single
    pub fn value(&self) -> Option<f64> {
        match self {
            Estimate::Single { value, .. } => Some(*value),
            Estimate::PerQubit { .. } => None,
        }
    }

    /// Scalar variance, if single
    pub fn variance(&self) -> Option<f64> {
        match self {
            Estimate::Single { variance, .. } => Some(*variance),
            Estimate::PerQubit { .. } => None,
        }
    }

    /// All expectation values in order
    pub fn values(&self) -> Vec<f64> {
        match self {
            Estimate::Single { value, .. } => vec![*value],
            Estimate::PerQubit { values, .. } => values.clone(),
        }
    }

    /// All variances in order
    pub fn variances(&self) -> Vec<f64> {
        match self {
            Estimate::Single { variance, .. } => vec![*variance],
            Estimate::PerQubit { variances, .. } => variances.clone(),
        }
    }

    /// Number of (value, variance) pairs
    pub fn len(&self) -> usize {
        match self {
            Estimate::Single { .. } => 1,
            Estimate::PerQubit { values, .. } => values.len(),
        }
    }

    /// True for an empty per-qubit estimate
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimate::Single { value, variance } => {
                write!(f, "ev={:.6}, var={:.6}", value, variance)
            }
            Estimate::PerQubit { values, variances } => {
                write!(f, "ev={:?}, var={:?}", values, variances)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_resolve() {
        let values = [0.5, 1.5];
        assert_eq!(Parameter::Literal(2.0).resolve(&values).unwrap(), 2.0);
        assert_eq!(Parameter::Ref(ParRef(1)).resolve(&values).unwrap(), 1.5);

        let err = Parameter::Ref(ParRef(2)).resolve(&values).unwrap_err();
        assert_eq!(
            err,
            QplugError::UnboundParameter {
                index: 2,
                available: 2
            }
        );
    }

    #[test]
    fn test_param_domain() {
        assert!(ParamDomain::Real.check("Rx", 0, 0.3).is_ok());
        assert!(ParamDomain::Real.check("Rx", 0, f64::NAN).is_err());
        assert!(ParamDomain::Integer.check("Shift", 0, 2.0).is_ok());
        assert!(ParamDomain::Integer.check("Shift", 0, 2.5).is_err());
    }

    #[test]
    fn test_estimate_accessors() {
        let single = Estimate::single(0.25, 0.9375);
        assert_eq!(single.value(), Some(0.25));
        assert_eq!(single.len(), 1);

        let multi = Estimate::PerQubit {
            values: vec![1.0, -1.0],
            variances: vec![0.0, 0.0],
        };
        assert_eq!(multi.value(), None);
        assert_eq!(multi.values(), vec![1.0, -1.0]);
        assert_eq!(multi.len(), 2);
    }

    #[test]
    fn test_par_ref_display() {
        assert_eq!(ParRef(4).to_string(), "p4");
        assert_eq!(Parameter::from(ParRef(0)).to_string(), "p0");
    }
}
