//! Backend-level operations for QPLUG
//!
//! Gantree: L1_Circuit → Operation
//!
//! An [`Operation`] is a gate value with its parameters resolved but no
//! qubits attached. Engines receive `(operation, qubits)` pairs. The
//! `Controlled` and `Tensor` forms are the composites that descriptors
//! use to synthesize CNOT, CZ, Toffoli, and "Z on every qubit".

use crate::error::{QplugError, QplugResult};
use crate::types::{Angle, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend operation
/// Gantree: Operation // resolved gate value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    // ========================================================================
    // Single-Qubit Gates
    // ========================================================================
    /// Hadamard
    H,
    /// Pauli-X (NOT)
    X,
    /// Pauli-Y
    Y,
    /// Pauli-Z
    Z,
    /// S gate (sqrt(Z))
    S,
    /// T gate (fourth root of Z)
    T,
    /// sqrt(X)
    SqrtX,

    // ========================================================================
    // Single-Qubit Rotations
    // ========================================================================
    /// Rotation around X
    Rx(Angle),
    /// Rotation around Y
    Ry(Angle),
    /// Rotation around Z
    Rz(Angle),
    /// Phase shift diag(1, e^{iφ})
    R(Angle),

    // ========================================================================
    // Two-Qubit Gates
    // ========================================================================
    /// SWAP
    Swap,
    /// sqrt(SWAP)
    SqrtSwap,
    /// Controlled Rz
    CRz(Angle),

    // ========================================================================
    // Composites
    // ========================================================================
    /// `base` conditioned on `controls` leading qubits
    Controlled {
        /// Operation applied to the trailing qubits
        base: Box<Operation>,
        /// Number of control qubits
        controls: usize,
    },

    /// `base` applied to every qubit it is given
    Tensor(Box<Operation>),
}

impl Operation {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Controlled version of `base`
    pub fn controlled(base: Operation, controls: usize) -> Self {
        Operation::Controlled {
            base: Box::new(base),
            controls,
        }
    }

    /// `base` on every target qubit
    pub fn tensor(base: Operation) -> Self {
        Operation::Tensor(Box::new(base))
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Number of qubits the operation acts on (`None` for tensor forms,
    /// which accept any non-empty register)
    pub fn num_qubits(&self) -> Option<usize> {
        match self {
            Operation::H
            | Operation::X
            | Operation::Y
            | Operation::Z
            | Operation::S
            | Operation::T
            | Operation::SqrtX
            | Operation::Rx(_)
            | Operation::Ry(_)
            | Operation::Rz(_)
            | Operation::R(_) => Some(1),
            Operation::Swap | Operation::SqrtSwap | Operation::CRz(_) => Some(2),
            Operation::Controlled { base, controls } => base.num_qubits().map(|n| n + controls),
            Operation::Tensor(_) => None,
        }
    }

    /// Check if the operation is a plain single-qubit gate
    pub fn is_single_qubit(&self) -> bool {
        self.num_qubits() == Some(1)
    }

    /// Check if the operation carries a parameter
    pub fn is_parameterized(&self) -> bool {
        match self {
            Operation::Rx(_)
            | Operation::Ry(_)
            | Operation::Rz(_)
            | Operation::R(_)
            | Operation::CRz(_) => true,
            Operation::Controlled { base, .. } | Operation::Tensor(base) => base.is_parameterized(),
            _ => false,
        }
    }

    /// Check that `qubits` fits the operation's shape
    pub fn check_qubits(&self, qubits: &[QubitId]) -> QplugResult<()> {
        match self.num_qubits() {
            Some(n) if n != qubits.len() => Err(QplugError::InvalidCommand(format!(
                "{} acts on {} qubit(s), got {}",
                self.name(),
                n,
                qubits.len()
            ))),
            None if qubits.is_empty() => Err(QplugError::InvalidCommand(format!(
                "{} needs at least one qubit",
                self.name()
            ))),
            _ => {
                for (i, q) in qubits.iter().enumerate() {
                    if qubits[..i].contains(q) {
                        return Err(QplugError::InvalidCommand(format!(
                            "{} targets qubit {} twice",
                            self.name(),
                            q
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Operation name
    pub fn name(&self) -> String {
        match self {
            Operation::H => "H".into(),
            Operation::X => "X".into(),
            Operation::Y => "Y".into(),
            Operation::Z => "Z".into(),
            Operation::S => "S".into(),
            Operation::T => "T".into(),
            Operation::SqrtX => "SqrtX".into(),
            Operation::Rx(_) => "Rx".into(),
            Operation::Ry(_) => "Ry".into(),
            Operation::Rz(_) => "Rz".into(),
            Operation::R(_) => "R".into(),
            Operation::Swap => "Swap".into(),
            Operation::SqrtSwap => "SqrtSwap".into(),
            Operation::CRz(_) => "CRz".into(),
            Operation::Controlled { base, controls: 1 } => format!("C({})", base.name()),
            Operation::Controlled { base, controls } => format!("C^{}({})", controls, base.name()),
            Operation::Tensor(base) => format!("Tensor({})", base.name()),
        }
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Convert to OpenQASM 2.0 for the given qubits
    pub fn to_qasm(&self, qubits: &[QubitId]) -> QplugResult<String> {
        self.check_qubits(qubits)?;
        let q = |i: usize| format!("q[{}]", qubits[i]);

        let line = match self {
            Operation::H => format!("h {};", q(0)),
            Operation::X => format!("x {};", q(0)),
            Operation::Y => format!("y {};", q(0)),
            Operation::Z => format!("z {};", q(0)),
            Operation::S => format!("s {};", q(0)),
            Operation::T => format!("t {};", q(0)),
            Operation::SqrtX => format!("sx {};", q(0)),
            Operation::Rx(theta) => format!("rx({}) {};", theta, q(0)),
            Operation::Ry(theta) => format!("ry({}) {};", theta, q(0)),
            Operation::Rz(theta) => format!("rz({}) {};", theta, q(0)),
            Operation::R(phi) => format!("u1({}) {};", phi, q(0)),
            Operation::Swap => format!("swap {},{};", q(0), q(1)),
            Operation::CRz(theta) => format!("crz({}) {},{};", theta, q(0), q(1)),
            Operation::Controlled { base, controls } => match (base.as_ref(), controls) {
                (Operation::X, 1) => format!("cx {},{};", q(0), q(1)),
                (Operation::Z, 1) => format!("cz {},{};", q(0), q(1)),
                (Operation::Y, 1) => format!("cy {},{};", q(0), q(1)),
                (Operation::X, 2) => format!("ccx {},{},{};", q(0), q(1), q(2)),
                _ => {
                    return Err(QplugError::InvalidCommand(format!(
                        "{} has no OpenQASM 2.0 form",
                        self.name()
                    )))
                }
            },
            Operation::Tensor(base) => {
                let lines: QplugResult<Vec<String>> =
                    qubits.iter().map(|&qb| base.to_qasm(&[qb])).collect();
                lines?.join("\n")
            }
            Operation::SqrtSwap => {
                return Err(QplugError::InvalidCommand(
                    "SqrtSwap has no OpenQASM 2.0 form".to_string(),
                ))
            }
        };

        Ok(line)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Rx(a)
            | Operation::Ry(a)
            | Operation::Rz(a)
            | Operation::R(a)
            | Operation::CRz(a) => write!(f, "{}({})", self.name(), a),
            _ => write!(f, "{}", self.name()),
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
    fn test_num_qubits() {
        assert_eq!(Operation::H.num_qubits(), Some(1));
        assert_eq!(Operation::CRz(0.1).num_qubits(), Some(2));
        assert_eq!(Operation::controlled(Operation::X, 2).num_qubits(), Some(3));
        assert_eq!(Operation::tensor(Operation::Z).num_qubits(), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(Operation::controlled(Operation::X, 1).name(), "C(X)");
        assert_eq!(Operation::controlled(Operation::X, 2).name(), "C^2(X)");
        assert_eq!(Operation::tensor(Operation::Z).name(), "Tensor(Z)");
    }

    #[test]
    fn test_check_qubits() {
        assert!(Operation::Swap.check_qubits(&[0, 1]).is_ok());
        assert!(Operation::Swap.check_qubits(&[0]).is_err());
        assert!(Operation::Swap.check_qubits(&[1, 1]).is_err());
        assert!(Operation::tensor(Operation::Z).check_qubits(&[0, 1, 2]).is_ok());
        assert!(Operation::tensor(Operation::Z).check_qubits(&[]).is_err());
    }

    #[test]
    fn test_to_qasm() {
        assert_eq!(Operation::H.to_qasm(&[2]).unwrap(), "h q[2];");
        assert_eq!(Operation::Rx(0.5).to_qasm(&[0]).unwrap(), "rx(0.5) q[0];");
        assert_eq!(
            Operation::controlled(Operation::X, 1).to_qasm(&[0, 1]).unwrap(),
            "cx q[0],q[1];"
        );
        assert_eq!(
            Operation::tensor(Operation::Z).to_qasm(&[0, 1]).unwrap(),
            "z q[0];\nz q[1];"
        );
        assert!(Operation::SqrtSwap.to_qasm(&[0, 1]).is_err());
    }

    #[test]
    fn test_is_parameterized() {
        assert!(Operation::Rz(0.2).is_parameterized());
        assert!(!Operation::controlled(Operation::Z, 1).is_parameterized());
    }
}
