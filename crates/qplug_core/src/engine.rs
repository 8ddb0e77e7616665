//! Engine contract
//!
//! Gantree: L2_Contract → Engine
//!
//! The simulation or hardware backend is an opaque collaborator. It
//! allocates qubits, applies operations, opens compute scopes, flushes,
//! and answers expectation-value or classical-bit queries. Nothing above
//! this trait inspects its numerics.
//!
//! ```text
//!   allocate_qureg() ──→ begin_compute() ──→ apply()* ──→ flush() ──→ end_compute()
//!                                               │
//!                                               └──→ expectation_value() / read_bit()
//!   measure()* ──→ release()
//! ```

use crate::error::{QplugError, QplugResult};
use crate::operation::Operation;
use crate::types::{Pauli, QubitId};
use std::ops::{Deref, DerefMut};

// ============================================================================
// Qureg
// ============================================================================

/// Handle to a block of qubits allocated on one engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qureg {
    qubits: Vec<QubitId>,
}

impl Qureg {
    /// Wrap engine-assigned qubit ids
    pub fn new(qubits: Vec<QubitId>) -> Self {
        Self { qubits }
    }

    /// Engine qubit id at register position `index`
    pub fn get(&self, index: usize) -> Option<QubitId> {
        self.qubits.get(index).copied()
    }

    /// Map register positions to engine qubit ids
    pub fn map(&self, indices: &[usize]) -> QplugResult<Vec<QubitId>> {
        indices
            .iter()
            .map(|&i| {
                self.get(i).ok_or(QplugError::QubitOutOfRange {
                    qubit: i,
                    max: self.len(),
                })
            })
            .collect()
    }

    /// All engine qubit ids in register order
    pub fn qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    /// Register size
    pub fn len(&self) -> usize {
        self.qubits.len()
    }

    /// Check if register is empty
    pub fn is_empty(&self) -> bool {
        self.qubits.is_empty()
    }
}

// ============================================================================
// Engine Trait
// ============================================================================

/// Backend engine trait
/// Gantree: Engine // backend interface
pub trait Engine: Send {
    /// Backend name used in error messages
    fn name(&self) -> &str;

    /// Allocate `n` fresh qubits in |0⟩
    fn allocate_qureg(&mut self, n: usize) -> QplugResult<Qureg>;

    /// Enter a compute scope (nestable)
    fn begin_compute(&mut self);

    /// Leave the innermost compute scope
    fn end_compute(&mut self);

    /// Check if a compute scope is open
    fn in_compute(&self) -> bool;

    /// Whether the engine recognizes `op` on `qubits`
    fn is_available(&self, op: &Operation, qubits: &[QubitId]) -> bool;

    /// Apply one state-changing operation
    fn apply(&mut self, op: &Operation, qubits: &[QubitId]) -> QplugResult<()>;

    /// Measure one qubit in the computational basis
    fn measure(&mut self, qubit: QubitId) -> QplugResult<bool>;

    /// Barrier: push pending operations through the engine
    fn flush(&mut self, deallocate_qubits: bool) -> QplugResult<()>;

    /// Analytic ⟨P⟩ on one qubit
    fn expectation_value(&self, pauli: Pauli, qubit: QubitId) -> QplugResult<f64> {
        let _ = qubit;
        Err(QplugError::BackendError(format!(
            "{} does not provide analytic expectation values (requested {})",
            self.name(),
            pauli.name()
        )))
    }

    /// Classical value of one qubit
    fn read_bit(&self, qubit: QubitId) -> QplugResult<bool> {
        Err(QplugError::BackendError(format!(
            "{} cannot read qubit {} as a classical bit",
            self.name(),
            qubit
        )))
    }

    /// Release every allocated qubit
    fn release(&mut self) -> QplugResult<()> {
        Ok(())
    }
}

// ============================================================================
// Compute Guard
// ============================================================================

/// Compute scope that closes when dropped, on every exit path
pub struct ComputeGuard<'a> {
    engine: &'a mut dyn Engine,
}

impl<'a> ComputeGuard<'a> {
    /// Open a compute scope on `engine`
    pub fn open(engine: &'a mut dyn Engine) -> Self {
        engine.begin_compute();
        Self { engine }
    }
}

impl<'a> Deref for ComputeGuard<'a> {
    type Target = dyn Engine + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.engine
    }
}

impl<'a> DerefMut for ComputeGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.engine
    }
}

impl Drop for ComputeGuard<'_> {
    fn drop(&mut self) {
        self.engine.end_compute();
    }
}

// ============================================================================
// Tests
// ============================================================================
