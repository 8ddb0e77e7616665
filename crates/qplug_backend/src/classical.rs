//! Classical bit-level engine for QPLUG
//!
//! Gantree: L3_Backend → ClassicalEngine
//!
//! Tracks one classical bit per qubit. Only reversible classical gates are
//! available: X, Swap, and X with any number of controls.

use qplug_core::{Engine, Operation, QplugError, QplugResult, QubitId, Qureg};

/// Backend name reported in errors
pub const CLASSICAL_NAME: &str = "ClassicalSimulator";

/// Classical simulator engine
/// Gantree: ClassicalEngine // bit vector
#[derive(Debug, Clone, Default)]
pub struct ClassicalEngine {
    bits: Vec<bool>,
    compute_depth: usize,
}

impl ClassicalEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocated qubits
    pub fn num_qubits(&self) -> usize {
        self.bits.len()
    }

    /// Current bit values, register order
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    fn check_qubit(&self, qubit: QubitId) -> QplugResult<()> {
        if qubit >= self.bits.len() {
            return Err(QplugError::QubitOutOfRange {
                qubit,
                max: self.bits.len(),
            });
        }
        Ok(())
    }
}

impl Engine for ClassicalEngine {
    fn name(&self) -> &str {
        CLASSICAL_NAME
    }

    fn allocate_qureg(&mut self, n: usize) -> QplugResult<Qureg> {
        let start = self.bits.len();
        self.bits.resize(start + n, false);
        Ok(Qureg::new((start..start + n).collect()))
    }

    fn begin_compute(&mut self) {
        self.compute_depth += 1;
    }

    fn end_compute(&mut self) {
        self.compute_depth = self.compute_depth.saturating_sub(1);
    }

    fn in_compute(&self) -> bool {
        self.compute_depth > 0
    }

    fn is_available(&self, op: &Operation, qubits: &[QubitId]) -> bool {
        let kind_ok = match op {
            Operation::X | Operation::Swap => true,
            Operation::Controlled { base, .. } => **base == Operation::X,
            _ => false,
        };
        kind_ok && op.check_qubits(qubits).is_ok()
    }

    fn apply(&mut self, op: &Operation, qubits: &[QubitId]) -> QplugResult<()> {
        if !self.is_available(op, qubits) {
            return Err(QplugError::unsupported(op.name(), CLASSICAL_NAME));
        }
        for &q in qubits {
            self.check_qubit(q)?;
        }

        match op {
            Operation::X => self.bits[qubits[0]] ^= true,
            Operation::Swap => self.bits.swap(qubits[0], qubits[1]),
            Operation::Controlled { controls, .. } => {
                let (ctrl, target) = qubits.split_at(*controls);
                if ctrl.iter().all(|&c| self.bits[c]) {
                    self.bits[target[0]] ^= true;
                }
            }
            _ => return Err(QplugError::unsupported(op.name(), CLASSICAL_NAME)),
        }
        Ok(())
    }

    fn measure(&mut self, qubit: QubitId) -> QplugResult<bool> {
        self.read_bit(qubit)
    }

    fn flush(&mut self, deallocate_qubits: bool) -> QplugResult<()> {
        if deallocate_qubits {
            self.release()?;
        }
        Ok(())
    }

    fn read_bit(&self, qubit: QubitId) -> QplugResult<bool> {
        self.check_qubit(qubit)?;
        Ok(self.bits[qubit])
    }

    fn release(&mut self) -> QplugResult<()> {
        self.bits.clear();
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
