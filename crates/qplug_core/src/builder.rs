//! Template builder for QPLUG
//!
//! Gantree: L1_Circuit → TemplateBuilder
//!
//! Fluent builder over [`CircuitTemplate`]. The first invalid command is
//! remembered and reported by [`TemplateBuilder::build`].

use crate::catalog;
use crate::circuit::{CircuitTemplate, Command};
use crate::descriptor::GateDescriptor;
use crate::error::{QplugError, QplugResult};
use crate::types::{Parameter, QubitId};

/// Fluent template builder (consuming self pattern)
/// Gantree: TemplateBuilder // builder pattern
pub struct TemplateBuilder {
    name: String,
    commands: Vec<Command>,
    out: Vec<QubitId>,
    error: Option<QplugError>,
}

impl TemplateBuilder {
    /// Create a builder for a named template
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            out: Vec::new(),
            error: None,
        }
    }

    // ========================================================================
    // Generic
    // ========================================================================

    /// Append any descriptor
    pub fn push(
        mut self,
        gate: &'static GateDescriptor,
        qubits: &[QubitId],
        params: &[Parameter],
    ) -> Self {
        if self.error.is_none() {
            match Command::new(gate, qubits.to_vec(), params.to_vec()) {
                Ok(cmd) => self.commands.push(cmd),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    /// Append a catalog gate by name
    pub fn gate(self, name: &str, qubits: &[QubitId], params: &[Parameter]) -> Self {
        match catalog::lookup(name) {
            Some(gate) => self.push(gate, qubits, params),
            None => self.fail(QplugError::InvalidCommand(format!("unknown gate '{}'", name))),
        }
    }

    fn fail(mut self, err: QplugError) -> Self {
        self.error.get_or_insert(err);
        self
    }

    // ========================================================================
    // Gates
    // ========================================================================

    /// Add Hadamard gate
    pub fn h(self, qubit: QubitId) -> Self {
        self.push(&catalog::H, &[qubit], &[])
    }

    /// Add Pauli-X gate
    pub fn x(self, qubit: QubitId) -> Self {
        self.push(&catalog::X, &[qubit], &[])
    }

    /// Add Pauli-Y gate
    pub fn y(self, qubit: QubitId) -> Self {
        self.push(&catalog::Y, &[qubit], &[])
    }

    /// Add Pauli-Z gate
    pub fn z(self, qubit: QubitId) -> Self {
        self.push(&catalog::Z, &[qubit], &[])
    }

    /// Add Rx rotation
    pub fn rx(self, qubit: QubitId, angle: impl Into<Parameter>) -> Self {
        self.push(&catalog::RX, &[qubit], &[angle.into()])
    }

    /// Add Ry rotation
    pub fn ry(self, qubit: QubitId, angle: impl Into<Parameter>) -> Self {
        self.push(&catalog::RY, &[qubit], &[angle.into()])
    }

    /// Add Rz rotation
    pub fn rz(self, qubit: QubitId, angle: impl Into<Parameter>) -> Self {
        self.push(&catalog::RZ, &[qubit], &[angle.into()])
    }

    /// Add CNOT gate
    pub fn cnot(self, control: QubitId, target: QubitId) -> Self {
        self.push(&catalog::CNOT, &[control, target], &[])
    }

    /// Add CZ gate
    pub fn cz(self, control: QubitId, target: QubitId) -> Self {
        self.push(&catalog::CZ, &[control, target], &[])
    }

    /// Add SWAP gate
    pub fn swap(self, qubit1: QubitId, qubit2: QubitId) -> Self {
        self.push(&catalog::SWAP, &[qubit1, qubit2], &[])
    }

    /// Add controlled Rz
    pub fn crz(self, control: QubitId, target: QubitId, angle: impl Into<Parameter>) -> Self {
        self.push(&catalog::CRZ, &[control, target], &[angle.into()])
    }

    // ========================================================================
    // Observables / Outputs
    // ========================================================================

    /// Estimate an observable on one qubit
    pub fn expval(self, observable: &'static GateDescriptor, qubit: QubitId) -> Self {
        if !observable.is_observable() {
            let name = observable.name();
            return self.fail(QplugError::InvalidCommand(format!(
                "'{}' is not an observable",
                name
            )));
        }
        self.push(observable, &[qubit], &[])
    }

    /// Estimate Pauli-Z on one qubit
    pub fn expval_z(self, qubit: QubitId) -> Self {
        self.expval(&catalog::MEASURE_Z, qubit)
    }

    /// Declare output qubits, in result order
    pub fn output(mut self, qubits: &[QubitId]) -> Self {
        self.out.extend_from_slice(qubits);
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Finish the template
    pub fn build(self) -> QplugResult<CircuitTemplate> {
        match self.error {
            Some(err) => Err(err),
            None => CircuitTemplate::new(self.name, self.commands, self.out),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
