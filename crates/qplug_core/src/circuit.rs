//! Circuit templates for QPLUG
//!
//! Gantree: L1_Circuit → CircuitTemplate
//!
//! A template is an immutable, named sequence of commands over abstract
//! qubit indices, with symbolic parameters resolved only at execution time.

use crate::descriptor::GateDescriptor;
use crate::error::{QplugError, QplugResult};
use crate::types::{ParRef, Parameter, QubitId};
use std::fmt;

// ============================================================================
// Command
// ============================================================================

/// One step of a template: a descriptor applied to qubits with parameters
/// Gantree: Command // gate + qubits + params
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    gate: &'static GateDescriptor,
    qubits: Vec<QubitId>,
    params: Vec<Parameter>,
}

impl Command {
    /// Create a validated command
    pub fn new(
        gate: &'static GateDescriptor,
        qubits: Vec<QubitId>,
        params: Vec<Parameter>,
    ) -> QplugResult<Self> {
        if qubits.len() != gate.arity() {
            return Err(QplugError::InvalidCommand(format!(
                "{} acts on {} qubit(s), got {}",
                gate.name(),
                gate.arity(),
                qubits.len()
            )));
        }
        if params.len() != gate.param_count() {
            return Err(QplugError::InvalidCommand(format!(
                "{} takes {} parameter(s), got {}",
                gate.name(),
                gate.param_count(),
                params.len()
            )));
        }
        for (i, q) in qubits.iter().enumerate() {
            if qubits[..i].contains(q) {
                return Err(QplugError::InvalidCommand(format!(
                    "{} targets qubit {} twice",
                    gate.name(),
                    q
                )));
            }
        }

        Ok(Self {
            gate,
            qubits,
            params,
        })
    }

    /// Descriptor applied by this command
    pub fn gate(&self) -> &'static GateDescriptor {
        self.gate
    }

    /// Descriptor name
    pub fn name(&self) -> &'static str {
        self.gate.name()
    }

    /// Template qubit indices
    pub fn qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    /// Unresolved parameters
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Substitute every parameter against the caller's values
    pub fn resolve_params(&self, values: &[f64]) -> QplugResult<Vec<f64>> {
        self.params.iter().map(|p| p.resolve(values)).collect()
    }

    /// Highest parameter reference, if any
    pub fn max_par_ref(&self) -> Option<ParRef> {
        self.params.iter().filter_map(Parameter::par_ref).max()
    }

    /// Check if the command estimates an observable
    pub fn is_observable(&self) -> bool {
        self.gate.is_observable()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.gate.name())?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
            write!(f, "({})", params.join(", "))?;
        }
        let qubits: Vec<String> = self.qubits.iter().map(|q| format!("q{}", q)).collect();
        write!(f, " {}", qubits.join(","))
    }
}

// ============================================================================
// CircuitTemplate
// ============================================================================

/// Named, immutable command sequence with declared outputs
/// Gantree: CircuitTemplate // name + commands + out
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitTemplate {
    name: String,
    commands: Vec<Command>,
    out: Vec<QubitId>,
}

impl CircuitTemplate {
    /// Create a template; every output index must fall inside the register
    pub fn new(
        name: impl Into<String>,
        commands: Vec<Command>,
        out: Vec<QubitId>,
    ) -> QplugResult<Self> {
        let template = Self {
            name: name.into(),
            commands,
            out,
        };

        let max = template.num_qubits();
        if let Some(&qubit) = template.out.iter().find(|&&q| q >= max) {
            return Err(QplugError::QubitOutOfRange { qubit, max });
        }

        Ok(template)
    }

    /// Template name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command sequence
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Output qubit indices, in result order
    pub fn out(&self) -> &[QubitId] {
        &self.out
    }

    /// Register size: highest referenced qubit plus one
    pub fn num_qubits(&self) -> usize {
        self.commands
            .iter()
            .flat_map(|c| c.qubits().iter())
            .max()
            .map_or(0, |&q| q + 1)
    }

    /// Parameters consumed: highest reference plus one
    pub fn num_parameters(&self) -> usize {
        self.commands
            .iter()
            .filter_map(Command::max_par_ref)
            .max()
            .map_or(0, |r| r.index() + 1)
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if template has no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of observable commands
    pub fn count_observables(&self) -> usize {
        self.commands.iter().filter(|c| c.is_observable()).count()
    }

    /// Render the gate part as OpenQASM 2.0 with parameters substituted
    pub fn to_qasm(&self, values: &[f64]) -> QplugResult<String> {
        let mut lines = vec![
            "OPENQASM 2.0;".to_string(),
            "include \"qelib1.inc\";".to_string(),
            format!("qreg q[{}];", self.num_qubits()),
        ];

        for command in self.commands.iter().filter(|c| !c.is_observable()) {
            let op = command.gate().build(&command.resolve_params(values)?)?;
            lines.push(op.to_qasm(command.qubits())?);
        }

        Ok(lines.join("\n"))
    }
}

impl fmt::Display for CircuitTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Template '{}' ({} qubits, {} parameters, {} commands)",
            self.name,
            self.num_qubits(),
            self.num_parameters(),
            self.commands.len()
        )?;
        for command in &self.commands {
            writeln!(f, "  {}", command)?;
        }
        write!(f, "  out: {:?}", self.out)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn demo() -> CircuitTemplate {
        CircuitTemplate::new(
            "demo",
            vec![
                Command::new(&catalog::RX, vec![0], vec![ParRef(0).into()]).unwrap(),
                Command::new(&catalog::RX, vec![1], vec![ParRef(1).into()]).unwrap(),
                Command::new(&catalog::CNOT, vec![0, 1], vec![]).unwrap(),
                Command::new(&catalog::MEASURE_Z, vec![0], vec![]).unwrap(),
            ],
            vec![0],
        )
        .unwrap()
    }

    #[test]
    fn test_command_validation() {
        assert!(Command::new(&catalog::CNOT, vec![0], vec![]).is_err());
        assert!(Command::new(&catalog::CNOT, vec![1, 1], vec![]).is_err());
        assert!(Command::new(&catalog::RX, vec![0], vec![]).is_err());
        assert!(Command::new(&catalog::RX, vec![0], vec![0.5.into()]).is_ok());
    }

    #[test]
    fn test_resolve_params() {
        let cmd = Command::new(&catalog::CRZ, vec![0, 1], vec![ParRef(2).into()]).unwrap();
        assert_eq!(cmd.resolve_params(&[0.0, 0.0, 0.7]).unwrap(), vec![0.7]);
        assert_eq!(
            cmd.resolve_params(&[0.0]).unwrap_err(),
            QplugError::UnboundParameter {
                index: 2,
                available: 1
            }
        );
    }

    #[test]
    fn test_template_sizes() {
        let t = demo();
        assert_eq!(t.num_qubits(), 2);
        assert_eq!(t.num_parameters(), 2);
        assert_eq!(t.count_observables(), 1);
        assert_eq!(t.out(), &[0]);
    }

    #[test]
    fn test_out_of_range_output() {
        let err = CircuitTemplate::new(
            "bad",
            vec![Command::new(&catalog::H, vec![0], vec![]).unwrap()],
            vec![1],
        )
        .unwrap_err();
        assert_eq!(err, QplugError::QubitOutOfRange { qubit: 1, max: 1 });
    }

    #[test]
    fn test_template_qasm() {
        let qasm = demo().to_qasm(&[0.5, 0.25]).unwrap();
        assert!(qasm.contains("qreg q[2];"));
        assert!(qasm.contains("rx(0.5) q[0];"));
        assert!(qasm.contains("cx q[0],q[1];"));
    }

    #[test]
    fn test_display() {
        let text = demo().to_string();
        assert!(text.contains("Rx(p0) q0"));
        assert!(text.contains("CNOT q0,q1"));
    }
}
