//! Built-in circuit templates
//!
//! Gantree: L4_Engine → Templates

use qplug_core::{catalog, CircuitTemplate, ParRef, QplugResult, TemplateBuilder};

/// Two parametrized X rotations followed by CNOT, no outputs
pub fn demo() -> QplugResult<CircuitTemplate> {
    demo_builder("demo").build()
}

/// [`demo`] plus a Pauli-Z estimate on `qubit` (0 or 1), returned as the
/// single output. Named `demo_ev{qubit}`.
pub fn demo_ev(qubit: usize) -> QplugResult<CircuitTemplate> {
    demo_builder(format!("demo_ev{}", qubit))
        .expval(&catalog::MEASURE_Z, qubit)
        .output(&[qubit])
        .build()
}

fn demo_builder(name: impl Into<String>) -> TemplateBuilder {
    TemplateBuilder::new(name)
        .rx(0, ParRef(0))
        .rx(1, ParRef(1))
        .cnot(0, 1)
}

/// `Rx(0)` on qubits `0..n`; used to resample the remote backend
pub fn identity(n: usize) -> QplugResult<CircuitTemplate> {
    (0..n)
        .fold(TemplateBuilder::new("identity"), |b, q| b.rx(q, 0.0))
        .build()
}

/// All built-in templates
pub fn builtin() -> QplugResult<Vec<CircuitTemplate>> {
    Ok(vec![demo()?, demo_ev(0)?, demo_ev(1)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_unique() {
        let names: Vec<String> = builtin()
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["demo", "demo_ev0", "demo_ev1"]);
    }

    #[test]
    fn test_demo_ev_shape() {
        let t = demo_ev(1).unwrap();
        assert_eq!(t.num_qubits(), 2);
        assert_eq!(t.num_parameters(), 2);
        assert_eq!(t.out(), &[1]);
        assert_eq!(t.count_observables(), 1);
    }

    #[test]
    fn test_identity() {
        let t = identity(3).unwrap();
        assert_eq!(t.num_qubits(), 3);
        assert_eq!(t.num_parameters(), 0);
        assert!(t.out().is_empty());
        assert!(identity(0).unwrap().is_empty());
    }
}
