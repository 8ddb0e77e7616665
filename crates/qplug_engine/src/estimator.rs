//! Expectation-value estimation
//!
//! Gantree: L4_Engine → Estimator
//!
//! One estimation rule per backend kind:
//!
//! | backend | observables | value |
//! |---------|-------------|-------|
//! | state-vector | X, Y, Z, AllZ | analytic, variance `1 - e²` |
//! | classical | Z | classical bit as `0.0`/`1.0`, variance `0` |
//! | remote | Z | resample and submit, placeholder `(0, 0)` |

use crate::backend_kind::BackendKind;
use crate::session::Session;
use qplug_core::{Estimate, GateDescriptor, Pauli, QplugError, QplugResult, QubitId};

/// Estimate `observable` on engine qubits `qubits` of the session's live register
pub fn estimate(
    session: &mut Session,
    observable: &GateDescriptor,
    qubits: &[QubitId],
) -> QplugResult<Estimate> {
    let kind = session.kind();
    let name = observable.name();

    let estimate = match kind {
        BackendKind::RemoteHardware => estimate_remote(session, observable, qubits)?,
        _ => {
            if observable.arity() != 1 || qubits.len() != 1 {
                return Err(QplugError::InvalidCommand(format!(
                    "{} estimates single-qubit observables only, got {} on {} qubit(s)",
                    kind,
                    name,
                    qubits.len()
                )));
            }
            match kind {
                BackendKind::StateVectorSim => estimate_statevector(session, name, qubits[0])?,
                _ => estimate_classical(session, name, qubits[0])?,
            }
        }
    };

    log::info!("{}: ev: {:?}, var: {:?}", name, estimate.values(), estimate.variances());
    Ok(estimate)
}

fn not_implemented(observable: &str, kind: BackendKind) -> QplugError {
    QplugError::EstimationNotImplemented {
        observable: observable.to_string(),
        backend: kind.name().to_string(),
    }
}

fn pauli(name: &str) -> Option<Pauli> {
    match name {
        "X" => Some(Pauli::X),
        "Y" => Some(Pauli::Y),
        "Z" => Some(Pauli::Z),
        _ => None,
    }
}

fn estimate_statevector(
    session: &mut Session,
    name: &str,
    qubit: QubitId,
) -> QplugResult<Estimate> {
    let live = session
        .live_mut()
        .ok_or_else(|| QplugError::no_engine(name))?;
    live.engine.flush(false)?;

    if let Some(p) = pauli(name) {
        let e = live.engine.expectation_value(p, qubit)?;
        return Ok(Estimate::single(e, 1.0 - e * e));
    }

    if name == "AllZ" {
        let values = live
            .qureg
            .qubits()
            .iter()
            .map(|&q| live.engine.expectation_value(Pauli::Z, q))
            .collect::<QplugResult<Vec<f64>>>()?;
        let variances = values.iter().map(|e| 1.0 - e * e).collect();
        return Ok(Estimate::PerQubit { values, variances });
    }

    Err(not_implemented(name, BackendKind::StateVectorSim))
}

fn estimate_classical(session: &mut Session, name: &str, qubit: QubitId) -> QplugResult<Estimate> {
    if name != "Z" {
        return Err(not_implemented(name, BackendKind::ClassicalSim));
    }
    let live = session
        .live_mut()
        .ok_or_else(|| QplugError::no_engine(name))?;
    live.engine.flush(false)?;

    let bit = live.engine.read_bit(qubit)?;
    Ok(Estimate::single(if bit { 1.0 } else { 0.0 }, 0.0))
}

/// Fail before any side effect when a single-measurement backend cannot
/// estimate `observable` right now
pub fn precheck(session: &Session, observable: &GateDescriptor) -> QplugResult<()> {
    let kind = session.kind();
    if !kind.single_measurement() {
        return Ok(());
    }
    if observable.name() != "Z" {
        return Err(not_implemented(observable.name(), kind));
    }
    if session.is_measured() {
        return Err(QplugError::MultipleMeasurement {
            backend: kind.name().to_string(),
        });
    }
    Ok(())
}

fn estimate_remote(
    session: &mut Session,
    observable: &GateDescriptor,
    qubits: &[QubitId],
) -> QplugResult<Estimate> {
    let kind = BackendKind::RemoteHardware;
    precheck(session, observable)?;

    session.resample(qubits.len())?;
    // TODO: read counts from the submitted job once the store records results
    log::info!("{} estimate is a placeholder until job results are available", kind);
    Ok(Estimate::single(0.0, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginConfig;
    use approx::assert_relative_eq;
    use qplug_core::{catalog, TemplateBuilder};

    fn allocated(backend: &str) -> Session {
        let mut s = Session::from_config(PluginConfig::for_backend(backend)).unwrap();
        let t = TemplateBuilder::new("x").x(1).build().unwrap();
        s.execute_circuit(&t, &[], true, None).unwrap();
        s
    }

    #[test]
    fn test_statevector_paulis() {
        let mut s = allocated("Simulator");
        let z = estimate(&mut s, &catalog::MEASURE_Z, &[1]).unwrap();
        assert_relative_eq!(z.value().unwrap(), -1.0);
        assert_relative_eq!(z.variance().unwrap(), 0.0);

        let x = estimate(&mut s, &catalog::MEASURE_X, &[0]).unwrap();
        assert_relative_eq!(x.value().unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(x.variance().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_statevector_all_z() {
        let mut s = allocated("Simulator");
        let all = estimate(&mut s, &catalog::MEASURE_ALL_Z, &[0]).unwrap();
        assert_eq!(all.values(), vec![1.0, -1.0]);
        assert_eq!(all.variances(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_multi_qubit_rejected_off_remote() {
        let mut s = allocated("Simulator");
        assert!(matches!(
            estimate(&mut s, &catalog::MEASURE_Z, &[0, 1]),
            Err(QplugError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_classical_reads_bit() {
        let mut s = allocated("ClassicalSimulator");
        let one = estimate(&mut s, &catalog::MEASURE_Z, &[1]).unwrap();
        assert_eq!(one, Estimate::single(1.0, 0.0));
        let zero = estimate(&mut s, &catalog::MEASURE_Z, &[0]).unwrap();
        assert_eq!(zero, Estimate::single(0.0, 0.0));
        assert!(matches!(
            estimate(&mut s, &catalog::MEASURE_X, &[0]),
            Err(QplugError::EstimationNotImplemented { .. })
        ));
    }

    #[test]
    fn test_remote_single_measurement() {
        let mut s = allocated("RemoteBackend");
        let first = estimate(&mut s, &catalog::MEASURE_Z, &[0]).unwrap();
        assert_eq!(first, Estimate::single(0.0, 0.0));
        assert!(s.is_measured());
        assert_eq!(s.jobs().len(), 1);

        assert_eq!(
            estimate(&mut s, &catalog::MEASURE_Z, &[0]).unwrap_err(),
            QplugError::MultipleMeasurement {
                backend: "RemoteBackend".into()
            }
        );
        assert_eq!(s.jobs().len(), 1);
    }

    #[test]
    fn test_remote_non_z_has_no_side_effects() {
        let mut s = allocated("RemoteBackend");
        let generation = s.generation();
        assert!(matches!(
            estimate(&mut s, &catalog::MEASURE_X, &[0]),
            Err(QplugError::EstimationNotImplemented { .. })
        ));
        assert_eq!(s.generation(), generation);
        assert!(s.jobs().is_empty());
    }
}
