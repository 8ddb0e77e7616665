//! Capability negotiation
//!
//! Gantree: L4_Engine → Negotiator
//!
//! Finds the effective gate and observable sets of a concrete backend.
//! Backends that accept the whole catalog skip probing. Everything else is
//! probed on a throwaway engine that never touches session state.

use crate::backend_kind::BackendKind;
use crate::config::PluginConfig;
use qplug_backend::JobStore;
use qplug_core::{catalog, ComputeGuard, Engine, GateDescriptor, QplugResult, QubitId};
use rand::Rng;
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Effective catalogs of one session
/// Gantree: Capabilities // gates + observables
#[derive(Debug, Clone, PartialEq)]
pub struct Capabilities {
    gates: BTreeMap<String, &'static GateDescriptor>,
    observables: BTreeMap<String, &'static GateDescriptor>,
}

impl Capabilities {
    fn from_lists(
        gates: impl IntoIterator<Item = &'static GateDescriptor>,
        observables: impl IntoIterator<Item = &'static GateDescriptor>,
    ) -> Self {
        Self {
            gates: gates.into_iter().map(|g| (g.name().to_string(), g)).collect(),
            observables: observables
                .into_iter()
                .map(|o| (o.name().to_string(), o))
                .collect(),
        }
    }

    /// Effective gate by name
    pub fn gate(&self, name: &str) -> Option<&'static GateDescriptor> {
        self.gates.get(name).copied()
    }

    /// Effective observable by name
    pub fn observable(&self, name: &str) -> Option<&'static GateDescriptor> {
        self.observables.get(name).copied()
    }

    /// Check if gate is in the effective set
    pub fn supports_gate(&self, name: &str) -> bool {
        self.gates.contains_key(name)
    }

    /// Check if observable is in the effective set
    pub fn supports_observable(&self, name: &str) -> bool {
        self.observables.contains_key(name)
    }

    /// Effective gate names, sorted
    pub fn gate_names(&self) -> Vec<&str> {
        self.gates.keys().map(String::as_str).collect()
    }

    /// Effective observable names, sorted
    pub fn observable_names(&self) -> Vec<&str> {
        self.observables.keys().map(String::as_str).collect()
    }

    /// Check that both sets are drawn from the declared catalog
    pub fn is_subset_of_catalog(&self) -> bool {
        let gates = catalog::gates();
        let observables = catalog::observables();
        self.gates.values().all(|g| gates.contains(g))
            && self.observables.values().all(|o| observables.contains(o))
    }
}

// ============================================================================
// Negotiation
// ============================================================================

/// Compute the effective catalogs for `kind`
pub fn negotiate(kind: BackendKind, config: &PluginConfig) -> QplugResult<Capabilities> {
    if kind == BackendKind::StateVectorSim {
        return Ok(Capabilities::from_lists(
            catalog::gates(),
            catalog::observables(),
        ));
    }

    // Probe jobs go to a private store
    let mut engine = kind.create_engine(config, None, &JobStore::new());
    let mut gates = {
        let mut guard = ComputeGuard::open(engine.as_mut());
        let scratch = guard.allocate_qureg(catalog::max_arity())?;
        catalog::gates()
            .into_iter()
            .filter(|gate| {
                let ok = try_probe(gate, &*guard, scratch.qubits());
                log::debug!("probe {} on {}: {}", gate.name(), kind, ok);
                ok
            })
            .collect::<Vec<_>>()
    };

    if kind == BackendKind::RemoteHardware && !gates.contains(&&catalog::CNOT) {
        log::warn!(
            "{} rejected CNOT during probing; including it because the engine applies it natively",
            kind
        );
        gates.push(&catalog::CNOT);
    }

    let capabilities = Capabilities::from_lists(gates, [&catalog::MEASURE_Z]);
    log::info!(
        "{} supports gates {:?} and observables {:?}",
        kind,
        capabilities.gate_names(),
        capabilities.observable_names()
    );
    Ok(capabilities)
}

/// Whether `engine` accepts `gate` built from placeholder parameters
pub fn try_probe(gate: &GateDescriptor, engine: &dyn Engine, scratch: &[QubitId]) -> bool {
    if scratch.len() < gate.arity() {
        return false;
    }
    let params: Vec<f64> = if gate.param_count() > 0 {
        let mut rng = rand::thread_rng();
        (0..gate.param_count()).map(|_| rng.gen_range(-PI..PI)).collect()
    } else {
        Vec::new()
    };

    match gate.build(&params) {
        Ok(op) => engine.is_available(&op, &scratch[..gate.arity()]),
        Err(_) => false,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qplug_backend::ClassicalEngine;

    #[test]
    fn test_statevector_gets_full_catalog() {
        let caps = negotiate(BackendKind::StateVectorSim, &PluginConfig::default()).unwrap();
        assert_eq!(caps.gate_names().len(), catalog::gates().len());
        assert!(caps.supports_observable("AllZ"));
        assert!(caps.supports_observable("Y"));
        assert!(caps.is_subset_of_catalog());
    }

    #[test]
    fn test_classical_probes() {
        let caps = negotiate(BackendKind::ClassicalSim, &PluginConfig::default()).unwrap();
        assert_eq!(caps.gate_names(), vec!["CNOT", "Swap", "X"]);
        assert_eq!(caps.observable_names(), vec!["Z"]);
        assert!(caps.is_subset_of_catalog());
    }

    #[test]
    fn test_remote_forces_cnot() {
        let config = PluginConfig::for_backend("RemoteBackend");
        let caps = negotiate(BackendKind::RemoteHardware, &config).unwrap();
        assert!(caps.supports_gate("CNOT"));
        assert!(caps.supports_gate("Rx"));
        assert!(!caps.supports_gate("CZ"));
        assert!(!caps.supports_gate("Swap"));
        assert!(!caps.supports_observable("X"));
        assert!(caps.is_subset_of_catalog());
    }

    #[test]
    fn test_probe_rejects_short_scratch() {
        let engine = ClassicalEngine::new();
        assert!(!try_probe(&catalog::CNOT, &engine, &[0]));
        assert!(try_probe(&catalog::CNOT, &engine, &[0, 1]));
        assert!(!try_probe(&catalog::RX, &engine, &[0, 1]));
    }
}
