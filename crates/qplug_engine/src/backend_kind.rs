//! Backend kinds
//!
//! Gantree: L4_Engine → BackendKind
//!
//! The closed set of backends a session can target, and the per-kind
//! lifecycle rules the session and estimator consult.

use crate::config::{EngineOverrides, PluginConfig};
use qplug_backend::{
    ClassicalEngine, JobStore, RemoteEngine, StateVectorEngine, CLASSICAL_NAME, REMOTE_NAME,
    STATEVECTOR_NAME,
};
use qplug_core::{Engine, QplugError, QplugResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// State-vector simulator with analytic expectation values
    StateVectorSim,
    /// Bit-level classical simulator
    ClassicalSim,
    /// Remote hardware (one measurement per run)
    RemoteHardware,
}

impl BackendKind {
    /// All backend kinds
    pub const ALL: [BackendKind; 3] = [
        BackendKind::StateVectorSim,
        BackendKind::ClassicalSim,
        BackendKind::RemoteHardware,
    ];

    /// Canonical selector name
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::StateVectorSim => STATEVECTOR_NAME,
            BackendKind::ClassicalSim => CLASSICAL_NAME,
            BackendKind::RemoteHardware => REMOTE_NAME,
        }
    }

    /// Qubits must be measured before the register is released
    pub fn requires_deallocation_on_reset(&self) -> bool {
        matches!(self, BackendKind::StateVectorSim)
    }

    /// Only one measurement per session run
    pub fn single_measurement(&self) -> bool {
        matches!(self, BackendKind::RemoteHardware)
    }

    /// Build a fresh engine from config and per-run overrides
    pub fn create_engine(
        &self,
        config: &PluginConfig,
        overrides: Option<&EngineOverrides>,
        jobs: &JobStore,
    ) -> Box<dyn Engine> {
        match self {
            BackendKind::StateVectorSim => {
                let gate_fusion = overrides
                    .and_then(|o| o.gate_fusion)
                    .unwrap_or(config.gate_fusion);
                let seed = overrides.and_then(|o| o.rnd_seed).or(config.rnd_seed);

                let engine = StateVectorEngine::new().with_gate_fusion(gate_fusion);
                match seed {
                    Some(seed) => Box::new(engine.with_seed(seed)),
                    None => Box::new(engine),
                }
            }
            BackendKind::ClassicalSim => Box::new(ClassicalEngine::new()),
            BackendKind::RemoteHardware => Box::new(
                RemoteEngine::new(config.remote_options(overrides), jobs.clone())
                    .with_credentials(config.credentials()),
            ),
        }
    }
}

impl FromStr for BackendKind {
    type Err = QplugError;

    fn from_str(s: &str) -> QplugResult<Self> {
        match s {
            "Simulator" | "simulator" | "state_vector" | "statevector" => {
                Ok(BackendKind::StateVectorSim)
            }
            "ClassicalSimulator" | "classical_simulator" | "classical" => {
                Ok(BackendKind::ClassicalSim)
            }
            "RemoteBackend" | "IBMBackend" | "remote_backend" | "remote" => {
                Ok(BackendKind::RemoteHardware)
            }
            other => Err(QplugError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.name().parse::<BackendKind>().unwrap(), kind);
        }
        assert_eq!(
            "classical".parse::<BackendKind>().unwrap(),
            BackendKind::ClassicalSim
        );
        assert_eq!(
            "bogus".parse::<BackendKind>().unwrap_err(),
            QplugError::UnknownBackend("bogus".into())
        );
    }

    #[test]
    fn test_lifecycle_rules() {
        assert!(BackendKind::StateVectorSim.requires_deallocation_on_reset());
        assert!(!BackendKind::ClassicalSim.requires_deallocation_on_reset());
        assert!(BackendKind::RemoteHardware.single_measurement());
        assert!(!BackendKind::StateVectorSim.single_measurement());
    }

    #[test]
    fn test_create_engine_names() {
        let config = PluginConfig::default();
        let jobs = JobStore::new();
        for kind in BackendKind::ALL {
            let engine = kind.create_engine(&config, None, &jobs);
            assert_eq!(engine.name(), kind.name());
        }
    }
}
