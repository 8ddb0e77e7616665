//! # QPLUG Engine
//!
//! Capability negotiation, sessions, and expectation estimation on top of
//! the engines in `qplug_backend`.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qplug_engine // L4: Plugin engine
//!     BackendKind // backend selection + lifecycle rules
//!     PluginConfig // session settings + per-run overrides
//!     Negotiator // effective gate/observable sets
//!     Session // engine lifecycle + execution
//!     Estimator // per-backend expectation values
//!     Templates // built-in circuits
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qplug_engine::prelude::*;
//!
//! let mut session = init_plugin("Simulator", PluginConfig::default()).unwrap();
//! let out = session.execute_template("demo_ev0", &[0.0, 0.0]).unwrap().unwrap();
//! assert!((out[0].value().unwrap() - 1.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Backend kinds (Gantree: L4_Engine → BackendKind)
pub mod backend_kind;

/// Plugin configuration (Gantree: L4_Engine → PluginConfig)
pub mod config;

/// Capability negotiation (Gantree: L4_Engine → Negotiator)
pub mod negotiator;

/// Expectation estimation (Gantree: L4_Engine → Estimator)
pub mod estimator;

/// Plugin session (Gantree: L4_Engine → Session)
pub mod session;

/// Built-in templates (Gantree: L4_Engine → Templates)
pub mod templates;

// ============================================================================
// Re-exports
// ============================================================================

pub use backend_kind::BackendKind;
pub use config::{EngineOverrides, PluginConfig};
pub use negotiator::{negotiate, Capabilities};
pub use session::{LiveEngine, Session, SessionState};

// ============================================================================
// Plugin Metadata
// ============================================================================

/// Plugin name
pub const PLUGIN_NAME: &str = "QPLUG";

/// Host plugin API version implemented
pub const PLUGIN_API_VERSION: &str = "0.1.0";

/// Plugin version
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Plugin author
pub const AUTHOR: &str = "QPLUG Contributors";

/// Plugin entry point: a session on the named backend.
///
/// The selector is checked before any engine is built, so an unknown name
/// fails with [`QplugError::UnknownBackend`](qplug_core::QplugError::UnknownBackend)
/// and nothing else happens.
pub fn init_plugin(backend: &str, config: PluginConfig) -> qplug_core::QplugResult<Session> {
    let kind: BackendKind = backend.parse()?;
    let session = Session::new(kind, config)?;
    log::info!("Initialized {}", session);
    Ok(session)
}

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qplug_engine::prelude::*;
    //! ```

    pub use crate::backend_kind::BackendKind;
    pub use crate::config::{EngineOverrides, PluginConfig};
    pub use crate::init_plugin;
    pub use crate::negotiator::Capabilities;
    pub use crate::session::{Session, SessionState};
    pub use qplug_core::prelude::*;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use approx::assert_relative_eq;
    use qplug_backend::JobStatus;

    fn bell_ev() -> CircuitTemplate {
        TemplateBuilder::new("bell_ev")
            .h(0)
            .cnot(0, 1)
            .expval_z(0)
            .expval_z(1)
            .output(&[1, 0])
            .build()
            .unwrap()
    }

    #[test]
    fn test_unknown_backend() {
        assert_eq!(
            init_plugin("bogus", PluginConfig::default()).unwrap_err(),
            QplugError::UnknownBackend("bogus".into())
        );
    }

    #[test]
    fn test_effective_sets_are_subsets() {
        for kind in BackendKind::ALL {
            let session = init_plugin(kind.name(), PluginConfig::default()).unwrap();
            assert!(session.capabilities().is_subset_of_catalog(), "{}", kind);
            assert!(!session.capabilities().supports_gate("Toffoli"));
        }
    }

    #[test]
    fn test_outputs_follow_out_order() {
        let mut session = init_plugin("Simulator", PluginConfig::default().with_seed(5)).unwrap();
        let out = session.execute_circuit(&bell_ev(), &[], true, None).unwrap().unwrap();
        assert_eq!(out.len(), 2);
        for e in &out {
            assert_relative_eq!(e.value().unwrap(), 0.0, epsilon = 1e-12);
            assert_relative_eq!(e.variance().unwrap(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_fresh_register_per_reset_run() {
        let mut session = init_plugin("Simulator", PluginConfig::default()).unwrap();
        for run in 1..=3 {
            session.execute_template("demo_ev1", &[0.5, 0.5]).unwrap();
            assert_eq!(session.generation(), run);
            assert_eq!(session.live().unwrap().generation(), run);
        }
        session.shutdown().unwrap();
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[test]
    fn test_classical_x_then_z() {
        let mut session = init_plugin("ClassicalSimulator", PluginConfig::default()).unwrap();
        let t = TemplateBuilder::new("flip")
            .x(0)
            .expval_z(0)
            .output(&[0])
            .build()
            .unwrap();
        let out = session.execute_circuit(&t, &[], true, None).unwrap().unwrap();
        assert_eq!(out, vec![Estimate::single(1.0, 0.0)]);
    }

    #[test]
    fn test_classical_cnot_swap() {
        let mut session = init_plugin("ClassicalSimulator", PluginConfig::default()).unwrap();
        let t = TemplateBuilder::new("classical")
            .x(0)
            .cnot(0, 1)
            .swap(1, 2)
            .expval_z(2)
            .output(&[2])
            .build()
            .unwrap();
        let out = session.execute_circuit(&t, &[], true, None).unwrap().unwrap();
        assert_eq!(out[0].value(), Some(1.0));
    }

    #[test]
    fn test_remote_runs_demo_with_forced_cnot() {
        let config = PluginConfig::default().with_num_runs(64);
        let mut session = init_plugin("RemoteBackend", config).unwrap();
        assert!(session.capabilities().supports_gate("CNOT"));

        let out = session.execute_template("demo_ev0", &[0.1, 0.2]).unwrap().unwrap();
        assert_eq!(out, vec![Estimate::single(0.0, 0.0)]);

        let ids = session.jobs().ids().unwrap();
        assert_eq!(ids.len(), 1);
        let job = session.jobs().get(&ids[0]).unwrap().unwrap();
        assert_eq!(job.shots, 64);
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn test_remote_second_measurement_fails() {
        let mut session = init_plugin("RemoteBackend", PluginConfig::default()).unwrap();
        let err = session.execute_circuit(&bell_ev(), &[], true, None).unwrap_err();
        assert_eq!(
            err,
            QplugError::MultipleMeasurement {
                backend: "RemoteBackend".into()
            }
        );
        assert_ne!(session.state(), SessionState::Computing);

        session.reset().unwrap();
        assert!(!session.is_measured());
    }

    #[test]
    fn test_remote_measure_uses_n_eval() {
        let mut session = init_plugin("RemoteBackend", PluginConfig::default()).unwrap();
        let t = TemplateBuilder::new("prep").rx(0, 0.3).build().unwrap();
        session.execute_circuit(&t, &[], true, None).unwrap();

        session.measure("Z", &[0], &[], 16).unwrap();
        let ids = session.jobs().ids().unwrap();
        assert_eq!(session.jobs().get(&ids[0]).unwrap().unwrap().shots, 16);
        assert!(session.measure("Z", &[0], &[], 0).is_err());
    }

    #[test]
    fn test_remote_rejects_unprobed_gates() {
        let mut session = init_plugin("RemoteBackend", PluginConfig::default()).unwrap();
        let t = TemplateBuilder::new("cz").cz(0, 1).build().unwrap();
        assert_eq!(
            session.execute_circuit(&t, &[], true, None).unwrap_err(),
            QplugError::unsupported("CZ", "RemoteBackend")
        );
    }

    #[test]
    fn test_gate_fusion_matches_plain() {
        let template = TemplateBuilder::new("mix")
            .rx(0, ParRef(0))
            .ry(1, ParRef(1))
            .crz(0, 1, ParRef(2))
            .h(1)
            .expval(&catalog::MEASURE_X, 1)
            .output(&[1])
            .build()
            .unwrap();
        let params = [0.4, 1.1, -0.6];

        let fusion = PluginConfig::default().with_gate_fusion(true);
        let mut fused = init_plugin("Simulator", fusion).unwrap();
        let mut plain = init_plugin("Simulator", PluginConfig::default()).unwrap();
        let a = fused.execute_circuit(&template, &params, true, None).unwrap().unwrap();
        let b = plain.execute_circuit(&template, &params, true, None).unwrap().unwrap();
        assert_relative_eq!(a[0].value().unwrap(), b[0].value().unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_parameter_rejected() {
        let mut session = init_plugin("Simulator", PluginConfig::default()).unwrap();
        let err = session
            .execute_template("demo", &[f64::INFINITY, 0.0])
            .unwrap_err();
        assert!(err.is_parameter_error());
    }
}
