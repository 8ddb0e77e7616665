//! Plugin session
//!
//! Gantree: L4_Engine → Session
//!
//! A session owns at most one live engine/register pair and drives
//! circuit templates through it. The pair is created lazily, replaced
//! whenever the register size changes, and dropped by [`Session::reset`].
//!
//! ```text
//!   Uninitialized ──execute_circuit──→ Allocated ──execute_circuit──→ Computing
//!         ↑                                │  ↑                           │
//!         └────────────── reset ───────────┘  └──────── pass ends ────────┘
//! ```

use crate::backend_kind::BackendKind;
use crate::config::{EngineOverrides, PluginConfig};
use crate::estimator;
use crate::negotiator::{self, Capabilities};
use crate::templates;
use qplug_backend::JobStore;
use qplug_core::{
    CircuitTemplate, Engine, Estimate, QplugError, QplugResult, QubitId, Qureg,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Observable results of one pass, keyed by template target qubits
type Results = HashMap<Vec<QubitId>, Estimate>;

/// Derived session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No live engine
    Uninitialized,
    /// Engine and register allocated, idle
    Allocated,
    /// A circuit pass is running
    Computing,
}

/// Engine and the register allocated on it, created and dropped together
pub struct LiveEngine {
    pub(crate) engine: Box<dyn Engine>,
    pub(crate) qureg: Qureg,
    generation: u64,
}

impl LiveEngine {
    /// Allocated register
    pub fn qureg(&self) -> &Qureg {
        &self.qureg
    }

    /// Allocation counter value when this pair was created
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Backend name of the engine
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }
}

impl fmt::Debug for LiveEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveEngine")
            .field("engine", &self.engine.name())
            .field("qureg", &self.qureg)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Plugin session
/// Gantree: Session // engine lifecycle + execution
#[derive(Debug)]
pub struct Session {
    kind: BackendKind,
    config: PluginConfig,
    capabilities: Capabilities,
    live: Option<LiveEngine>,
    computing: bool,
    measured: bool,
    n_eval: u64,
    generation: u64,
    jobs: JobStore,
    templates: Vec<CircuitTemplate>,
}

impl Session {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a session for `kind`; the config's backend field is overwritten
    pub fn new(kind: BackendKind, config: PluginConfig) -> QplugResult<Self> {
        let config = config.with_backend(kind.name());
        config.validate()?;
        let capabilities = negotiator::negotiate(kind, &config)?;

        Ok(Self {
            kind,
            config,
            capabilities,
            live: None,
            computing: false,
            measured: false,
            n_eval: 0,
            generation: 0,
            jobs: JobStore::new(),
            templates: templates::builtin()?,
        })
    }

    /// Create a session for the backend named in `config`
    pub fn from_config(config: PluginConfig) -> QplugResult<Self> {
        let kind = config.backend_kind()?;
        Self::new(kind, config)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Backend kind
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Session configuration
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Effective catalogs
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Derived state
    pub fn state(&self) -> SessionState {
        match (&self.live, self.computing) {
            (None, _) => SessionState::Uninitialized,
            (Some(_), true) => SessionState::Computing,
            (Some(_), false) => SessionState::Allocated,
        }
    }

    /// Live engine/register pair, if allocated
    pub fn live(&self) -> Option<&LiveEngine> {
        self.live.as_ref()
    }

    /// Number of engines built so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check if the single allowed measurement was taken
    pub fn is_measured(&self) -> bool {
        self.measured
    }

    /// Sample count requested for the current estimate
    pub fn n_eval(&self) -> u64 {
        self.n_eval
    }

    /// Remote jobs submitted by this session
    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    pub(crate) fn live_mut(&mut self) -> Option<&mut LiveEngine> {
        self.live.as_mut()
    }

    // ========================================================================
    // Templates
    // ========================================================================

    /// Built-in templates
    pub fn templates(&self) -> &[CircuitTemplate] {
        &self.templates
    }

    /// Built-in template by name
    pub fn template(&self, name: &str) -> QplugResult<&CircuitTemplate> {
        self.templates
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| QplugError::InvalidCommand(format!("unknown template '{}'", name)))
    }

    /// Run a built-in template with a fresh register
    pub fn execute_template(
        &mut self,
        name: &str,
        params: &[f64],
    ) -> QplugResult<Option<Vec<Estimate>>> {
        let template = self.template(name)?.clone();
        self.execute_circuit(&template, params, true, None)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Drop the live pair, measuring first where the backend needs it.
    /// Safe to call any number of times.
    pub fn reset(&mut self) -> QplugResult<()> {
        self.computing = false;
        self.measured = false;

        let Some(mut live) = self.live.take() else {
            return Ok(());
        };

        while live.engine.in_compute() {
            live.engine.end_compute();
        }
        if self.kind.requires_deallocation_on_reset() {
            live.engine.flush(false)?;
            for &q in live.qureg.qubits() {
                live.engine.measure(q)?;
            }
        }
        live.engine.release()?;
        log::debug!(
            "Released {} qubit(s) on {} (generation {})",
            live.qureg.len(),
            self.kind,
            live.generation
        );
        Ok(())
    }

    /// Reset and log
    pub fn shutdown(&mut self) -> QplugResult<()> {
        self.reset()?;
        log::info!("{} shut down", self);
        Ok(())
    }

    fn ensure_allocated(
        &mut self,
        num_qubits: usize,
        overrides: Option<&EngineOverrides>,
    ) -> QplugResult<()> {
        if self
            .live
            .as_ref()
            .is_some_and(|live| live.qureg.len() == num_qubits)
        {
            return Ok(());
        }

        self.reset()?;
        let mut engine = self.kind.create_engine(&self.config, overrides, &self.jobs);
        let qureg = engine.allocate_qureg(num_qubits)?;
        self.generation += 1;
        log::info!(
            "Allocated {} qubit(s) on {} (generation {})",
            num_qubits,
            self.kind,
            self.generation
        );
        self.live = Some(LiveEngine {
            engine,
            qureg,
            generation: self.generation,
        });
        Ok(())
    }

    /// Run `f` inside one compute scope on the live engine. The scope is
    /// closed on every exit path unless `f` replaced the engine.
    fn with_compute<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> QplugResult<T>,
    ) -> QplugResult<T> {
        let generation = self.generation;
        if let Some(live) = self.live.as_mut() {
            live.engine.begin_compute();
        }

        let result = f(self);

        if self.generation == generation {
            if let Some(live) = self.live.as_mut() {
                live.engine.end_compute();
            }
        }
        result
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Execute a template and return the estimates of its outputs.
    ///
    /// Returns `Ok(None)` when the template declares no outputs.
    pub fn execute_circuit(
        &mut self,
        circuit: &CircuitTemplate,
        params: &[f64],
        reset: bool,
        overrides: Option<&EngineOverrides>,
    ) -> QplugResult<Option<Vec<Estimate>>> {
        if self.computing {
            return Err(QplugError::ExecutionInProgress);
        }
        if reset {
            self.reset()?;
        }
        self.ensure_allocated(circuit.num_qubits(), overrides)?;

        self.computing = true;
        let result = self.with_compute(|s| s.run_commands(circuit, params));
        self.computing = false;
        let results = result?;

        if circuit.out().is_empty() {
            return Ok(None);
        }
        circuit
            .out()
            .iter()
            .map(|&qubit| {
                results
                    .get(&vec![qubit])
                    .cloned()
                    .ok_or(QplugError::MissingOutput { qubit })
            })
            .collect::<QplugResult<Vec<_>>>()
            .map(Some)
    }

    fn run_commands(&mut self, circuit: &CircuitTemplate, params: &[f64]) -> QplugResult<Results> {
        let mut results = Results::new();
        let backend = self.kind.name();

        for command in circuit.commands() {
            let values = command.resolve_params(params)?;
            let name = command.name();

            if command.is_observable() {
                let observable = self
                    .capabilities
                    .observable(name)
                    .ok_or_else(|| QplugError::unsupported(name, backend))?;
                estimator::precheck(self, observable)?;
                let qubits = self.map_qubits(name, command.qubits())?;
                log::debug!("estimate {} on {:?}", name, qubits);
                let estimate = estimator::estimate(self, observable, &qubits)?;
                results.insert(command.qubits().to_vec(), estimate);
            } else {
                let gate = self
                    .capabilities
                    .gate(name)
                    .ok_or_else(|| QplugError::unsupported(name, backend))?;
                let live = self
                    .live
                    .as_mut()
                    .ok_or_else(|| QplugError::no_engine(name))?;
                let qubits = live.qureg.map(command.qubits())?;
                log::debug!("apply {} {:?} on {:?}", name, values, qubits);
                gate.apply(&values, &qubits, Some(live.engine.as_mut()))?;
            }
        }

        Ok(results)
    }

    fn map_qubits(&self, name: &str, indices: &[usize]) -> QplugResult<Vec<QubitId>> {
        self.live
            .as_ref()
            .ok_or_else(|| QplugError::no_engine(name))?
            .qureg
            .map(indices)
    }

    /// Estimate one observable against the live register
    pub fn measure(
        &mut self,
        observable: &str,
        qubits: &[usize],
        params: &[f64],
        n_eval: u64,
    ) -> QplugResult<Estimate> {
        let descriptor = self
            .capabilities
            .observable(observable)
            .ok_or_else(|| QplugError::unsupported(observable, self.kind.name()))?;
        if params.len() != descriptor.param_count() {
            return Err(QplugError::InvalidCommand(format!(
                "{} takes {} parameter(s), got {}",
                observable,
                descriptor.param_count(),
                params.len()
            )));
        }
        estimator::precheck(self, descriptor)?;
        let mapped = self.map_qubits(observable, qubits)?;

        let saved = std::mem::replace(&mut self.n_eval, n_eval);
        let result = estimator::estimate(self, descriptor, &mapped);
        self.n_eval = saved;
        result
    }

    /// Replace the live pair with a freshly sampled identity circuit on
    /// `num_qubits` qubits and submit it, then mark the session measured.
    /// The submitted pair is dropped, leaving the session uninitialized.
    pub(crate) fn resample(&mut self, num_qubits: usize) -> QplugResult<()> {
        let computing = self.computing;
        let result = self.resample_inner(num_qubits);
        self.computing = computing;
        result
    }

    fn resample_inner(&mut self, num_qubits: usize) -> QplugResult<()> {
        self.reset()?;

        let overrides = (self.n_eval > 0)
            .then(|| EngineOverrides::default().with_num_runs(self.n_eval));
        let identity = templates::identity(num_qubits)?;
        self.execute_circuit(&identity, &[], false, overrides.as_ref())?;

        // Submitting deallocates the engine's qubits, so the pair goes with it
        let mut live = self
            .live
            .take()
            .ok_or_else(|| QplugError::no_engine("identity"))?;
        live.engine.flush(true)?;
        log::debug!(
            "Submitted {} qubit(s) on {} (generation {})",
            live.qureg.len(),
            self.kind,
            live.generation
        );
        self.measured = true;
        Ok(())
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (backend: {})",
            crate::PLUGIN_NAME,
            crate::PLUGIN_API_VERSION,
            self.kind
        )
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.reset() {
            log::warn!("Reset of {} failed while dropping session: {}", self.kind, e);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qplug_core::{catalog, ParRef, TemplateBuilder};

    fn session(backend: &str) -> Session {
        Session::from_config(PluginConfig::for_backend(backend).with_seed(11)).unwrap()
    }

    #[test]
    fn test_fresh_session_is_uninitialized() {
        let s = session("Simulator");
        assert_eq!(s.state(), SessionState::Uninitialized);
        assert_eq!(s.generation(), 0);
        assert!(s.to_string().contains("Simulator"));
    }

    #[test]
    fn test_demo_ev_statevector() {
        let mut s = session("Simulator");
        let out = s.execute_template("demo_ev0", &[0.0, 0.0]).unwrap().unwrap();
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].value().unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(out[0].variance().unwrap(), 0.0, epsilon = 1e-12);
        assert_eq!(s.state(), SessionState::Allocated);
    }

    #[test]
    fn test_demo_ev_rotation() {
        let mut s = session("Simulator");
        let theta = 0.9;
        let out = s.execute_template("demo_ev0", &[theta, 0.4]).unwrap().unwrap();
        assert_relative_eq!(out[0].value().unwrap(), theta.cos(), epsilon = 1e-12);
        assert_relative_eq!(
            out[0].variance().unwrap(),
            1.0 - theta.cos().powi(2),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_no_outputs_returns_none() {
        let mut s = session("Simulator");
        assert!(s.execute_template("demo", &[0.1, 0.2]).unwrap().is_none());
    }

    #[test]
    fn test_unbound_parameter() {
        let mut s = session("Simulator");
        let err = s.execute_template("demo", &[0.1]).unwrap_err();
        assert_eq!(
            err,
            QplugError::UnboundParameter {
                index: 1,
                available: 1
            }
        );
        assert_ne!(s.state(), SessionState::Computing);
    }

    #[test]
    fn test_unsupported_gate_names_backend() {
        let mut s = session("ClassicalSimulator");
        let t = TemplateBuilder::new("h").h(0).build().unwrap();
        let err = s.execute_circuit(&t, &[], true, None).unwrap_err();
        assert_eq!(err, QplugError::unsupported("H", "ClassicalSimulator"));
        assert_ne!(s.state(), SessionState::Computing);
        assert!(!s.live().unwrap().engine.in_compute());
    }

    #[test]
    fn test_missing_output() {
        let mut s = session("Simulator");
        let t = TemplateBuilder::new("no_ev")
            .h(0)
            .h(1)
            .output(&[1])
            .build()
            .unwrap();
        assert_eq!(
            s.execute_circuit(&t, &[], true, None).unwrap_err(),
            QplugError::MissingOutput { qubit: 1 }
        );
    }

    #[test]
    fn test_register_resized() {
        let mut s = session("Simulator");
        s.execute_template("demo", &[0.0, 0.0]).unwrap();
        assert_eq!(s.live().unwrap().qureg().len(), 2);

        let t = TemplateBuilder::new("three").x(2).build().unwrap();
        s.execute_circuit(&t, &[], false, None).unwrap();
        assert_eq!(s.live().unwrap().qureg().len(), 3);
        assert_eq!(s.generation(), 2);
    }

    #[test]
    fn test_same_size_reuses_engine() {
        let mut s = session("Simulator");
        let t = demo_ev_z(1);
        s.execute_circuit(&t, &[0.0, 0.0], false, None).unwrap();
        s.execute_circuit(&t, &[0.0, 0.0], false, None).unwrap();
        assert_eq!(s.generation(), 1);

        s.execute_circuit(&t, &[0.0, 0.0], true, None).unwrap();
        assert_eq!(s.generation(), 2);
    }

    #[test]
    fn test_execution_in_progress() {
        let mut s = session("Simulator");
        s.execute_template("demo", &[0.1, 0.2]).unwrap();
        s.computing = true;
        assert_eq!(s.state(), SessionState::Computing);

        let t = demo_ev_z(0);
        assert_eq!(
            s.execute_circuit(&t, &[0.0, 0.0], true, None).unwrap_err(),
            QplugError::ExecutionInProgress
        );
        assert_eq!(s.state(), SessionState::Computing);
        assert_eq!(s.generation(), 1);
        assert_eq!(s.live().unwrap().generation(), 1);
        assert_eq!(s.live().unwrap().qureg().len(), 2);
    }

    #[test]
    fn test_remote_rerun_after_measure() {
        let mut s = session("RemoteBackend");
        let prep = TemplateBuilder::new("prep").rx(0, 0.3).build().unwrap();
        s.execute_circuit(&prep, &[], true, None).unwrap();

        s.measure("Z", &[0], &[], 0).unwrap();
        assert!(s.is_measured());
        assert_eq!(s.state(), SessionState::Uninitialized);
        assert!(s.live().is_none());

        s.execute_circuit(&prep, &[], false, None).unwrap();
        assert_eq!(s.state(), SessionState::Allocated);
        assert_eq!(s.live().unwrap().qureg().len(), 1);
        assert_eq!(s.generation(), 3);
        assert_eq!(s.jobs().len(), 1);
    }

    fn demo_ev_z(qubit: usize) -> CircuitTemplate {
        TemplateBuilder::new("ev")
            .rx(0, ParRef(0))
            .rx(1, ParRef(1))
            .cnot(0, 1)
            .expval(&catalog::MEASURE_Z, qubit)
            .output(&[qubit])
            .build()
            .unwrap()
    }

    #[test]
    fn test_reset_idempotent() {
        let mut s = session("Simulator");
        s.execute_template("demo", &[0.3, 0.4]).unwrap();
        s.reset().unwrap();
        assert_eq!(s.state(), SessionState::Uninitialized);
        s.reset().unwrap();
        assert_eq!(s.state(), SessionState::Uninitialized);
    }

    #[test]
    fn test_measure_outside_circuit() {
        let mut s = session("Simulator");
        s.execute_template("demo", &[std::f64::consts::PI, 0.0]).unwrap();
        let e = s.measure("Z", &[1], &[], 5).unwrap();
        assert_relative_eq!(e.value().unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(s.n_eval(), 0);

        assert!(s.measure("Z", &[5], &[], 0).is_err());
        assert!(s.measure("Z", &[0], &[1.0], 0).is_err());
        assert!(s.measure("Bogus", &[0], &[], 0).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_measure_without_engine() {
        let mut s = session("Simulator");
        assert_eq!(
            s.measure("Z", &[0], &[], 0).unwrap_err(),
            QplugError::no_engine("Z")
        );
    }

    #[test]
    fn test_overrides_apply_to_new_engine() {
        let mut fused = session("Simulator");
        let mut plain = session("Simulator");
        let t = demo_ev_z(1);
        let overrides = EngineOverrides::default().with_gate_fusion(true);

        let a = fused
            .execute_circuit(&t, &[0.7, 0.2], true, Some(&overrides))
            .unwrap()
            .unwrap();
        let b = plain.execute_circuit(&t, &[0.7, 0.2], true, None).unwrap().unwrap();
        assert_relative_eq!(a[0].value().unwrap(), b[0].value().unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_template() {
        let mut s = session("Simulator");
        assert!(s.execute_template("demo_ev", &[]).is_err());
        assert_eq!(s.templates().len(), 3);
    }
}
