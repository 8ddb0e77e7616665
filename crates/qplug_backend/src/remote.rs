//! Remote hardware engine for QPLUG
//!
//! Gantree: L3_Backend → RemoteEngine
//!
//! Buffers operations into an OpenQASM 2.0 program and submits it as one
//! job on flush. No numeric result comes back through the engine; callers
//! read the job record instead.
//!
//! `is_available` answers for uncontrolled native gates only, so probing
//! reports every controlled form as unsupported even though `apply`
//! accepts a single-control X as `cx`.

use crate::credentials::RemoteCredentials;
use crate::job::{JobRecord, JobStore};
use qplug_core::{Engine, Operation, QplugError, QplugResult, QubitId, Qureg};
use serde::{Deserialize, Serialize};

/// Backend name reported in errors
pub const REMOTE_NAME: &str = "RemoteBackend";

/// Default target device
pub const DEFAULT_DEVICE: &str = "ibmqx4";

/// Default number of shots
pub const DEFAULT_NUM_RUNS: u64 = 1024;

/// Remote submission options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOptions {
    /// Submit to hardware instead of the remote simulator
    pub use_hardware: bool,

    /// Shots per job
    pub num_runs: u64,

    /// Log submitted programs
    pub verbose: bool,

    /// Target device
    pub device: String,

    /// Fetch this earlier job instead of submitting
    pub retrieve_execution: Option<String>,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            use_hardware: false,
            num_runs: DEFAULT_NUM_RUNS,
            verbose: true,
            device: DEFAULT_DEVICE.to_string(),
            retrieve_execution: None,
        }
    }
}

/// Remote engine
/// Gantree: RemoteEngine // QASM buffer + job submission
#[derive(Debug)]
pub struct RemoteEngine {
    options: RemoteOptions,
    credentials: Option<RemoteCredentials>,
    jobs: JobStore,
    num_qubits: usize,
    program: Vec<String>,
    measured: Vec<bool>,
    compute_depth: usize,
    last_job: Option<JobRecord>,
}

impl RemoteEngine {
    /// Create an engine that submits into `jobs`
    pub fn new(options: RemoteOptions, jobs: JobStore) -> Self {
        Self {
            options,
            credentials: None,
            jobs,
            num_qubits: 0,
            program: Vec::new(),
            measured: Vec::new(),
            compute_depth: 0,
            last_job: None,
        }
    }

    /// Attach credentials
    pub fn with_credentials(mut self, credentials: Option<RemoteCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Submission options
    pub fn options(&self) -> &RemoteOptions {
        &self.options
    }

    /// Most recent submitted or retrieved job
    pub fn last_job(&self) -> Option<&JobRecord> {
        self.last_job.as_ref()
    }

    /// Shared job store
    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    /// Buffered instructions
    pub fn program(&self) -> &[String] {
        &self.program
    }

    fn check_qubit(&self, qubit: QubitId) -> QplugResult<()> {
        if qubit >= self.num_qubits {
            return Err(QplugError::QubitOutOfRange {
                qubit,
                max: self.num_qubits,
            });
        }
        Ok(())
    }

    fn push_measure(&mut self, qubit: QubitId) {
        self.program
            .push(format!("measure q[{}] -> c[{}];", qubit, qubit));
        self.measured[qubit] = true;
    }

    fn render(&self) -> String {
        let mut lines = vec![
            "OPENQASM 2.0;".to_string(),
            "include \"qelib1.inc\";".to_string(),
            format!("qreg q[{}];", self.num_qubits),
            format!("creg c[{}];", self.num_qubits),
        ];
        lines.extend(self.program.iter().cloned());
        lines.join("\n")
    }

    fn run(&mut self) -> QplugResult<()> {
        if let Some(id) = self.options.retrieve_execution.clone() {
            let job = self.jobs.get(&id)?.ok_or_else(|| {
                QplugError::BackendError(format!("no stored execution with id '{}'", id))
            })?;
            log::info!("Retrieved execution {} ({:?})", job.id, job.status);
            self.last_job = Some(job);
            self.program.clear();
            return Ok(());
        }

        if self.options.use_hardware && self.credentials.is_none() {
            return Err(QplugError::ConfigError(
                "hardware execution requires a user and password".to_string(),
            ));
        }

        let qasm = self.render();
        if self.options.verbose {
            log::debug!("Submitting program:\n{}", qasm);
        }
        let job = self.jobs.submit(
            &self.options.device,
            self.options.num_runs,
            qasm,
            self.options.use_hardware,
        )?;
        log::info!(
            "Submitted job {} to {} ({} shots, hardware: {})",
            job.id,
            job.device,
            job.shots,
            job.hardware
        );
        self.last_job = Some(job);
        self.program.clear();
        Ok(())
    }
}

impl Engine for RemoteEngine {
    fn name(&self) -> &str {
        REMOTE_NAME
    }

    fn allocate_qureg(&mut self, n: usize) -> QplugResult<Qureg> {
        let start = self.num_qubits;
        self.num_qubits += n;
        self.measured.resize(self.num_qubits, false);
        Ok(Qureg::new((start..self.num_qubits).collect()))
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
        let native = matches!(
            op,
            Operation::H
                | Operation::X
                | Operation::Y
                | Operation::Z
                | Operation::S
                | Operation::T
                | Operation::Rx(_)
                | Operation::Ry(_)
                | Operation::Rz(_)
        );
        native && op.check_qubits(qubits).is_ok()
    }

    fn apply(&mut self, op: &Operation, qubits: &[QubitId]) -> QplugResult<()> {
        for &q in qubits {
            self.check_qubit(q)?;
        }
        let cx = *op == Operation::controlled(Operation::X, 1);
        if !cx && !self.is_available(op, qubits) {
            return Err(QplugError::unsupported(op.name(), REMOTE_NAME));
        }
        self.program.push(op.to_qasm(qubits)?);
        Ok(())
    }

    fn measure(&mut self, qubit: QubitId) -> QplugResult<bool> {
        self.check_qubit(qubit)?;
        self.push_measure(qubit);
        // Outcome only exists in the job result
        Ok(false)
    }

    fn flush(&mut self, deallocate_qubits: bool) -> QplugResult<()> {
        if deallocate_qubits {
            for q in 0..self.num_qubits {
                if !self.measured[q] {
                    self.push_measure(q);
                }
            }
        }
        if !self.program.is_empty() {
            self.run()?;
        }
        if deallocate_qubits {
            self.release()?;
        }
        Ok(())
    }

    fn release(&mut self) -> QplugResult<()> {
        self.num_qubits = 0;
        self.measured.clear();
        self.program.clear();
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;

    fn engine(options: RemoteOptions) -> (RemoteEngine, JobStore) {
        let jobs = JobStore::new();
        (RemoteEngine::new(options, jobs.clone()), jobs)
    }

    #[test]
    fn test_probe_quirk() {
        let (e, _) = engine(RemoteOptions::default());
        assert!(e.is_available(&Operation::Rx(0.1), &[0]));
        assert!(e.is_available(&Operation::H, &[0]));
        assert!(!e.is_available(&Operation::controlled(Operation::X, 1), &[0, 1]));
        assert!(!e.is_available(&Operation::Swap, &[0, 1]));
    }

    #[test]
    fn test_cx_still_applies() {
        let (mut e, _) = engine(RemoteOptions::default());
        e.allocate_qureg(2).unwrap();
        e.apply(&Operation::controlled(Operation::X, 1), &[0, 1]).unwrap();
        assert_eq!(e.program(), &["cx q[0],q[1];".to_string()]);
        assert!(e.apply(&Operation::Swap, &[0, 1]).is_err());
    }

    #[test]
    fn test_flush_submits_job() {
        let (mut e, jobs) = engine(RemoteOptions {
            num_runs: 100,
            ..RemoteOptions::default()
        });
        e.allocate_qureg(2).unwrap();
        e.apply(&Operation::Rx(0.0), &[0]).unwrap();
        e.apply(&Operation::Rx(0.0), &[1]).unwrap();
        e.flush(true).unwrap();

        let job = e.last_job().unwrap();
        assert_eq!(job.shots, 100);
        assert_eq!(job.device, DEFAULT_DEVICE);
        assert_eq!(job.num_measurements(), 2);
        assert!(job.qasm.contains("qreg q[2];"));
        assert_eq!(jobs.len(), 1);
        assert!(e.program().is_empty());
    }

    #[test]
    fn test_empty_flush_is_noop() {
        let (mut e, jobs) = engine(RemoteOptions::default());
        e.flush(false).unwrap();
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_retrieve_execution() {
        let jobs = JobStore::new();
        let stored = jobs.submit("ibmqx4", 8, "x q[0];".into(), true).unwrap();

        let options = RemoteOptions {
            retrieve_execution: Some(stored.id.clone()),
            ..RemoteOptions::default()
        };
        let mut e = RemoteEngine::new(options, jobs.clone());
        e.allocate_qureg(1).unwrap();
        e.flush(true).unwrap();

        assert_eq!(e.last_job().unwrap().id, stored.id);
        assert_eq!(e.last_job().unwrap().status, JobStatus::Queued);
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_hardware_needs_credentials() {
        let options = RemoteOptions {
            use_hardware: true,
            ..RemoteOptions::default()
        };
        let (mut e, _) = engine(options.clone());
        e.allocate_qureg(1).unwrap();
        assert!(matches!(e.flush(true), Err(QplugError::ConfigError(_))));

        let mut e = RemoteEngine::new(options, JobStore::new())
            .with_credentials(Some(RemoteCredentials::new("u", "p")));
        e.allocate_qureg(1).unwrap();
        e.flush(true).unwrap();
        assert!(e.last_job().unwrap().hardware);
    }
}
