//! Remote job records
//!
//! Gantree: L3_Backend → Job
//!
//! Every remote flush produces one [`JobRecord`] in a [`JobStore`]. The
//! store is a cheap clone handle so a session can keep it across engine
//! rebuilds and look up earlier jobs by id.

use chrono::{DateTime, Utc};
use qplug_core::{QplugError, QplugResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job is queued
    #[serde(alias = "queued", alias = "PENDING", alias = "pending")]
    Queued,

    /// Job is running
    #[serde(alias = "running")]
    Running,

    /// Job completed successfully
    #[serde(alias = "completed", alias = "DONE", alias = "done")]
    Completed,

    /// Job failed
    #[serde(alias = "failed", alias = "ERROR", alias = "error")]
    Failed,

    /// Job was cancelled
    #[serde(alias = "cancelled", alias = "CANCELED", alias = "canceled")]
    Cancelled,
}

impl JobStatus {
    /// Check if job is in terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if job completed successfully
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// One submitted program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job ID
    pub id: String,

    /// Target device
    pub device: String,

    /// Number of shots
    pub shots: u64,

    /// OpenQASM 2.0 program
    pub qasm: String,

    /// Current status
    pub status: JobStatus,

    /// Submission time
    pub submitted_at: DateTime<Utc>,

    /// Submitted to hardware rather than the remote simulator
    #[serde(default)]
    pub hardware: bool,
}

impl JobRecord {
    /// Serialize to JSON
    pub fn to_json(&self) -> QplugResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> QplugResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of measure instructions in the program
    pub fn num_measurements(&self) -> usize {
        self.qasm
            .lines()
            .filter(|l| l.trim_start().starts_with("measure"))
            .count()
    }
}

// ============================================================================
// Job Store
// ============================================================================

#[derive(Debug, Default)]
struct StoreInner {
    next_id: u64,
    jobs: BTreeMap<String, JobRecord>,
}

/// Shared in-process job store
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl JobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> QplugResult<MutexGuard<'_, StoreInner>> {
        self.inner
            .lock()
            .map_err(|_| QplugError::BackendError("job store lock poisoned".to_string()))
    }

    /// Record a new job and return it
    pub fn submit(
        &self,
        device: &str,
        shots: u64,
        qasm: String,
        hardware: bool,
    ) -> QplugResult<JobRecord> {
        let mut inner = self.lock()?;
        inner.next_id += 1;
        let record = JobRecord {
            id: format!("job-{:06}", inner.next_id),
            device: device.to_string(),
            shots,
            qasm,
            // No device behind the store: simulator jobs finish at once
            status: if hardware {
                JobStatus::Queued
            } else {
                JobStatus::Completed
            },
            submitted_at: Utc::now(),
            hardware,
        };
        inner.jobs.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    /// Look up a job by id
    pub fn get(&self, id: &str) -> QplugResult<Option<JobRecord>> {
        Ok(self.lock()?.jobs.get(id).cloned())
    }

    /// Update a job's status
    pub fn set_status(&self, id: &str, status: JobStatus) -> QplugResult<()> {
        let mut inner = self.lock()?;
        match inner.jobs.get_mut(id) {
            Some(job) => {
                job.status = status;
                Ok(())
            }
            None => Err(QplugError::BackendError(format!("unknown job '{}'", id))),
        }
    }

    /// All job ids, submission order
    pub fn ids(&self) -> QplugResult<Vec<String>> {
        Ok(self.lock()?.jobs.keys().cloned().collect())
    }

    /// Number of stored jobs
    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.jobs.len()).unwrap_or(0)
    }

    /// Check if no job was submitted
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Tests
// ============================================================================
