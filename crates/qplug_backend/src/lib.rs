//! # QPLUG Backend
//!
//! Execution engines behind the [`qplug_core::Engine`] contract.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qplug_backend // L3: Backend engines
//!     StateVectorEngine // dense amplitudes, analytic expectation values
//!     ClassicalEngine // bit vector, reversible classical gates
//!     RemoteEngine // QASM buffer + job submission
//!         Job // JobRecord, JobStore
//!         Credentials // user/password with env fallback
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qplug_backend::prelude::*;
//!
//! let mut engine = StateVectorEngine::new().with_seed(42);
//! let reg = engine.allocate_qureg(2).unwrap();
//!
//! engine.apply(&Operation::H, &[reg.qubits()[0]]).unwrap();
//! engine.apply(&Operation::controlled(Operation::X, 1), reg.qubits()).unwrap();
//!
//! let zz = engine.expectation_value(Pauli::Z, 1).unwrap();
//! assert!(zz.abs() < 1e-12);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// State-vector engine (Gantree: L3_Backend → StateVectorEngine)
pub mod statevector;

/// Classical engine (Gantree: L3_Backend → ClassicalEngine)
pub mod classical;

/// Remote engine (Gantree: L3_Backend → RemoteEngine)
pub mod remote;

/// Remote job records (Gantree: L3_Backend → Job)
pub mod job;

/// Remote credentials (Gantree: L3_Backend → Credentials)
pub mod credentials;

// ============================================================================
// Re-exports
// ============================================================================

pub use classical::{ClassicalEngine, CLASSICAL_NAME};
pub use credentials::RemoteCredentials;
pub use job::{JobRecord, JobStatus, JobStore};
pub use remote::{RemoteEngine, RemoteOptions, REMOTE_NAME};
pub use statevector::{StateVectorEngine, STATEVECTOR_NAME};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qplug_backend::prelude::*;
    //! ```

    pub use crate::classical::ClassicalEngine;
    pub use crate::credentials::RemoteCredentials;
    pub use crate::job::{JobRecord, JobStatus, JobStore};
    pub use crate::remote::{RemoteEngine, RemoteOptions};
    pub use crate::statevector::StateVectorEngine;
    pub use qplug_core::{Engine, Operation, Pauli, Qureg};
}

// ============================================================================
// Integration Tests
// ============================================================================
