//! # QPLUG Core
//!
//! Gate descriptors, circuit templates, and the engine contract for
//! backend-abstracted execution of parametrized quantum circuits.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qplug_core // L0+L1+L2: Foundation + Circuit + Contract
//!     L0_Foundation // base types and errors
//!         CoreTypes // ParRef, Parameter, Estimate, Pauli
//!         Errors // QplugError
//!     L1_Circuit // operations and templates
//!         Operation // resolved gate values
//!         GateDescriptor // static metadata + factory
//!         Catalog // declared gates and observables
//!         CircuitTemplate // named command sequence
//!         TemplateBuilder // builder pattern
//!     L2_Contract // backend collaborator
//!         Engine // opaque engine trait
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qplug_core::prelude::*;
//!
//! let template = TemplateBuilder::new("demo")
//!     .rx(0, ParRef(0))
//!     .rx(1, ParRef(1))
//!     .cnot(0, 1)
//!     .expval_z(0)
//!     .output(&[0])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(template.num_qubits(), 2);
//! assert_eq!(template.num_parameters(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types (Gantree: L0_Foundation → CoreTypes)
pub mod types;

/// Error types (Gantree: L0_Foundation → Errors)
pub mod error;

/// Backend operations (Gantree: L1_Circuit → Operation)
pub mod operation;

/// Gate and observable descriptors (Gantree: L1_Circuit → GateDescriptor)
pub mod descriptor;

/// Declared catalog (Gantree: L1_Circuit → Catalog)
pub mod catalog;

/// Circuit templates (Gantree: L1_Circuit → CircuitTemplate)
pub mod circuit;

/// Template builder (Gantree: L1_Circuit → TemplateBuilder)
pub mod builder;

/// Engine contract (Gantree: L2_Contract → Engine)
pub mod engine;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::TemplateBuilder;
pub use circuit::{CircuitTemplate, Command};
pub use descriptor::{Constructor, GateDescriptor, Role};
pub use engine::{ComputeGuard, Engine, Qureg};
pub use error::{QplugError, QplugResult, NO_ENGINE};
pub use operation::Operation;
pub use types::{
    Angle, Estimate, GradMethod, ParRef, ParamDomain, ParamVec, Parameter, Pauli, QubitId,
};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qplug_core::prelude::*;
    //! ```

    pub use crate::builder::TemplateBuilder;
    pub use crate::catalog;
    pub use crate::circuit::{CircuitTemplate, Command};
    pub use crate::descriptor::{GateDescriptor, Role};
    pub use crate::engine::{ComputeGuard, Engine, Qureg};
    pub use crate::error::{QplugError, QplugResult};
    pub use crate::operation::Operation;
    pub use crate::types::{
        Angle, Estimate, GradMethod, ParRef, ParamDomain, ParamVec, Parameter, Pauli, QubitId,
    };
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================
