//! Gate and observable descriptors
//!
//! Gantree: L1_Circuit → GateDescriptor
//!
//! A descriptor is static metadata (name, arity, parameter count, domain,
//! gradient tag, role) plus a plain factory function that turns resolved
//! parameters into an [`Operation`]. Composite gates are expressed purely
//! by which factory the descriptor holds, so synthesis is settled when the
//! descriptor is defined and never per call.

use crate::engine::Engine;
use crate::error::{QplugError, QplugResult};
use crate::operation::Operation;
use crate::types::{GradMethod, ParamDomain, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Factory from resolved parameters to a backend operation
pub type Constructor = fn(&[f64]) -> QplugResult<Operation>;

/// Whether a descriptor changes state or is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// State-changing gate
    Gate,
    /// Measurement-only observable
    Observable,
}

/// Gate or observable descriptor
/// Gantree: GateDescriptor // static metadata + factory
#[derive(Debug, Clone, Copy)]
pub struct GateDescriptor {
    name: &'static str,
    arity: usize,
    param_count: usize,
    param_domain: ParamDomain,
    grad_method: GradMethod,
    role: Role,
    constructor: Constructor,
}

impl GateDescriptor {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// State-changing gate with real parameters
    pub const fn gate(
        name: &'static str,
        arity: usize,
        param_count: usize,
        constructor: Constructor,
    ) -> Self {
        Self {
            name,
            arity,
            param_count,
            param_domain: ParamDomain::Real,
            grad_method: GradMethod::Finite,
            role: Role::Gate,
            constructor,
        }
    }

    /// Measurement-only observable without parameters
    pub const fn observable(name: &'static str, arity: usize, constructor: Constructor) -> Self {
        Self {
            name,
            arity,
            param_count: 0,
            param_domain: ParamDomain::Real,
            grad_method: GradMethod::Finite,
            role: Role::Observable,
            constructor,
        }
    }

    /// Override the parameter domain
    pub const fn with_domain(mut self, domain: ParamDomain) -> Self {
        self.param_domain = domain;
        self
    }

    /// Override the gradient tag
    pub const fn with_grad_method(mut self, grad_method: GradMethod) -> Self {
        self.grad_method = grad_method;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Descriptor name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of qubits touched
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Number of parameters
    pub fn param_count(&self) -> usize {
        self.param_count
    }

    /// Parameter domain
    pub fn param_domain(&self) -> ParamDomain {
        self.param_domain
    }

    /// Gradient tag
    pub fn grad_method(&self) -> GradMethod {
        self.grad_method
    }

    /// Gate or observable
    pub fn role(&self) -> Role {
        self.role
    }

    /// Check if descriptor is measurement-only
    pub fn is_observable(&self) -> bool {
        self.role == Role::Observable
    }

    // ========================================================================
    // Construction / Application
    // ========================================================================

    /// Validate parameters and build the backend operation
    pub fn build(&self, params: &[f64]) -> QplugResult<Operation> {
        if params.len() != self.param_count {
            return Err(QplugError::InvalidCommand(format!(
                "{} takes {} parameter(s), got {}",
                self.name,
                self.param_count,
                params.len()
            )));
        }
        for (position, &value) in params.iter().enumerate() {
            self.param_domain.check(self.name, position, value)?;
        }
        (self.constructor)(params)
    }

    /// Issue one state-changing operation to the live engine
    pub fn apply<E>(
        &self,
        params: &[f64],
        qubits: &[QubitId],
        engine: Option<&mut E>,
    ) -> QplugResult<()>
    where
        E: Engine + ?Sized,
    {
        let engine = engine.ok_or_else(|| QplugError::no_engine(self.name))?;
        if qubits.len() != self.arity {
            return Err(QplugError::InvalidCommand(format!(
                "{} acts on {} qubit(s), got {}",
                self.name,
                self.arity,
                qubits.len()
            )));
        }
        let op = self.build(params)?;
        engine.apply(&op, qubits)
    }
}

impl PartialEq for GateDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.role == other.role
            && self.arity == other.arity
            && self.param_count == other.param_count
    }
}

impl fmt::Display for GateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self.role {
            Role::Gate => "gate",
            Role::Observable => "observable",
        };
        write!(
            f,
            "{} {}({} qubit(s), {} param(s))",
            role, self.name, self.arity, self.param_count
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
