//! Static gate and observable catalog
//!
//! Gantree: L1_Circuit → Catalog
//!
//! The full declared catalog. A session's effective catalog is always a
//! subset of [`gates`] and [`observables`].

use crate::descriptor::GateDescriptor;
use crate::error::{QplugError, QplugResult};
use crate::operation::Operation;

// ============================================================================
// Constructors
// ============================================================================

fn angle(name: &str, params: &[f64]) -> QplugResult<f64> {
    params
        .first()
        .copied()
        .ok_or_else(|| QplugError::InvalidCommand(format!("{} needs an angle", name)))
}

fn h(_: &[f64]) -> QplugResult<Operation> {
    Ok(Operation::H)
}

fn x(_: &[f64]) -> QplugResult<Operation> {
    Ok(Operation::X)
}

fn y(_: &[f64]) -> QplugResult<Operation> {
    Ok(Operation::Y)
}

fn z(_: &[f64]) -> QplugResult<Operation> {
    Ok(Operation::Z)
}

fn s(_: &[f64]) -> QplugResult<Operation> {
    Ok(Operation::S)
}

fn t(_: &[f64]) -> QplugResult<Operation> {
    Ok(Operation::T)
}

fn sqrt_x(_: &[f64]) -> QplugResult<Operation> {
    Ok(Operation::SqrtX)
}

fn swap(_: &[f64]) -> QplugResult<Operation> {
    Ok(Operation::Swap)
}

fn sqrt_swap(_: &[f64]) -> QplugResult<Operation> {
    Ok(Operation::SqrtSwap)
}

fn rx(p: &[f64]) -> QplugResult<Operation> {
    angle("Rx", p).map(Operation::Rx)
}

fn ry(p: &[f64]) -> QplugResult<Operation> {
    angle("Ry", p).map(Operation::Ry)
}

fn rz(p: &[f64]) -> QplugResult<Operation> {
    angle("Rz", p).map(Operation::Rz)
}

fn phase(p: &[f64]) -> QplugResult<Operation> {
    angle("R", p).map(Operation::R)
}

fn crz(p: &[f64]) -> QplugResult<Operation> {
    angle("CRz", p).map(Operation::CRz)
}

// Composites: the simulation layer has no native class for these

fn cnot(_: &[f64]) -> QplugResult<Operation> {
    Ok(Operation::controlled(Operation::X, 1))
}

fn cz(_: &[f64]) -> QplugResult<Operation> {
    Ok(Operation::controlled(Operation::Z, 1))
}

fn toffoli(_: &[f64]) -> QplugResult<Operation> {
    Ok(Operation::controlled(Operation::X, 2))
}

fn all_z(_: &[f64]) -> QplugResult<Operation> {
    Ok(Operation::tensor(Operation::Z))
}

// ============================================================================
// Gates
// ============================================================================

/// Hadamard
pub static H: GateDescriptor = GateDescriptor::gate("H", 1, 0, h);
/// Pauli-X
pub static X: GateDescriptor = GateDescriptor::gate("X", 1, 0, x);
/// Pauli-Y
pub static Y: GateDescriptor = GateDescriptor::gate("Y", 1, 0, y);
/// Pauli-Z
pub static Z: GateDescriptor = GateDescriptor::gate("Z", 1, 0, z);
/// S gate
pub static S: GateDescriptor = GateDescriptor::gate("S", 1, 0, s);
/// T gate
pub static T: GateDescriptor = GateDescriptor::gate("T", 1, 0, t);
/// sqrt(X)
pub static SQRT_X: GateDescriptor = GateDescriptor::gate("SqrtX", 1, 0, sqrt_x);
/// SWAP
pub static SWAP: GateDescriptor = GateDescriptor::gate("Swap", 2, 0, swap);
/// sqrt(SWAP)
pub static SQRT_SWAP: GateDescriptor = GateDescriptor::gate("SqrtSwap", 2, 0, sqrt_swap);
/// X rotation
pub static RX: GateDescriptor = GateDescriptor::gate("Rx", 1, 1, rx);
/// Y rotation
pub static RY: GateDescriptor = GateDescriptor::gate("Ry", 1, 1, ry);
/// Z rotation
pub static RZ: GateDescriptor = GateDescriptor::gate("Rz", 1, 1, rz);
/// Phase shift (Rz up to a global phase)
pub static R: GateDescriptor = GateDescriptor::gate("R", 1, 1, phase);
/// Controlled Z rotation
pub static CRZ: GateDescriptor = GateDescriptor::gate("CRz", 2, 1, crz);
/// Controlled NOT
pub static CNOT: GateDescriptor = GateDescriptor::gate("CNOT", 2, 0, cnot);
/// Controlled Z
pub static CZ: GateDescriptor = GateDescriptor::gate("CZ", 2, 0, cz);
/// Z on every target qubit
pub static ALL_Z: GateDescriptor = GateDescriptor::gate("AllZ", 1, 0, all_z);
/// Doubly-controlled NOT. Defined but not part of [`gates`].
pub static TOFFOLI: GateDescriptor = GateDescriptor::gate("Toffoli", 3, 0, toffoli);

// ============================================================================
// Observables
// ============================================================================

/// Pauli-X expectation
pub static MEASURE_X: GateDescriptor = GateDescriptor::observable("X", 1, x);
/// Pauli-Y expectation
pub static MEASURE_Y: GateDescriptor = GateDescriptor::observable("Y", 1, y);
/// Pauli-Z expectation
pub static MEASURE_Z: GateDescriptor = GateDescriptor::observable("Z", 1, z);
/// Pauli-Z expectation on every register qubit
pub static MEASURE_ALL_Z: GateDescriptor = GateDescriptor::observable("AllZ", 1, all_z);

// ============================================================================
// Catalog Access
// ============================================================================

/// Full declared gate catalog, in declaration order
pub fn gates() -> Vec<&'static GateDescriptor> {
    vec![
        &H, &X, &Y, &Z, &S, &T, &SQRT_X, &SWAP, &SQRT_SWAP, &RX, &RY, &RZ, &R, &CRZ, &CNOT, &CZ,
        &ALL_Z,
    ]
}

/// Full declared observable catalog
pub fn observables() -> Vec<&'static GateDescriptor> {
    vec![&MEASURE_X, &MEASURE_Y, &MEASURE_Z, &MEASURE_ALL_Z]
}

/// Find a gate by name (including gates outside the default catalog)
pub fn lookup(name: &str) -> Option<&'static GateDescriptor> {
    gates()
        .into_iter()
        .chain(std::iter::once(&TOFFOLI))
        .find(|g| g.name() == name)
}

/// Find an observable by name
pub fn lookup_observable(name: &str) -> Option<&'static GateDescriptor> {
    observables().into_iter().find(|o| o.name() == name)
}

/// Largest arity in the gate catalog
pub fn max_arity() -> usize {
    gates().iter().map(|g| g.arity()).max().unwrap_or(1)
}

// ============================================================================
// Tests
// ============================================================================
