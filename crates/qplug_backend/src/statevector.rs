//! State-vector engine for QPLUG
//!
//! Gantree: L3_Backend → StateVectorEngine
//!
//! Dense amplitude simulation with analytic Pauli expectation values.
//! With gate fusion enabled, operations are buffered until the next
//! flush and expectation queries are refused while the buffer is non-empty.

use num_complex::Complex64;
use qplug_core::{Engine, Operation, Pauli, QplugError, QplugResult, QubitId, Qureg};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Backend name reported in errors
pub const STATEVECTOR_NAME: &str = "Simulator";

/// Largest register the engine will allocate
pub const MAX_QUBITS: usize = 24;

/// Probability below which a qubit counts as classical
const CLASSICAL_EPS: f64 = 1e-10;

type Matrix2 = [[Complex64; 2]; 2];

/// State-vector engine
/// Gantree: StateVectorEngine // dense amplitudes
pub struct StateVectorEngine {
    /// Amplitudes, qubit `q` is bit `q` of the index
    state: Vec<Complex64>,

    /// Allocated qubits
    num_qubits: usize,

    /// Buffer operations until flush
    gate_fusion: bool,

    /// Operations waiting for the next flush
    pending: Vec<(Operation, Vec<QubitId>)>,

    /// Open compute scopes
    compute_depth: usize,

    /// Measurement RNG
    rng: StdRng,

    /// Seed used for the RNG, if any
    seed: Option<u64>,
}

impl StateVectorEngine {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create an empty engine with an entropy-seeded RNG
    pub fn new() -> Self {
        Self {
            state: vec![Complex64::new(1.0, 0.0)],
            num_qubits: 0,
            gate_fusion: false,
            pending: Vec::new(),
            compute_depth: 0,
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Set seed for reproducible measurements
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.seed = Some(seed);
        self
    }

    /// Enable or disable gate fusion
    pub fn with_gate_fusion(mut self, gate_fusion: bool) -> Self {
        self.gate_fusion = gate_fusion;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Allocated qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Seed in use, if any
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Check if gate fusion is on
    pub fn gate_fusion(&self) -> bool {
        self.gate_fusion
    }

    /// Operations waiting for flush
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Current amplitudes
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.state
    }

    /// Probability that `qubit` reads 1
    pub fn probability_one(&self, qubit: QubitId) -> QplugResult<f64> {
        self.check_qubit(qubit)?;
        let mask = 1 << qubit;
        Ok(self
            .state
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum())
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

    fn is_classical(&self, qubit: QubitId) -> QplugResult<bool> {
        let p1 = self.probability_one(qubit)?;
        Ok(p1 <= CLASSICAL_EPS || p1 >= 1.0 - CLASSICAL_EPS)
    }

    // ========================================================================
    // Gate Application
    // ========================================================================

    fn flush_pending(&mut self) -> QplugResult<()> {
        for (op, qubits) in std::mem::take(&mut self.pending) {
            self.apply_now(&op, &qubits)?;
        }
        Ok(())
    }

    fn apply_now(&mut self, op: &Operation, qubits: &[QubitId]) -> QplugResult<()> {
        if let Some(m) = single_qubit_matrix(op) {
            self.apply_matrix(qubits[0], &m);
            return Ok(());
        }

        match op {
            Operation::Swap => self.apply_swap(qubits[0], qubits[1]),
            Operation::SqrtSwap => self.apply_sqrt_swap(qubits[0], qubits[1]),
            Operation::CRz(theta) => {
                self.apply_controlled(&qubits[..1], qubits[1], &rz(*theta));
            }
            Operation::Controlled { base, controls } => {
                let m = single_qubit_matrix(base).ok_or_else(|| unsupported(op))?;
                self.apply_controlled(&qubits[..*controls], qubits[*controls], &m);
            }
            Operation::Tensor(base) => {
                let m = single_qubit_matrix(base).ok_or_else(|| unsupported(op))?;
                for &q in qubits {
                    self.apply_matrix(q, &m);
                }
            }
            _ => return Err(unsupported(op)),
        }
        Ok(())
    }

    fn apply_matrix(&mut self, q: QubitId, m: &Matrix2) {
        let mask = 1 << q;
        for i in 0..self.state.len() {
            if i & mask == 0 {
                let j = i | mask;
                let (a, b) = (self.state[i], self.state[j]);
                self.state[i] = m[0][0] * a + m[0][1] * b;
                self.state[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    fn apply_controlled(&mut self, controls: &[QubitId], target: QubitId, m: &Matrix2) {
        let control_mask = controls.iter().fold(0usize, |acc, &c| acc | (1 << c));
        let target_mask = 1 << target;
        for i in 0..self.state.len() {
            if i & control_mask == control_mask && i & target_mask == 0 {
                let j = i | target_mask;
                let (a, b) = (self.state[i], self.state[j]);
                self.state[i] = m[0][0] * a + m[0][1] * b;
                self.state[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    fn apply_swap(&mut self, q1: QubitId, q2: QubitId) {
        let (mask1, mask2) = (1 << q1, 1 << q2);
        for i in 0..self.state.len() {
            if i & mask1 != 0 && i & mask2 == 0 {
                self.state.swap(i, i ^ mask1 ^ mask2);
            }
        }
    }

    // sqrt(SWAP) acts as sqrt(X) on the |01⟩, |10⟩ pair
    fn apply_sqrt_swap(&mut self, q1: QubitId, q2: QubitId) {
        let m = sqrt_x();
        let (mask1, mask2) = (1 << q1, 1 << q2);
        for i in 0..self.state.len() {
            if i & mask1 != 0 && i & mask2 == 0 {
                let j = i ^ mask1 ^ mask2;
                let (a, b) = (self.state[i], self.state[j]);
                self.state[i] = m[0][0] * a + m[0][1] * b;
                self.state[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }
}

impl Default for StateVectorEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Engine Implementation
// ============================================================================

impl Engine for StateVectorEngine {
    fn name(&self) -> &str {
        STATEVECTOR_NAME
    }

    fn allocate_qureg(&mut self, n: usize) -> QplugResult<Qureg> {
        let total = self.num_qubits + n;
        if total > MAX_QUBITS {
            return Err(QplugError::BackendError(format!(
                "cannot allocate {} qubit(s): limit is {}",
                total, MAX_QUBITS
            )));
        }

        // New qubits are the high bits and start in |0⟩
        self.state.resize(1 << total, Complex64::new(0.0, 0.0));
        let ids = (self.num_qubits..total).collect();
        self.num_qubits = total;
        Ok(Qureg::new(ids))
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
        let shape_ok = op.check_qubits(qubits).is_ok();
        let kind_ok = match op {
            Operation::Controlled { base, .. } | Operation::Tensor(base) => {
                single_qubit_matrix(base).is_some()
            }
            _ => true,
        };
        shape_ok && kind_ok
    }

    fn apply(&mut self, op: &Operation, qubits: &[QubitId]) -> QplugResult<()> {
        op.check_qubits(qubits)?;
        for &q in qubits {
            self.check_qubit(q)?;
        }
        if !self.is_available(op, qubits) {
            return Err(unsupported(op));
        }

        if self.gate_fusion {
            self.pending.push((op.clone(), qubits.to_vec()));
            Ok(())
        } else {
            self.apply_now(op, qubits)
        }
    }

    fn measure(&mut self, qubit: QubitId) -> QplugResult<bool> {
        if self.in_compute() {
            return Err(QplugError::BackendError(
                "measurement is not allowed inside a compute scope".to_string(),
            ));
        }
        self.flush_pending()?;

        let p1 = self.probability_one(qubit)?;
        let outcome = self.rng.gen::<f64>() < p1;
        let p = if outcome { p1 } else { 1.0 - p1 };
        let norm = p.sqrt();
        let mask = 1 << qubit;

        for (i, amp) in self.state.iter_mut().enumerate() {
            if (i & mask != 0) == outcome {
                *amp /= norm;
            } else {
                *amp = Complex64::new(0.0, 0.0);
            }
        }

        Ok(outcome)
    }

    fn flush(&mut self, deallocate_qubits: bool) -> QplugResult<()> {
        self.flush_pending()?;
        if deallocate_qubits {
            self.release()?;
        }
        Ok(())
    }

    fn expectation_value(&self, pauli: Pauli, qubit: QubitId) -> QplugResult<f64> {
        if !self.pending.is_empty() {
            return Err(QplugError::BackendError(format!(
                "{} operation(s) pending: flush before querying expectation values",
                self.pending.len()
            )));
        }
        self.check_qubit(qubit)?;

        let mask = 1 << qubit;
        let mut ev = 0.0;
        for i in 0..self.state.len() {
            if i & mask != 0 {
                if pauli == Pauli::Z {
                    ev -= self.state[i].norm_sqr();
                }
                continue;
            }
            let a = self.state[i];
            let b = self.state[i | mask];
            ev += match pauli {
                Pauli::Z => a.norm_sqr(),
                Pauli::X => 2.0 * (a.conj() * b).re,
                Pauli::Y => 2.0 * (a.conj() * b).im,
            };
        }
        Ok(ev)
    }

    fn read_bit(&self, qubit: QubitId) -> QplugResult<bool> {
        if !self.is_classical(qubit)? {
            return Err(QplugError::BackendError(format!(
                "qubit {} is in superposition and has no classical value",
                qubit
            )));
        }
        Ok(self.probability_one(qubit)? > 0.5)
    }

    fn release(&mut self) -> QplugResult<()> {
        let mut count = 0;
        for q in 0..self.num_qubits {
            if !self.is_classical(q)? {
                count += 1;
            }
        }
        if count > 0 {
            return Err(QplugError::UnmeasuredQubits { count });
        }

        self.state = vec![Complex64::new(1.0, 0.0)];
        self.num_qubits = 0;
        self.pending.clear();
        Ok(())
    }
}

// ============================================================================
// Matrices
// ============================================================================

fn unsupported(op: &Operation) -> QplugError {
    QplugError::unsupported(op.name(), STATEVECTOR_NAME)
}

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn diag(a: Complex64, b: Complex64) -> Matrix2 {
    [[a, c(0.0, 0.0)], [c(0.0, 0.0), b]]
}

fn sqrt_x() -> Matrix2 {
    [
        [c(0.5, 0.5), c(0.5, -0.5)],
        [c(0.5, -0.5), c(0.5, 0.5)],
    ]
}

fn rz(theta: f64) -> Matrix2 {
    diag(
        Complex64::from_polar(1.0, -theta / 2.0),
        Complex64::from_polar(1.0, theta / 2.0),
    )
}

fn single_qubit_matrix(op: &Operation) -> Option<Matrix2> {
    let m = match op {
        Operation::H => [
            [c(FRAC_1_SQRT_2, 0.0), c(FRAC_1_SQRT_2, 0.0)],
            [c(FRAC_1_SQRT_2, 0.0), c(-FRAC_1_SQRT_2, 0.0)],
        ],
        Operation::X => [[c(0.0, 0.0), c(1.0, 0.0)], [c(1.0, 0.0), c(0.0, 0.0)]],
        Operation::Y => [[c(0.0, 0.0), c(0.0, -1.0)], [c(0.0, 1.0), c(0.0, 0.0)]],
        Operation::Z => diag(c(1.0, 0.0), c(-1.0, 0.0)),
        Operation::S => diag(c(1.0, 0.0), c(0.0, 1.0)),
        Operation::T => diag(c(1.0, 0.0), Complex64::from_polar(1.0, PI / 4.0)),
        Operation::SqrtX => sqrt_x(),
        Operation::Rx(theta) => {
            let (s, co) = (theta / 2.0).sin_cos();
            [[c(co, 0.0), c(0.0, -s)], [c(0.0, -s), c(co, 0.0)]]
        }
        Operation::Ry(theta) => {
            let (s, co) = (theta / 2.0).sin_cos();
            [[c(co, 0.0), c(-s, 0.0)], [c(s, 0.0), c(co, 0.0)]]
        }
        Operation::Rz(theta) => rz(*theta),
        Operation::R(phi) => diag(c(1.0, 0.0), Complex64::from_polar(1.0, *phi)),
        _ => return None,
    };
    Some(m)
}

// ============================================================================
// Tests
// ============================================================================
