//! Dense state vector over a small, growing set of qubits.
//!
//! Slot `k` of the register is bit `k` of an amplitude index. Qubits are
//! appended in pairs and removed again when measured, so the register only
//! ever holds the qubits that are live in the current round.

use std::f64::consts::FRAC_1_SQRT_2;

use num_complex::Complex64;
use rand::Rng;

pub(crate) type Gate = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);
const H: Complex64 = Complex64::new(FRAC_1_SQRT_2, 0.0);

pub(crate) const HADAMARD: Gate = [[H, H], [H, Complex64::new(-FRAC_1_SQRT_2, 0.0)]];
pub(crate) const S_DAGGER: Gate = [[ONE, ZERO], [ZERO, Complex64::new(0.0, -1.0)]];
pub(crate) const PAULI_X: Gate = [[ZERO, ONE], [ONE, ZERO]];
pub(crate) const PAULI_Y: Gate = [[ZERO, Complex64::new(0.0, -1.0)], [I, ZERO]];
pub(crate) const PAULI_Z: Gate = [[ONE, ZERO], [ZERO, Complex64::new(-1.0, 0.0)]];

#[derive(Debug, Clone)]
pub(crate) struct Register {
    amplitudes: Vec<Complex64>,
}

impl Default for Register {
    fn default() -> Self {
        Self {
            amplitudes: vec![ONE],
        }
    }
}

impl Register {
    pub(crate) fn width(&self) -> usize {
        self.amplitudes.len().trailing_zeros() as usize
    }

    /// Append two qubits in `|Φ+> = (|00> + |11>) / sqrt(2)`.
    ///
    /// Returns the slots of the two new qubits.
    pub(crate) fn push_bell_pair(&mut self) -> (usize, usize) {
        let n = self.width();
        let len = self.amplitudes.len();
        let mut next = vec![ZERO; len * 4];
        let both = (1usize << n) | (1usize << (n + 1));
        for (i, amp) in self.amplitudes.iter().enumerate() {
            next[i] = *amp * FRAC_1_SQRT_2;
            next[i | both] = *amp * FRAC_1_SQRT_2;
        }
        self.amplitudes = next;
        (n, n + 1)
    }

    pub(crate) fn apply(&mut self, gate: &Gate, slot: usize) {
        let mask = 1usize << slot;
        for i in 0..self.amplitudes.len() {
            if i & mask != 0 {
                continue;
            }
            let j = i | mask;
            let (a0, a1) = (self.amplitudes[i], self.amplitudes[j]);
            self.amplitudes[i] = gate[0][0] * a0 + gate[0][1] * a1;
            self.amplitudes[j] = gate[1][0] * a0 + gate[1][1] * a1;
        }
    }

    pub(crate) fn cnot(&mut self, control: usize, target: usize) {
        let c = 1usize << control;
        let t = 1usize << target;
        for i in 0..self.amplitudes.len() {
            if i & c != 0 && i & t == 0 {
                self.amplitudes.swap(i, i | t);
            }
        }
    }

    /// Probability of reading 1 on `slot`.
    pub(crate) fn probability_one(&self, slot: usize) -> f64 {
        let mask = 1usize << slot;
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum()
    }

    /// Measure `slot` in the computational basis, collapse the state and
    /// remove the slot. Slots above it shift down by one.
    pub(crate) fn measure_and_remove<R: Rng + ?Sized>(&mut self, slot: usize, rng: &mut R) -> u8 {
        let p_one = self.probability_one(slot).clamp(0.0, 1.0);
        let outcome = u8::from(rng.random_bool(p_one));
        let p_outcome = if outcome == 1 { p_one } else { 1.0 - p_one };
        let scale = if p_outcome > 0.0 {
            1.0 / p_outcome.sqrt()
        } else {
            1.0
        };

        let mask = 1usize << slot;
        let low = mask - 1;
        let mut next = vec![ZERO; self.amplitudes.len() / 2];
        for (i, amp) in self.amplitudes.iter().enumerate() {
            if ((i & mask) != 0) != (outcome == 1) {
                continue;
            }
            let compact = ((i >> (slot + 1)) << slot) | (i & low);
            next[compact] = *amp * scale;
        }
        self.amplitudes = next;
        outcome
    }

    #[cfg(test)]
    pub(crate) fn norm(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }
}
