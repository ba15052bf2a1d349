//! Evaluation of the Lehmann kernel in imaginary time and Matsubara frequency.
//!
//! All functions work in the dimensionless variables used throughout this
//! crate: imaginary time lives on the unit interval and real frequencies are
//! measured in units of the inverse temperature, so a spectral density
//! supported on `[-omega_max, omega_max]` corresponds to the dimensionless
//! window `[-lambda, lambda]` with `lambda = beta * omega_max`.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Particle statistics selecting the sign structure of convolutions and the
/// Matsubara frequency grid.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Statistics {
    /// Fermionic statistics, `xi = -1`, odd Matsubara frequencies.
    Fermion,
    /// Bosonic statistics, `xi = +1`, even Matsubara frequencies. The
    /// bosonic branch follows the defining formulas but is not exercised by
    /// the reference scenarios.
    Boson,
}

impl Statistics {
    /// Returns the statistics sign `xi`.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Fermion => -1.0,
            Self::Boson => 1.0,
        }
    }

    /// Returns the dimensionless Matsubara frequency `nu_n`, which is
    /// `(2n+1) pi` for fermions and `2n pi` for bosons.
    #[must_use]
    pub fn matsubara_frequency(self, n: i32) -> f64 {
        match self {
            Self::Fermion => f64::from(2 * n + 1) * PI,
            Self::Boson => f64::from(2 * n) * PI,
        }
    }
}

/// Evaluates the imaginary-time kernel `e^{-t omega} / (1 + e^{-omega})` for
/// `t` in absolute format on `[0, 1]`.
///
/// The two algebraically identical branches keep every intermediate within
/// the representable range for any finite `omega`.
#[must_use]
pub fn kernel_it_abs(t: f64, omega: f64) -> f64 {
    if omega >= 0.0 {
        (-t * omega).exp() / (1.0 + (-omega).exp())
    } else {
        ((1.0 - t) * omega).exp() / (1.0 + omega.exp())
    }
}

/// Evaluates the imaginary-time kernel for `t` in relative format.
///
/// Negative `t` encodes the absolute point `1 + t`; the reflection identity
/// `K(1 - t, -omega) = K(t, omega)` maps it back onto the absolute-format
/// kernel without losing relative precision near `t = 1`.
#[must_use]
pub fn kernel_it(t: f64, omega: f64) -> f64 {
    if t >= 0.0 {
        kernel_it_abs(t, omega)
    } else {
        kernel_it_abs(-t, -omega)
    }
}

/// Evaluates the Matsubara-frequency kernel `1 / (i nu_n - omega)` at the
/// signed integer index `n`.
#[must_use]
pub fn kernel_mf(n: i32, omega: f64, statistics: Statistics) -> Complex64 {
    Complex64::new(-omega, statistics.matsubara_frequency(n)).inv()
}

/// Evaluates the auxiliary weight `(1 - xi e^{-omega}) / (1 + e^{-omega})`
/// appearing in the diagonal of the convolution tensor.
///
/// This is identically 1 for fermions and `tanh(omega / 2)` for bosons. Both
/// branches are overflow-free for any finite `omega`.
#[must_use]
pub fn statistical_weight(omega: f64, statistics: Statistics) -> f64 {
    let xi = statistics.sign();
    if omega >= 0.0 {
        (1.0 - xi * (-omega).exp()) / (1.0 + (-omega).exp())
    } else {
        (omega.exp() - xi) / (omega.exp() + 1.0)
    }
}
