//! Weighted fixed-point solution of the nonlinear Dyson equation.
//!
//! The self-energy is a caller-supplied callable evaluated on the
//! imaginary-time nodes; each iteration performs one linear solve, either a
//! dense one in imaginary time or a diagonal one on the Matsubara nodes, and
//! mixes the result into the current iterate.

use super::convert;
use super::convolution::ConvolutionTensor;
use super::error::{Error, Result};
use super::transforms::{MatsubaraPack, TransformPack};
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Parameters of the weighted fixed-point iteration.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct FixedPointOptions {
    /// Mixing weight in `(0, 1]`; 1 is plain fixed-point iteration.
    pub weight: f64,
    /// Convergence threshold on the largest node-value update.
    pub tolerance: f64,
    /// Iteration cap.
    pub max_iterations: usize,
}

impl Default for FixedPointOptions {
    fn default() -> Self {
        Self {
            weight: 1.0,
            tolerance: 1e-12,
            max_iterations: 100,
        }
    }
}

impl FixedPointOptions {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.weight) || self.weight == 0.0 {
            return Err(Error::InvalidInput(format!(
                "mixing weight must lie in (0, 1], got {}",
                self.weight
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidInput(
                "iteration cap must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Termination state of the fixed-point iteration.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum DysonStatus {
    /// The largest update fell below the tolerance.
    Converged,
    /// The iteration cap was reached or the observer cancelled.
    NotConverged,
}

/// Result of a Dyson solve: the Green's function on the imaginary-time
/// nodes, the number of iterations spent and the termination state.
#[derive(Clone, Debug)]
pub struct DysonSolution {
    /// Green's function values on the imaginary-time nodes.
    pub values: Array1<f64>,
    /// Number of fixed-point iterations performed.
    pub iterations: usize,
    /// Whether the iteration converged.
    pub status: DysonStatus,
}

impl DysonSolution {
    /// Returns true if the iteration converged.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.status == DysonStatus::Converged
    }
}

/// Per-iteration observer; returning `false` cancels the iteration, which
/// then reports [`DysonStatus::NotConverged`] with the current count.
pub type Observer<'a> = &'a mut dyn FnMut(usize, f64) -> bool;

/// Solves the Dyson equation in the imaginary-time domain.
///
/// `g0` holds the free Green's function on the time nodes and doubles as the
/// initial iterate. The convolution matrix of `g0` is built once; every
/// iteration builds the convolution matrix of the current self-energy and
/// solves the dense system `(I - G0 Sigma) g = g0`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for inconsistent dimensions, mismatched
/// inverse temperatures or out-of-range options, and
/// [`Error::SingularSystem`] if a per-iteration solve fails.
pub fn dyson_it(
    transforms: &TransformPack,
    tensor: &ConvolutionTensor,
    g0: &Array1<f64>,
    self_energy: &mut dyn FnMut(&Array1<f64>) -> Array1<f64>,
    options: &FixedPointOptions,
    observer: Option<Observer<'_>>,
) -> Result<DysonSolution> {
    options.validate()?;
    let rank = transforms.rank();
    if tensor.rank() != rank || tensor.beta() != transforms.beta() {
        return Err(Error::InvalidInput(
            "convolution tensor and transforms belong to different setups".to_string(),
        ));
    }
    if g0.len() != rank {
        return Err(Error::InvalidInput(format!(
            "expected {rank} node values, got {}",
            g0.len()
        )));
    }

    let g0_matrix = tensor.matrix(transforms, g0)?;
    let identity = Array2::eye(rank);

    iterate(
        g0.clone(),
        |g| {
            let sigma = evaluate_self_energy(self_energy, g, rank)?;
            let sigma_matrix = tensor.matrix(transforms, &sigma)?;
            let system = &identity - &g0_matrix.dot(&sigma_matrix);
            let solution = convert::dmatrix_from_array(&system)
                .lu()
                .solve(&convert::dvector_from_array(g0))
                .ok_or(Error::SingularSystem)?;
            Ok(convert::array_from_dvector(&solution))
        },
        options,
        observer,
    )
}

/// Solves the Dyson equation in the Matsubara domain.
///
/// `g0` holds the free Green's function on the Matsubara nodes; the result
/// is reported on the imaginary-time nodes. Each iteration moves the
/// self-energy to the Matsubara nodes, inverts the Dyson equation
/// diagonally and comes back through the coefficient representation.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for inconsistent dimensions, mismatched
/// inverse temperatures or out-of-range options, and
/// [`Error::SingularSystem`] if a transform solve fails or a diagonal
/// denominator vanishes.
pub fn dyson_mf(
    transforms: &TransformPack,
    matsubara: &MatsubaraPack,
    g0: &Array1<Complex64>,
    self_energy: &mut dyn FnMut(&Array1<f64>) -> Array1<f64>,
    options: &FixedPointOptions,
    observer: Option<Observer<'_>>,
) -> Result<DysonSolution> {
    options.validate()?;
    let rank = transforms.rank();
    if matsubara.rank() != rank || matsubara.beta() != transforms.beta() {
        return Err(Error::InvalidInput(
            "Matsubara pack and transforms belong to different setups".to_string(),
        ));
    }
    if g0.len() != rank {
        return Err(Error::InvalidInput(format!(
            "expected {rank} node values, got {}",
            g0.len()
        )));
    }

    let beta_squared = transforms.beta() * transforms.beta();
    let initial = real_time_values(transforms, matsubara, g0)?;

    iterate(
        initial,
        |g| {
            let sigma = evaluate_self_energy(self_energy, g, rank)?;
            let sigma_coefficients = transforms.coefficients_from_values(&sigma)?;
            let sigma_mf = matsubara.values_from_coefficients(&sigma_coefficients);

            let mut g_mf = Array1::zeros(rank);
            for ((target, &free), &sig) in g_mf.iter_mut().zip(g0.iter()).zip(sigma_mf.iter()) {
                let denominator = 1.0 - beta_squared * free * sig;
                if denominator.norm() == 0.0 {
                    return Err(Error::SingularSystem);
                }
                *target = free / denominator;
            }
            real_time_values(transforms, matsubara, &g_mf)
        },
        options,
        observer,
    )
}

fn evaluate_self_energy(
    self_energy: &mut dyn FnMut(&Array1<f64>) -> Array1<f64>,
    g: &Array1<f64>,
    rank: usize,
) -> Result<Array1<f64>> {
    let sigma = self_energy(g);
    if sigma.len() == rank {
        Ok(sigma)
    } else {
        Err(Error::InvalidInput(format!(
            "self-energy returned {} values for rank {rank}",
            sigma.len()
        )))
    }
}

/// Moves Matsubara node values onto the imaginary-time nodes. The
/// coefficients of an imaginary-time function are real, so the round-off
/// imaginary parts of the backward solve are dropped.
fn real_time_values(
    transforms: &TransformPack,
    matsubara: &MatsubaraPack,
    values: &Array1<Complex64>,
) -> Result<Array1<f64>> {
    let coefficients = matsubara.coefficients_from_values(values)?;
    let real = Array1::from_iter(coefficients.iter().map(|c| c.re));
    Ok(transforms.values_from_coefficients(&real))
}

fn iterate(
    mut g: Array1<f64>,
    mut step: impl FnMut(&Array1<f64>) -> Result<Array1<f64>>,
    options: &FixedPointOptions,
    mut observer: Option<Observer<'_>>,
) -> Result<DysonSolution> {
    for iteration in 1..=options.max_iterations {
        let next = step(&g)?;
        let update = next
            .iter()
            .zip(g.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);

        if update < options.tolerance {
            return Ok(DysonSolution {
                values: next,
                iterations: iteration,
                status: DysonStatus::Converged,
            });
        }

        g.zip_mut_with(&next, |gi, &ni| {
            *gi = options.weight * ni + (1.0 - options.weight) * *gi;
        });

        if let Some(callback) = observer.as_mut() {
            if !callback(iteration, update) {
                return Ok(DysonSolution {
                    values: g,
                    iterations: iteration,
                    status: DysonStatus::NotConverged,
                });
            }
        }
    }

    Ok(DysonSolution {
        values: g,
        iterations: options.max_iterations,
        status: DysonStatus::NotConverged,
    })
}
