//! Construction of the discrete Lehmann basis.
//!
//! A basis is built once from the dimensionless cutoff `lambda` and the
//! target accuracy `epsilon` and is immutable afterwards. Its real-frequency
//! support points are the columns of the fine kernel matrix singled out by an
//! adaptive pivoted QR; the matching imaginary-time nodes come from a second,
//! fixed-rank pivoted QR on the transposed and column-restricted matrix.

use super::convert;
use super::error::{Error, Result};
use super::fine_grid::FineGrid;
use super::kernel::{self, Statistics};
use super::pivoted_qr::pivoted_qr;
use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Discrete Lehmann basis for a given cutoff and accuracy.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DlrBasis {
    lambda: f64,
    epsilon: f64,
    rank: usize,
    omega: Vec<f64>,
    omega_idx: Vec<usize>,
    tau: Vec<f64>,
    tau_idx: Vec<usize>,
    fine_error: [f64; 2],
}

impl DlrBasis {
    /// Builds the basis for the cutoff `lambda` and target accuracy
    /// `epsilon`, allowing at most `max_rank` support points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `lambda` is not positive, if
    /// `epsilon` is outside `(0, 1)` or if `max_rank` is zero, and
    /// [`Error::RankOverflow`] if the kernel needs more than `max_rank`
    /// support points to reach `epsilon`.
    pub fn build(lambda: f64, epsilon: f64, max_rank: usize) -> Result<Self> {
        if !(0.0..1.0).contains(&epsilon) || epsilon == 0.0 {
            return Err(Error::InvalidInput(format!(
                "accuracy epsilon must lie in (0, 1), got {epsilon}"
            )));
        }
        if max_rank == 0 {
            return Err(Error::InvalidInput(
                "maximum rank must be at least 1".to_string(),
            ));
        }

        let fine = FineGrid::build(lambda)?;
        let nt = fine.tau().len();

        // frequency selection: adaptive pivoted QR on the kernel columns
        let columns = pivoted_qr(convert::dmatrix_from_array(fine.kernel()), epsilon);
        let rank = columns.rank;
        if rank > max_rank {
            return Err(Error::RankOverflow { rank, max_rank });
        }

        let omega_idx: Vec<usize> = columns.permutation[..rank].to_vec();
        let omega: Vec<f64> = omega_idx.iter().map(|&j| fine.omega()[j]).collect();

        // time selection: fixed-rank pivoted QR on the restricted transpose
        let restricted = DMatrix::from_fn(rank, nt, |k, i| fine.kernel()[[i, omega_idx[k]]]);
        let rows = pivoted_qr(restricted, 0.0);

        let tau_idx: Vec<usize> = rows.permutation[..rank].to_vec();
        let tau: Vec<f64> = tau_idx.iter().map(|&i| fine.tau()[i]).collect();

        Ok(Self {
            lambda,
            epsilon,
            rank,
            omega,
            omega_idx,
            tau,
            tau_idx,
            fine_error: fine.interpolation_error(),
        })
    }

    /// Returns the dimensionless cutoff the basis was built for.
    #[must_use]
    pub const fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Returns the accuracy the basis was built for.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Returns the number of support points.
    #[must_use]
    pub const fn rank(&self) -> usize {
        self.rank
    }

    /// Returns the real-frequency support points, in pivot order.
    #[must_use]
    pub fn frequencies(&self) -> &[f64] {
        &self.omega
    }

    /// Returns the imaginary-time interpolation nodes in relative format.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.tau
    }

    /// Returns the fine-grid column index of every support frequency. The
    /// indices are diagnostics only.
    #[must_use]
    pub fn frequency_indices(&self) -> &[usize] {
        &self.omega_idx
    }

    /// Returns the fine-grid row index of every time node. The indices are
    /// diagnostics only.
    #[must_use]
    pub fn time_indices(&self) -> &[usize] {
        &self.tau_idx
    }

    /// Returns the relative panel-interpolation error of the fine grid the
    /// basis was selected from, one entry per variable.
    ///
    /// Values noticeably above `epsilon` signal that the discretization, and
    /// with it the basis, did not reach the requested accuracy.
    #[must_use]
    pub const fn fine_grid_error(&self) -> [f64; 2] {
        self.fine_error
    }

    /// Evaluates the expansion `sum_k c_k K(t, omega_k)` at the
    /// relative-format time `t`.
    ///
    /// # Panics
    ///
    /// Panics if `coefficients` does not have one entry per support point.
    #[must_use]
    pub fn eval_it(&self, coefficients: &[f64], t: f64) -> f64 {
        assert_eq!(coefficients.len(), self.rank);

        if t >= 0.0 {
            coefficients
                .iter()
                .zip(&self.omega)
                .map(|(&c, &om)| c * kernel::kernel_it_abs(t, om))
                .sum()
        } else {
            coefficients
                .iter()
                .zip(&self.omega)
                .map(|(&c, &om)| c * kernel::kernel_it_abs(-t, -om))
                .sum()
        }
    }

    /// Evaluates the expansion at the Matsubara index `n`.
    ///
    /// The result is dimensionless; a physical Matsubara Green's function
    /// carries one additional factor of the inverse temperature.
    ///
    /// # Panics
    ///
    /// Panics if `coefficients` does not have one entry per support point.
    #[must_use]
    pub fn eval_mf(&self, coefficients: &[f64], n: i32, statistics: Statistics) -> Complex64 {
        assert_eq!(coefficients.len(), self.rank);

        coefficients
            .iter()
            .zip(&self.omega)
            .map(|(&c, &om)| c * kernel::kernel_mf(n, om, statistics))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn build_validates_inputs() {
        assert!(matches!(
            DlrBasis::build(100.0, 0.0, 100),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            DlrBasis::build(100.0, 1.0, 100),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            DlrBasis::build(-1.0, 1e-10, 100),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            DlrBasis::build(100.0, 1e-10, 0),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn rank_cap_is_enforced() {
        assert!(matches!(
            DlrBasis::build(100.0, 1e-12, 5),
            Err(Error::RankOverflow { max_rank: 5, .. })
        ));
    }

    #[test]
    fn rank_grows_logarithmically() {
        let coarse = DlrBasis::build(100.0, 1e-6, 500).unwrap();
        let fine = DlrBasis::build(100.0, 1e-12, 500).unwrap();
        assert!(coarse.rank() < fine.rank());
        // the classic estimate is O(log(lambda) * log(1/eps))
        assert!(fine.rank() < 60, "rank {}", fine.rank());

        assert_eq!(fine.frequencies().len(), fine.rank());
        assert_eq!(fine.times().len(), fine.rank());
        assert_eq!(fine.frequency_indices().len(), fine.rank());
        assert_eq!(fine.time_indices().len(), fine.rank());
    }

    #[test]
    fn nodes_come_from_the_fine_grids() {
        let basis = DlrBasis::build(50.0, 1e-10, 500).unwrap();
        for &om in basis.frequencies() {
            assert!(om.abs() < 50.0);
        }
        for &t in basis.times() {
            assert!((-0.5..0.5).contains(&t) && t != 0.0);
        }
        let [err_t, err_om] = basis.fine_grid_error();
        assert!(err_t < 1e-10 && err_om < 1e-10);
    }

    #[test]
    fn expansion_interpolates_single_pole() {
        // a pure basis function is reproduced exactly by construction
        let basis = DlrBasis::build(100.0, 1e-12, 500).unwrap();
        let omega = basis.frequencies()[3];
        let mut coefficients = vec![0.0; basis.rank()];
        coefficients[3] = 1.0;

        for &t in &[0.0, 0.37, -0.12, 1.0] {
            assert_approx_eq!(
                f64,
                basis.eval_it(&coefficients, t),
                kernel::kernel_it(t, omega),
                ulps = 4
            );
        }

        let value = basis.eval_mf(&coefficients, 7, Statistics::Fermion);
        let reference = kernel::kernel_mf(7, omega, Statistics::Fermion);
        assert_approx_eq!(f64, value.re, reference.re, ulps = 4);
        assert_approx_eq!(f64, value.im, reference.im, ulps = 4);
    }
}
