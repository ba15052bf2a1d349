//! Transforms between basis coefficients, imaginary-time node values and
//! Matsubara-frequency node values.

use super::basis::DlrBasis;
use super::convert;
use super::error::{Error, Result};
use super::kernel::{self, Statistics};
use super::pivoted_qr::pivoted_qr;
use nalgebra::{DMatrix, Dyn, LU};
use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Factored maps between coefficients and imaginary-time node values.
///
/// The pack owns the dense coefficient-to-values matrix, its LU factors (and
/// the factors of the transpose, used whenever an operator is composed with
/// the values-to-coefficients map from the right) and the reflection
/// operator `t -> beta - t` acting directly on node values.
pub struct TransformPack {
    beta: f64,
    rank: usize,
    cf2it: Array2<f64>,
    it2cf: LU<f64, Dyn, Dyn>,
    it2cf_t: LU<f64, Dyn, Dyn>,
    it2itr: Array2<f64>,
}

impl TransformPack {
    /// Builds the imaginary-time transforms of `basis` at inverse
    /// temperature `beta`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a nonpositive `beta` and
    /// [`Error::SingularSystem`] if the node matrix cannot be factored.
    pub fn new(basis: &DlrBasis, beta: f64) -> Result<Self> {
        if !beta.is_finite() || beta <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "inverse temperature must be positive, got {beta}"
            )));
        }

        let rank = basis.rank();
        let cf2it = Array2::from_shape_fn((rank, rank), |(i, j)| {
            kernel::kernel_it(basis.times()[i], basis.frequencies()[j])
        });

        let dense = convert::dmatrix_from_array(&cf2it);
        let it2cf = dense.clone().lu();
        let it2cf_t = dense.transpose().lu();

        // reflection in coefficient space, then composed back onto values
        let reflected = DMatrix::from_fn(rank, rank, |i, j| {
            kernel::kernel_it(-basis.times()[i], basis.frequencies()[j])
        });
        let it2itr = it2cf_t
            .solve(&reflected.transpose())
            .ok_or(Error::SingularSystem)?
            .transpose();

        Ok(Self {
            beta,
            rank,
            cf2it,
            it2cf,
            it2cf_t,
            it2itr: convert::array_from_dmatrix(&it2itr),
        })
    }

    /// Returns the inverse temperature.
    #[must_use]
    pub const fn beta(&self) -> f64 {
        self.beta
    }

    /// Returns the basis rank the pack was built for.
    #[must_use]
    pub const fn rank(&self) -> usize {
        self.rank
    }

    /// Returns the dense coefficients-to-values matrix.
    #[must_use]
    pub fn values_matrix(&self) -> &Array2<f64> {
        &self.cf2it
    }

    /// Returns the dense reflection matrix acting on node values.
    #[must_use]
    pub fn reflection_matrix(&self) -> &Array2<f64> {
        &self.it2itr
    }

    /// Maps basis coefficients to values on the time nodes.
    ///
    /// # Panics
    ///
    /// Panics if `coefficients` has the wrong length.
    #[must_use]
    pub fn values_from_coefficients(&self, coefficients: &Array1<f64>) -> Array1<f64> {
        assert_eq!(coefficients.len(), self.rank);
        self.cf2it.dot(coefficients)
    }

    /// Maps values on the time nodes to basis coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] on a length mismatch and
    /// [`Error::SingularSystem`] if the backward solve fails.
    pub fn coefficients_from_values(&self, values: &Array1<f64>) -> Result<Array1<f64>> {
        if values.len() != self.rank {
            return Err(Error::InvalidInput(format!(
                "expected {} node values, got {}",
                self.rank,
                values.len()
            )));
        }

        let solution = self
            .it2cf
            .solve(&convert::dvector_from_array(values))
            .ok_or(Error::SingularSystem)?;
        Ok(convert::array_from_dvector(&solution))
    }

    /// Applies the reflection `t -> beta - t` to values on the time nodes.
    ///
    /// # Panics
    ///
    /// Panics if `values` has the wrong length.
    #[must_use]
    pub fn reflect(&self, values: &Array1<f64>) -> Array1<f64> {
        assert_eq!(values.len(), self.rank);
        self.it2itr.dot(values)
    }

    /// Solves the transposed values-to-coefficients system for every column
    /// of `rhs`.
    pub(crate) fn solve_transpose_matrix(&self, rhs: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        self.it2cf_t.solve(rhs).ok_or(Error::SingularSystem)
    }

    /// Right-composes `matrix` with the values-to-coefficients map, turning
    /// an operator on coefficients into one on node values.
    pub(crate) fn compose_with_coefficient_solve(
        &self,
        matrix: &Array2<f64>,
    ) -> Result<Array2<f64>> {
        let transposed = convert::dmatrix_from_array(matrix).transpose();
        let solved = self
            .it2cf_t
            .solve(&transposed)
            .ok_or(Error::SingularSystem)?
            .transpose();
        Ok(convert::array_from_dmatrix(&solved))
    }
}

/// Matsubara-frequency interpolation nodes and their factored transforms.
pub struct MatsubaraPack {
    beta: f64,
    statistics: Statistics,
    rank: usize,
    nodes: Vec<i32>,
    cf2mf: Array2<Complex64>,
    mf2cf: LU<Complex64, Dyn, Dyn>,
}

impl MatsubaraPack {
    /// Selects `rank` Matsubara nodes with `|n| <= nmax` and builds the
    /// transforms of `basis` at inverse temperature `beta`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `beta` is not positive or if the
    /// search window `2 * nmax + 1` holds fewer candidates than the basis
    /// rank.
    pub fn new(
        basis: &DlrBasis,
        beta: f64,
        nmax: usize,
        statistics: Statistics,
    ) -> Result<Self> {
        if !beta.is_finite() || beta <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "inverse temperature must be positive, got {beta}"
            )));
        }
        let rank = basis.rank();
        let candidates = 2 * nmax + 1;
        if candidates < rank {
            return Err(Error::InvalidInput(format!(
                "nmax = {nmax} offers {candidates} Matsubara candidates for rank {rank}"
            )));
        }
        let offset = i32::try_from(nmax)
            .map_err(|_| Error::InvalidInput(format!("nmax = {nmax} is out of range")))?;

        // fixed-rank pivoted QR over the candidate window
        let candidate_matrix = DMatrix::from_fn(rank, candidates, |k, j| {
            let n = i32::try_from(j).expect("window fits in i32") - offset;
            kernel::kernel_mf(n, basis.frequencies()[k], statistics)
        });
        let selection = pivoted_qr(candidate_matrix, 0.0);
        let nodes: Vec<i32> = selection.permutation[..rank]
            .iter()
            .map(|&j| i32::try_from(j).expect("window fits in i32") - offset)
            .collect();

        let cf2mf = Array2::from_shape_fn((rank, rank), |(i, j)| {
            kernel::kernel_mf(nodes[i], basis.frequencies()[j], statistics)
        });
        let mf2cf = convert::dmatrix_from_array(&cf2mf).lu();

        Ok(Self {
            beta,
            statistics,
            rank,
            nodes,
            cf2mf,
            mf2cf,
        })
    }

    /// Returns the inverse temperature.
    #[must_use]
    pub const fn beta(&self) -> f64 {
        self.beta
    }

    /// Returns the statistics the frequency grid belongs to.
    #[must_use]
    pub const fn statistics(&self) -> Statistics {
        self.statistics
    }

    /// Returns the basis rank the pack was built for.
    #[must_use]
    pub const fn rank(&self) -> usize {
        self.rank
    }

    /// Returns the selected signed Matsubara indices, in pivot order.
    #[must_use]
    pub fn nodes(&self) -> &[i32] {
        &self.nodes
    }

    /// Maps basis coefficients to values on the Matsubara nodes.
    ///
    /// # Panics
    ///
    /// Panics if `coefficients` has the wrong length.
    #[must_use]
    pub fn values_from_coefficients(&self, coefficients: &Array1<f64>) -> Array1<Complex64> {
        assert_eq!(coefficients.len(), self.rank);
        let complex = coefficients.mapv(|c| Complex64::new(c, 0.0));
        self.cf2mf.dot(&complex)
    }

    /// Maps values on the Matsubara nodes to basis coefficients.
    ///
    /// The returned coefficients carry round-off-sized imaginary parts for
    /// any input that actually is a fermionic imaginary-time function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] on a length mismatch and
    /// [`Error::SingularSystem`] if the backward solve fails.
    pub fn coefficients_from_values(
        &self,
        values: &Array1<Complex64>,
    ) -> Result<Array1<Complex64>> {
        if values.len() != self.rank {
            return Err(Error::InvalidInput(format!(
                "expected {} node values, got {}",
                self.rank,
                values.len()
            )));
        }

        let solution = self
            .mf2cf
            .solve(&convert::dvector_from_array(values))
            .ok_or(Error::SingularSystem)?;
        Ok(convert::array_from_dvector(&solution))
    }
}
