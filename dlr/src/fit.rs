//! Least-squares recovery of basis coefficients from scattered samples.

use super::basis::DlrBasis;
use super::error::{Error, Result};
use super::kernel;
use nalgebra::{DMatrix, DVector};
use ndarray::Array1;

/// Fits basis coefficients to samples `(t_i, values_i)` with the times in
/// relative format.
///
/// The overdetermined system is solved in the least-squares sense by a
/// rank-revealing factorization thresholded at the accuracy of `basis`; the
/// discovered rank is returned next to the coefficients.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the sample arrays differ in length or
/// are empty, and [`Error::SingularSystem`] if the factorization fails.
pub fn fit_it(
    basis: &DlrBasis,
    times: &[f64],
    values: &Array1<f64>,
) -> Result<(Array1<f64>, usize)> {
    if times.is_empty() || times.len() != values.len() {
        return Err(Error::InvalidInput(format!(
            "got {} sample times for {} values",
            times.len(),
            values.len()
        )));
    }

    let design = DMatrix::from_fn(times.len(), basis.rank(), |i, j| {
        kernel::kernel_it(times[i], basis.frequencies()[j])
    });
    let rhs = DVector::from_iterator(values.len(), values.iter().copied());

    let decomposition = design.svd(true, true);
    let scale = decomposition
        .singular_values
        .iter()
        .fold(0.0_f64, |acc, &s| acc.max(s));
    let threshold = basis.epsilon() * scale;

    let rank = decomposition.rank(threshold);
    let coefficients = decomposition
        .solve(&rhs, threshold)
        .map_err(|_| Error::SingularSystem)?;

    Ok((Array1::from_iter(coefficients.iter().copied()), rank))
}
