//! The L2 inner product of two basis expansions over one imaginary-time
//! period.
//!
//! The pairwise integrals of two kernel columns have a closed form that is
//! evaluated from boundary kernel values, with an `expm1` branch taking over
//! where the two support frequencies nearly cancel. Both branches are free of
//! catastrophic cancellation for cutoffs up to roughly `1e4`.

use super::basis::DlrBasis;
use super::convert;
use super::error::Result;
use super::kernel;
use super::transforms::TransformPack;
use ndarray::{Array1, Array2};

/// Pairwise integrals of the kernel columns `omega_j` and `omega_k` over the
/// unit interval.
fn column_overlap(omega_j: f64, omega_k: f64) -> f64 {
    let s = omega_j + omega_k;
    let k0 = kernel::kernel_it_abs(0.0, omega_j) * kernel::kernel_it_abs(0.0, omega_k);

    if s == 0.0 {
        k0
    } else if s.abs() > 1.0 {
        let k1 = kernel::kernel_it_abs(1.0, omega_j) * kernel::kernel_it_abs(1.0, omega_k);
        (k0 - k1) / s
    } else {
        -k0 * (-s).exp_m1() / s
    }
}

/// Builds the weight matrix of the L2 inner product on node values, scaled
/// by the inverse temperature of `transforms`.
///
/// For node-value vectors `g` and `h` of two expansions, `g . W . h` equals
/// the integral of their product over `[0, beta]`.
///
/// # Errors
///
/// Returns [`Error::SingularSystem`](super::error::Error::SingularSystem) if
/// one of the two composition solves fails.
pub fn weight(basis: &DlrBasis, transforms: &TransformPack) -> Result<Array2<f64>> {
    let rank = basis.rank();
    let omega = basis.frequencies();

    let overlaps = Array2::from_shape_fn((rank, rank), |(j, k)| {
        transforms.beta() * column_overlap(omega[j], omega[k])
    });

    // compose with values -> coefficients on both sides
    let right = transforms.compose_with_coefficient_solve(&overlaps)?;
    let both = transforms.solve_transpose_matrix(&convert::dmatrix_from_array(&right))?;
    Ok(convert::array_from_dmatrix(&both))
}

/// Evaluates the inner product of two node-value vectors under `weight`.
///
/// # Panics
///
/// Panics if the dimensions are inconsistent.
#[must_use]
pub fn inner_product(weight: &Array2<f64>, g: &Array1<f64>, h: &Array1<f64>) -> f64 {
    assert_eq!(weight.nrows(), g.len());
    assert_eq!(weight.ncols(), h.len());
    g.dot(&weight.dot(h))
}
