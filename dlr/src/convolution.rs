//! Imaginary-time convolution of basis expansions.
//!
//! The tensor built here contracts with the coefficients of one function to
//! produce the dense matrix of convolution by that function on the
//! interpolation nodes. The off-diagonal entries are divided differences of
//! the kernel in the two support frequencies; in double precision these stay
//! accurate for cutoffs up to roughly `1e4`, beyond which close frequency
//! pairs start cancelling.

use super::basis::DlrBasis;
use super::error::{Error, Result};
use super::kernel::{self, Statistics};
use super::transforms::TransformPack;
use itertools::iproduct;
use ndarray::{Array1, Array2, Array3};

/// Rank-3 convolution tensor of a basis at fixed inverse temperature and
/// statistics.
pub struct ConvolutionTensor {
    beta: f64,
    statistics: Statistics,
    tensor: Array3<f64>,
}

impl ConvolutionTensor {
    /// Builds the convolution tensor of `basis` at inverse temperature
    /// `beta`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a nonpositive `beta`.
    pub fn new(basis: &DlrBasis, beta: f64, statistics: Statistics) -> Result<Self> {
        if !beta.is_finite() || beta <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "inverse temperature must be positive, got {beta}"
            )));
        }

        let rank = basis.rank();
        let times = basis.times();
        let omega = basis.frequencies();
        let xi = statistics.sign();

        let weights: Vec<f64> = omega
            .iter()
            .map(|&om| kernel::statistical_weight(om, statistics))
            .collect();
        let kvals = Array2::from_shape_fn((rank, rank), |(j, k)| {
            kernel::kernel_it(times[j], omega[k])
        });

        let mut tensor = Array3::zeros((rank, rank, rank));
        for (j, k, l) in iproduct!(0..rank, 0..rank, 0..rank) {
            tensor[[j, k, l]] = if k == l {
                let boundary = if times[j] >= 0.0 {
                    xi * kernel::kernel_it_abs(1.0, omega[k])
                } else {
                    kernel::kernel_it_abs(0.0, omega[k])
                };
                beta * (times[j] * weights[k] + boundary) * kvals[[j, k]]
            } else {
                beta * (kvals[[j, l]] * weights[k] - kvals[[j, k]] * weights[l])
                    / (omega[k] - omega[l])
            };
        }

        Ok(Self {
            beta,
            statistics,
            tensor,
        })
    }

    /// Returns the inverse temperature.
    #[must_use]
    pub const fn beta(&self) -> f64 {
        self.beta
    }

    /// Returns the statistics the tensor was built for.
    #[must_use]
    pub const fn statistics(&self) -> Statistics {
        self.statistics
    }

    /// Returns the basis rank the tensor was built for.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.tensor.dim().0
    }

    /// Contracts the tensor with the coefficients of `g`, producing the
    /// matrix that maps the *coefficients* of a second function `f` to the
    /// node values of the convolution `g * f`.
    ///
    /// # Panics
    ///
    /// Panics if `coefficients` has the wrong length.
    #[must_use]
    pub fn matrix_from_coefficients(&self, coefficients: &Array1<f64>) -> Array2<f64> {
        let rank = self.rank();
        assert_eq!(coefficients.len(), rank);

        Array2::from_shape_fn((rank, rank), |(j, k)| {
            (0..rank)
                .map(|l| self.tensor[[j, k, l]] * coefficients[l])
                .sum()
        })
    }

    /// Builds the matrix that maps the *node values* of a second function
    /// `f` to the node values of `g * f`, where `g` is given by its node
    /// values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] on a length mismatch and
    /// [`Error::SingularSystem`] if one of the coefficient solves fails.
    pub fn matrix(
        &self,
        transforms: &TransformPack,
        values: &Array1<f64>,
    ) -> Result<Array2<f64>> {
        let coefficients = transforms.coefficients_from_values(values)?;
        let on_coefficients = self.matrix_from_coefficients(&coefficients);
        transforms.compose_with_coefficient_solve(&on_coefficients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use rand::Rng;
    use rand_pcg::Pcg64;

    fn setup() -> (DlrBasis, TransformPack, ConvolutionTensor) {
        let basis = DlrBasis::build(100.0, 1e-12, 500).unwrap();
        let transforms = TransformPack::new(&basis, 1.0).unwrap();
        let tensor = ConvolutionTensor::new(&basis, 1.0, Statistics::Fermion).unwrap();
        (basis, transforms, tensor)
    }

    #[test]
    fn contraction_is_linear() {
        let (basis, _, tensor) = setup();
        let mut rng = Pcg64::new(0xcafef00dd15ea5e5, 0xa02bdbf7bb3c0a7);

        let c1 = Array1::from_shape_fn(basis.rank(), |_| rng.gen::<f64>() - 0.5);
        let c2 = Array1::from_shape_fn(basis.rank(), |_| rng.gen::<f64>() - 0.5);
        let combined = tensor.matrix_from_coefficients(&(2.5 * &c1 - 0.75 * &c2));
        let separate = 2.5 * &tensor.matrix_from_coefficients(&c1)
            - 0.75 * &tensor.matrix_from_coefficients(&c2);

        for (a, b) in combined.iter().zip(separate.iter()) {
            assert!((a - b).abs() < 1e-12 * (1.0 + b.abs()));
        }
    }

    #[test]
    fn convolution_of_two_basis_functions() {
        // for fermions the convolution of two kernel columns has the closed
        // form (K(t, om_l) - K(t, om_k)) / (om_k - om_l)
        let (basis, transforms, tensor) = setup();
        let (k, l) = (2, 5);
        let om = basis.frequencies();

        let g_values = Array1::from_iter(
            basis
                .times()
                .iter()
                .map(|&t| kernel::kernel_it(t, om[l])),
        );
        let f_values = Array1::from_iter(
            basis
                .times()
                .iter()
                .map(|&t| kernel::kernel_it(t, om[k])),
        );
        let conv = tensor.matrix(&transforms, &g_values).unwrap().dot(&f_values);

        for (i, &t) in basis.times().iter().enumerate() {
            let exact = (kernel::kernel_it(t, om[l]) - kernel::kernel_it(t, om[k]))
                / (om[k] - om[l]);
            assert!((conv[i] - exact).abs() < 1e-10, "node {i}: {} vs {exact}", conv[i]);
        }
    }

    #[test]
    fn equal_frequency_diagonal() {
        let (basis, transforms, tensor) = setup();
        let k = 4;
        let omega = basis.frequencies()[k];

        let g_values = Array1::from_iter(
            basis
                .times()
                .iter()
                .map(|&t| kernel::kernel_it(t, omega)),
        );
        let conv = tensor.matrix(&transforms, &g_values).unwrap().dot(&g_values);

        for (i, &t) in basis.times().iter().enumerate() {
            let boundary = if t >= 0.0 {
                -kernel::kernel_it_abs(1.0, omega)
            } else {
                kernel::kernel_it_abs(0.0, omega)
            };
            let exact = (t + boundary) * kernel::kernel_it(t, omega);
            assert!((conv[i] - exact).abs() < 1e-10);
        }
    }

    #[test]
    fn convolution_of_off_grid_exponentials() {
        // dimensionless frequencies beta * 0.2 and beta * (-0.7) at beta = 10
        let basis = DlrBasis::build(100.0, 1e-12, 500).unwrap();
        let beta = 10.0;
        let transforms = TransformPack::new(&basis, beta).unwrap();
        let tensor = ConvolutionTensor::new(&basis, beta, Statistics::Fermion).unwrap();
        let (wa, wb) = (2.0, -7.0);

        let f_values =
            Array1::from_iter(basis.times().iter().map(|&t| kernel::kernel_it(t, wa)));
        let g_values =
            Array1::from_iter(basis.times().iter().map(|&t| kernel::kernel_it(t, wb)));
        let conv = tensor.matrix(&transforms, &g_values).unwrap().dot(&f_values);

        for (i, &t) in basis.times().iter().enumerate() {
            let exact =
                beta * (kernel::kernel_it(t, wb) - kernel::kernel_it(t, wa)) / (wa - wb);
            assert!((conv[i] - exact).abs() < 1e-11, "node {i}");
        }
    }
}
