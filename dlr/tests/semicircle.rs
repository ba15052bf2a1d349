#![allow(missing_docs)]

use dlr::basis::DlrBasis;
use dlr::imaginary_time;
use dlr::kernel::{self, Statistics};
use dlr::transforms::TransformPack;
use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Chebyshev--Gauss quadrature of the second kind: nodes and weights for
/// integrals against the weight `sqrt(1 - x^2)` on `[-1, 1]`. This plays the
/// role of the reference quadrature generator, which is not part of the
/// library.
fn semicircle_rule(n: usize) -> Vec<(f64, f64)> {
    #[allow(clippy::cast_precision_loss)]
    (1..=n)
        .map(|k| {
            let angle = k as f64 * PI / (n as f64 + 1.0);
            (angle.cos(), PI / (n as f64 + 1.0) * angle.sin().powi(2))
        })
        .collect()
}

fn green_it(rule: &[(f64, f64)], t: f64, beta: f64) -> f64 {
    // rho(omega) = (2 / pi) sqrt(1 - omega^2) on [-1, 1]
    rule.iter()
        .map(|&(x, w)| 2.0 / PI * w * kernel::kernel_it(t, beta * x))
        .sum()
}

fn green_mf(rule: &[(f64, f64)], n: i32, beta: f64) -> Complex64 {
    rule.iter()
        .map(|&(x, w)| 2.0 / PI * w * kernel::kernel_mf(n, beta * x, Statistics::Fermion))
        .sum()
}

#[test]
fn semicircular_density_in_time_and_frequency() {
    let lambda = 1000.0;
    let beta = 1000.0;
    let epsilon = 1e-14;
    let basis = DlrBasis::build(lambda, epsilon, 500).unwrap();
    let transforms = TransformPack::new(&basis, beta).unwrap();

    // the exponential kernel varies on the scale 1 / (t * beta) in omega, so
    // the rule needs a node count well past beta / 2 before it converges
    let rule = semicircle_rule(2000);

    let values = Array1::from_iter(basis.times().iter().map(|&t| green_it(&rule, t, beta)));
    let coefficients = transforms
        .coefficients_from_values(&values)
        .unwrap()
        .to_vec();

    let mut err_it = 0.0_f64;
    for &t in &imaginary_time::equispaced_grid(1000) {
        let difference = basis.eval_it(&coefficients, t) - green_it(&rule, t, beta);
        err_it = err_it.max(difference.abs());
    }
    assert!(err_it < 100.0 * epsilon, "imaginary-time error {err_it:e}");

    let mut err_mf = 0.0_f64;
    for n in -1000..=1000 {
        let difference =
            basis.eval_mf(&coefficients, n, Statistics::Fermion) - green_mf(&rule, n, beta);
        err_mf = err_mf.max(difference.norm());
    }
    assert!(err_mf < 100.0 * epsilon, "Matsubara error {err_mf:e}");
}
