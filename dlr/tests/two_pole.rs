#![allow(missing_docs)]

use dlr::basis::DlrBasis;
use dlr::imaginary_time;
use dlr::kernel;
use dlr::transforms::TransformPack;
use ndarray::Array1;

// discrete spectral densities are the worst case for grid-based methods and
// the natural one for a pole expansion: a handful of poles spread over the
// whole cutoff window, some of them close to its edge
const POLES: [f64; 5] = [-0.804, -0.443, 0.093, 0.915, 0.929];

fn green(t: f64, beta: f64) -> f64 {
    POLES
        .iter()
        .map(|&omega| kernel::kernel_it(t, beta * omega))
        .sum()
}

#[test]
fn five_pole_spectrum_interpolates_to_near_machine_precision() {
    let lambda = 1000.0;
    let beta = 1000.0;
    let basis = DlrBasis::build(lambda, 1e-14, 500).unwrap();
    let transforms = TransformPack::new(&basis, beta).unwrap();

    let [err_t, err_om] = basis.fine_grid_error();
    assert!(err_t < 1e-13 && err_om < 1e-13);

    let values = Array1::from_iter(basis.times().iter().map(|&t| green(t, beta)));
    let coefficients = transforms
        .coefficients_from_values(&values)
        .unwrap()
        .to_vec();

    let mut largest = 0.0_f64;
    let mut scale = 0.0_f64;
    for &t in &imaginary_time::equispaced_grid(10_000) {
        let exact = green(t, beta);
        largest = largest.max((basis.eval_it(&coefficients, t) - exact).abs());
        scale = scale.max(exact.abs());
    }

    assert!(
        largest / scale < 1e-13,
        "relative interpolation error {:e}",
        largest / scale
    );
}

#[test]
fn coefficients_decay_with_the_spectrum_inside_the_window() {
    // every pole sits inside [-lambda, lambda], so the expansion is exact to
    // epsilon and in particular bounded
    let beta = 1000.0;
    let basis = DlrBasis::build(1000.0, 1e-14, 500).unwrap();
    let transforms = TransformPack::new(&basis, beta).unwrap();

    let values = Array1::from_iter(basis.times().iter().map(|&t| green(t, beta)));
    let coefficients = transforms.coefficients_from_values(&values).unwrap();

    assert!(coefficients.iter().all(|c| c.is_finite()));
    let largest = coefficients.iter().fold(0.0_f64, |acc, &c| acc.max(c.abs()));
    assert!(largest < 1e3, "largest coefficient {largest}");
}
