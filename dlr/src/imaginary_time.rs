//! Relative and absolute representations of imaginary-time points.
//!
//! Every imaginary-time value consumed or produced by this crate lives on
//! `[-1/2, 1/2]` together with the right endpoint `1`: a point in `(1/2, 1)`
//! is stored as the negative offset `t - 1`, which preserves its distance to
//! the right endpoint exactly. The endpoint itself stays `1`, so conversions
//! round-trip on every stored grid.

use crate::convert;

/// Converts a point from relative to absolute format.
#[must_use]
pub fn rel_to_abs(t: f64) -> f64 {
    if t < 0.0 {
        t + 1.0
    } else {
        t
    }
}

/// Converts a point from absolute to relative format.
///
/// Callers holding absolute values should be aware that this direction cannot
/// recover precision already lost near `t = 1`.
#[must_use]
pub fn abs_to_rel(t: f64) -> f64 {
    if t > 0.5 && t < 1.0 {
        t - 1.0
    } else {
        t
    }
}

/// Returns `n` equispaced points covering `[0, 1]`, endpoints included, in
/// relative format.
///
/// # Panics
///
/// Panics if `n` is smaller than 2.
#[must_use]
pub fn equispaced_grid(n: usize) -> Vec<f64> {
    assert!(n >= 2);

    let spacing = 1.0 / convert::f64_from_usize(n - 1);
    (0..n)
        .map(|i| {
            if i <= n / 2 {
                convert::f64_from_usize(i) * spacing
            } else if i == n - 1 {
                1.0
            } else {
                -convert::f64_from_usize(n - 1 - i) * spacing
            }
        })
        .collect()
}
