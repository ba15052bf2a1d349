//! Composite Chebyshev discretization of the Lehmann kernel.
//!
//! The kernel is smooth away from `t = 0`, `t = 1` and `omega = 0` but
//! develops boundary layers there, so both variables are covered with
//! dyadically graded panels carrying a fixed-degree Chebyshev rule each.
//! The sampled matrix is accurate to far better than machine-precision
//! interpolation error and is the input of the node-selection stage.

use super::chebyshev::PanelRule;
use super::convert;
use super::error::{Error, Result};
use super::kernel;
use ndarray::Array2;

/// Chebyshev degree carried by every panel.
pub const FINE_DEGREE: usize = 24;

/// Dense sampling of the Lehmann kernel on the composite fine grid.
pub struct FineGrid {
    lambda: f64,
    npt: usize,
    npo: usize,
    tau: Vec<f64>,
    omega: Vec<f64>,
    kernel: Array2<f64>,
    error: [f64; 2],
}

impl FineGrid {
    /// Discretizes the kernel for the dimensionless cutoff `lambda`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `lambda` is not strictly positive.
    pub fn build(lambda: f64) -> Result<Self> {
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "cutoff lambda must be positive, got {lambda}"
            )));
        }

        let nlam = convert::usize_from_f64(lambda.log2().ceil().max(1.0));
        let npt = nlam.saturating_sub(2).max(1);
        let npo = nlam.max(1);

        let rule = PanelRule::new(FINE_DEGREE);
        let tau_breaks = tau_panel_breaks(npt);
        let omega_breaks = omega_panel_breaks(npo, lambda);

        let tau = tau_nodes(&rule, &tau_breaks);
        let omega: Vec<f64> = omega_breaks
            .windows(2)
            .flat_map(|panel| rule.map_to(panel[0], panel[1]))
            .collect();

        let nt = tau.len();
        let no = omega.len();
        let mut kmat = Array2::zeros((nt, no));

        // sample the lower half in t only; the mirror image follows from
        // K(1 - t, -omega) = K(t, omega) without precision loss
        for i in 0..nt / 2 {
            for j in 0..no {
                kmat[[i, j]] = kernel::kernel_it_abs(tau[i], omega[j]);
            }
        }
        for i in nt / 2..nt {
            for j in 0..no {
                kmat[[i, j]] = kmat[[nt - 1 - i, no - 1 - j]];
            }
        }

        let error = measure_interpolation_error(&rule, &tau_breaks, &omega_breaks, &tau, &omega, &kmat);

        Ok(Self {
            lambda,
            npt,
            npo,
            tau,
            omega,
            kernel: kmat,
            error,
        })
    }

    /// Returns the dimensionless cutoff.
    #[must_use]
    pub const fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Returns the number of panels in the lower half of the time variable.
    #[must_use]
    pub const fn time_panels(&self) -> usize {
        self.npt
    }

    /// Returns the number of panels on either side of `omega = 0`.
    #[must_use]
    pub const fn frequency_panels(&self) -> usize {
        self.npo
    }

    /// Returns the imaginary-time nodes in relative format, ascending in
    /// absolute time.
    #[must_use]
    pub fn tau(&self) -> &[f64] {
        &self.tau
    }

    /// Returns the real-frequency nodes on `[-lambda, lambda]`.
    #[must_use]
    pub fn omega(&self) -> &[f64] {
        &self.omega
    }

    /// Returns the sampled kernel with times along rows and frequencies along
    /// columns.
    #[must_use]
    pub fn kernel(&self) -> &Array2<f64> {
        &self.kernel
    }

    /// Returns the measured relative panel-interpolation error in the time
    /// and frequency variables.
    #[must_use]
    pub const fn interpolation_error(&self) -> [f64; 2] {
        self.error
    }
}

fn tau_panel_breaks(npt: usize) -> Vec<f64> {
    let mut breaks = vec![0.0];
    for i in 0..npt {
        breaks.push((0.5_f64).powi(i32::try_from(npt - i).unwrap()));
    }
    breaks
}

fn omega_panel_breaks(npo: usize, lambda: f64) -> Vec<f64> {
    let mut breaks = Vec::with_capacity(2 * npo + 1);
    for i in 0..npo {
        breaks.push(-lambda * (0.5_f64).powi(i32::try_from(i).unwrap()));
    }
    breaks.push(0.0);
    for i in (0..npo).rev() {
        breaks.push(lambda * (0.5_f64).powi(i32::try_from(i).unwrap()));
    }
    breaks
}

fn tau_nodes(rule: &PanelRule, breaks: &[f64]) -> Vec<f64> {
    let mut tau: Vec<f64> = breaks
        .windows(2)
        .flat_map(|panel| rule.map_to(panel[0], panel[1]))
        .collect();

    // points in (1/2, 1) are stored in relative format straight away
    let half = tau.len();
    for i in (0..half).rev() {
        let reflected = -tau[i];
        tau.push(reflected);
    }
    tau
}

/// Measures the panel-interpolation error of the sampled kernel in each
/// variable, relative to the largest kernel sample, by comparing against
/// direct evaluation at twice as many Chebyshev points per panel.
fn measure_interpolation_error(
    rule: &PanelRule,
    tau_breaks: &[f64],
    omega_breaks: &[f64],
    tau: &[f64],
    omega: &[f64],
    kmat: &Array2<f64>,
) -> [f64; 2] {
    let test_rule = PanelRule::new(2 * FINE_DEGREE);
    let scale = kmat.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
    let nt_half = tau.len() / 2;

    let mut err_t = 0.0_f64;
    for (p, panel) in tau_breaks.windows(2).enumerate() {
        let rows = p * FINE_DEGREE..(p + 1) * FINE_DEGREE;
        for &t in &test_rule.map_to(panel[0], panel[1]) {
            for (j, &om) in omega.iter().enumerate() {
                let samples: Vec<f64> = rows.clone().map(|i| kmat[[i, j]]).collect();
                let interpolated = rule.interpolate(panel[0], panel[1], &samples, t);
                err_t = err_t.max((interpolated - kernel::kernel_it_abs(t, om)).abs());
            }
        }
    }

    let mut err_om = 0.0_f64;
    for (p, panel) in omega_breaks.windows(2).enumerate() {
        let cols = p * FINE_DEGREE..(p + 1) * FINE_DEGREE;
        for &om in &test_rule.map_to(panel[0], panel[1]) {
            for (i, &t) in tau.iter().take(nt_half).enumerate() {
                let samples: Vec<f64> = cols.clone().map(|j| kmat[[i, j]]).collect();
                let interpolated = rule.interpolate(panel[0], panel[1], &samples, om);
                err_om = err_om.max((interpolated - kernel::kernel_it_abs(t, om)).abs());
            }
        }
    }

    [err_t / scale, err_om / scale]
}
