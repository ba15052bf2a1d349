#![warn(clippy::all, clippy::cargo, clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

//! Discrete Lehmann representation of imaginary-time Green's functions.
//!
//! Given a dimensionless cutoff `lambda` and a target accuracy `epsilon`,
//! [`basis::DlrBasis::build`] selects `O(log(lambda) log(1/epsilon))`
//! real-frequency support points together with matching imaginary-time and
//! Matsubara interpolation nodes. Any Green's function whose spectral
//! density lives inside the cutoff window can then be carried around as a
//! short coefficient vector: [`transforms`] moves between the three
//! representations, [`convolution`] and [`inner_product`] implement the
//! bilinear operations on expansions, and [`dyson`] solves the nonlinear
//! Dyson equation by weighted fixed-point iteration in either domain.
//!
//! Imaginary-time points are dimensionless on the unit interval and use the
//! relative format of [`imaginary_time`] everywhere: a point past the
//! midpoint is stored as its negative distance to the right endpoint, which
//! keeps evaluation accurate up to the far end of the interval.

pub mod basis;
mod chebyshev;
mod convert;
pub mod convolution;
pub mod dyson;
pub mod error;
pub mod fine_grid;
pub mod fit;
pub mod imaginary_time;
pub mod inner_product;
pub mod kernel;
mod pivoted_qr;
pub mod transforms;
