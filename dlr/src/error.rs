//! Error types used throughout this crate.

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied parameter is outside its documented domain.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The adaptive pivoted QR discovered a rank larger than the caller's cap.
    #[error("kernel rank {rank} exceeds the requested maximum of {max_rank}")]
    RankOverflow {
        /// Rank discovered by the adaptive factorization.
        rank: usize,
        /// Caller-supplied upper bound.
        max_rank: usize,
    },
    /// A dense LU factorization hit an exactly zero pivot. This does not occur
    /// for well-formed representations and indicates numerical pathology.
    #[error("linear system is singular")]
    SingularSystem,
    /// Error that does not originate from this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type definition for results with an [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;
