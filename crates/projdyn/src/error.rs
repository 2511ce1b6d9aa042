//! Library error type.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DynamicsError {
    /// Reduction mod `prime` is not a morphism over the algebraic closure.
    #[error("bad prime {prime}: reduction is degenerate")]
    BadPrime { prime: u64 },

    #[error("no good primes in [{lo}, {hi}]")]
    NoGoodPrimes { lo: u64, hi: u64 },

    #[error("not an endomorphism: {reason}")]
    NonEndomorphism { reason: String },

    /// Elimination could not finish for one chart or one polynomial.
    #[error("algebra solver: {reason}")]
    AlgebraSolver { reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("cannot parse {input:?}: {reason}")]
    Parse { input: String, reason: String },

    #[error("worker pool: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, DynamicsError>;
