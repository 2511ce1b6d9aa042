//! Run configuration for the periodic / preperiodic searches.
//!
//! Policy
//! - Defaults are the values that work well for maps of P¹ with small
//!   coefficients. Callers override fields with struct update syntax.

use crate::error::{DynamicsError, Result};
use crate::preimage::ClosureCfg;
use crate::reduction::PrimeRange;

/// Default first prime tried for lifting.
pub const DEFAULT_LIFTING_PRIME: u64 = 23;

/// Options for `rational_periodic_points` and everything built on it.
#[derive(Clone, Debug)]
pub struct PeriodicCfg {
    /// Primes used to bound the possible periods.
    pub prime_bound: PrimeRange,
    /// Starting prime for p-adic lifting; advanced past bad primes.
    pub lifting_prime: u64,
    /// Precomputed possible periods; skips the intersection step.
    pub periods: Option<Vec<usize>>,
    /// Primes known to be bad; never used for reduction or lifting.
    pub bad_primes: Vec<u64>,
    /// Worker threads for the per-prime and per-seed fan-out.
    pub workers: usize,
    /// Limits for the preimage closure of the preperiodic search.
    pub closure: ClosureCfg,
}

impl Default for PeriodicCfg {
    fn default() -> Self {
        Self {
            prime_bound: PrimeRange::default(),
            lifting_prime: DEFAULT_LIFTING_PRIME,
            periods: None,
            bad_primes: Vec::new(),
            workers: default_workers(),
            closure: ClosureCfg::default(),
        }
    }
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Dedicated rayon pool with `workers` threads (at least one).
pub(crate) fn worker_pool(workers: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| DynamicsError::WorkerPool(e.to_string()))
}
