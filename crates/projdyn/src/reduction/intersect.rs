//! Period-set intersection across a range of primes.

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::{debug, info};

use super::reduce_and_classify;
use crate::arith::primes_in;
use crate::cfg::worker_pool;
use crate::error::{DynamicsError, Result};
use crate::space::Endomorphism;

/// Inclusive range of primes to reduce at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimeRange {
    pub lo: u64,
    pub hi: u64,
}

impl PrimeRange {
    pub fn new(lo: u64, hi: u64) -> Self {
        Self { lo, hi }
    }
}

impl Default for PrimeRange {
    fn default() -> Self {
        Self { lo: 1, hi: 20 }
    }
}

/// An upper bound alone means `[1, hi]`.
impl From<u64> for PrimeRange {
    fn from(hi: u64) -> Self {
        Self { lo: 1, hi }
    }
}

impl From<(u64, u64)> for PrimeRange {
    fn from((lo, hi): (u64, u64)) -> Self {
        Self { lo, hi }
    }
}

/// Sorted intersection of the per-prime period sets over the good primes in
/// `range` not listed in `bad_primes`, computed on `workers` threads.
pub fn possible_periods(
    f: &Endomorphism,
    range: PrimeRange,
    bad_primes: &[u64],
    workers: usize,
) -> Result<Vec<usize>> {
    let primes: Vec<u64> = primes_in(range.lo, range.hi)
        .into_iter()
        .filter(|p| !bad_primes.contains(p))
        .collect();
    let pool = worker_pool(workers)?;
    let per_prime: Vec<(u64, Result<BTreeSet<usize>>)> = pool.install(|| {
        primes
            .par_iter()
            .map(|&p| (p, reduce_and_classify(f, p).map(|r| r.periods())))
            .collect()
    });

    let mut acc: Option<BTreeSet<usize>> = None;
    for (p, res) in per_prime {
        match res {
            Ok(periods) => {
                debug!(p, ?periods, "periods mod p");
                acc = Some(match acc {
                    None => periods,
                    Some(prev) => prev.intersection(&periods).copied().collect(),
                });
            }
            Err(DynamicsError::BadPrime { prime }) => {
                debug!(prime, "skipping bad prime");
            }
            Err(e) => return Err(e),
        }
    }
    let periods = acc.ok_or(DynamicsError::NoGoodPrimes {
        lo: range.lo,
        hi: range.hi,
    })?;
    info!(?periods, lo = range.lo, hi = range.hi, "possible periods");
    Ok(periods.into_iter().collect())
}
