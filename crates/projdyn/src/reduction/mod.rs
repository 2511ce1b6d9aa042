//! Modular reduction: cycle structure mod p and candidate exact periods.
//!
//! Purpose
//! - Reduce an endomorphism at a prime, walk every point of Pᴺ(𝔽ₚ) to its
//!   cycle, and turn each cycle's mod-p period into the set of periods a
//!   rational point reducing onto that cycle could have.
//! - `possible_periods` (in `intersect`) intersects those sets across primes.
//!
//! Why this design
//! - The period set of one prime is a pure function of (f, p); primes fan out
//!   independently and merge by intersection.
//!
//! References
//! - Hutz, "Good reduction of periodic points", Illinois J. Math. 53 (2009):
//!   a rational point of exact period n reducing to a point of period m mod p
//!   has n = m, n = m·r, or n = m·r·pᵉ, with r built from the multiplicative
//!   orders of the multiplier's eigenvalues.

mod intersect;

pub use intersect::{possible_periods, PrimeRange};

use std::collections::{BTreeSet, HashMap};

use nalgebra::DMatrix;
use num_integer::Integer;
use tracing::{debug, trace};

use crate::arith::linalg::charpoly;
use crate::arith::univariate::{fp_factor, root_order};
use crate::arith::PrimeField;
use crate::error::Result;
use crate::linearize::Linearizer;
use crate::space::{Endomorphism, FpPoint, SelfMap};

/// One cycle of the reduced map.
#[derive(Clone, Debug)]
pub struct ModCycle {
    /// First cycle point met during enumeration.
    pub representative: FpPoint,
    /// Minimal period mod p.
    pub period: usize,
    /// Multiplier of f^period at the representative, over 𝔽ₚ.
    pub multiplier: DMatrix<u64>,
    /// Sorted candidate exact periods of rational points over this cycle.
    pub candidates: Vec<usize>,
}

/// Everything learned from one prime.
#[derive(Clone, Debug)]
pub struct ReductionReport {
    pub prime: u64,
    pub cycles: Vec<ModCycle>,
}

impl ReductionReport {
    /// Union of the candidate periods of all cycles.
    pub fn periods(&self) -> BTreeSet<usize> {
        self.cycles
            .iter()
            .flat_map(|c| c.candidates.iter().copied())
            .collect()
    }

    /// `(representative, candidate period)` for every cycle and candidate.
    pub fn seeds(&self) -> Vec<(FpPoint, usize)> {
        self.cycles
            .iter()
            .flat_map(|c| c.candidates.iter().map(|&n| (c.representative.clone(), n)))
            .collect()
    }
}

/// Multiplicative orders of the nonzero eigenvalues of `m` over 𝔽̄ₚ.
pub fn eigenvalue_orders(field: &PrimeField, m: &DMatrix<u64>) -> BTreeSet<u64> {
    let chi = charpoly(field, m);
    fp_factor(field, &chi)
        .iter()
        .filter_map(|(g, _)| root_order(field, g))
        .collect()
}

/// Candidate exact periods for a cycle of mod-p period `m` in Pᴺ.
pub fn candidate_periods(m: usize, orders: &BTreeSet<u64>, n: usize, p: u64) -> Vec<usize> {
    let orders: Vec<u64> = orders.iter().copied().collect();
    let mut rs = BTreeSet::new();
    for mask in 1u32..(1u32 << orders.len()) {
        let r = orders
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .fold(1u64, |acc, (_, o)| acc.lcm(o));
        rs.insert(r as usize);
    }
    let p = p as usize;
    let mut out = BTreeSet::from([m]);
    for r in rs {
        out.insert(m * r);
        if n == 1 {
            if p == 2 || p == 3 {
                out.insert(m * r * p);
            }
        } else {
            out.insert(m * r * p);
            if p == 2 {
                out.insert(m * r * 4);
                out.insert(m * r * 8);
            }
        }
    }
    out.into_iter().collect()
}

/// Classify every cycle of `f mod p`. Fails with `BadPrime` for degenerate
/// reductions.
pub fn reduce_and_classify(f: &Endomorphism, p: u64) -> Result<ReductionReport> {
    let g = f.reduce(p)?;
    let field = g.field();
    let lin = Linearizer::new(field, g.polys().to_vec());
    let n = g.dimension();

    // Walk id that first reached each point.
    let mut visited: HashMap<FpPoint, usize> = HashMap::new();
    let mut cycles = Vec::new();
    for (walk, start) in g.points().into_iter().enumerate() {
        let walk = walk + 1;
        if visited.contains_key(&start) {
            continue;
        }
        let mut path: Vec<FpPoint> = Vec::new();
        let mut cur = start;
        loop {
            match visited.get(&cur).copied() {
                Some(w) if w == walk => {
                    let pos = path.iter().position(|x| *x == cur).unwrap_or(0);
                    let period = path.len() - pos;
                    let multiplier = lin.multiplier(cur.coords(), period)?;
                    let orders = eigenvalue_orders(&field, &multiplier);
                    let candidates = candidate_periods(period, &orders, n, p);
                    trace!(p, point = %cur, period, ?orders, "cycle mod p");
                    cycles.push(ModCycle {
                        representative: cur,
                        period,
                        multiplier,
                        candidates,
                    });
                    break;
                }
                Some(_) => break,
                None => {
                    visited.insert(cur.clone(), walk);
                    let next = g.apply(&cur)?;
                    path.push(cur);
                    cur = next;
                }
            }
        }
    }
    let report = ReductionReport { prime: p, cycles };
    debug!(p, cycles = report.cycles.len(), periods = ?report.periods(), "reduction");
    Ok(report)
}
