//! The lifting state machine.
//!
//! Seeded → (HenselStep | BruteForceStep)* → Validated | Rejected.
//! A Newton step doubles the precision when the Newton matrix Mₙ − I is
//! invertible; otherwise every digit extension is tried and each periodic one
//! becomes its own work item.

use std::collections::{BTreeSet, HashMap, VecDeque};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Zero;
use rayon::prelude::*;
use tracing::{debug, trace};

use super::height::HeightBound;
use super::lattice::round_to_point;
use super::types::{LiftOutcome, LiftRejection, LiftState, LiftTask, PrecisionState};
use crate::arith::linalg::{identity, inverse, mat_sub, mat_vec};
use crate::arith::{ResidueRing, Ring};
use crate::cfg::worker_pool;
use crate::error::Result;
use crate::linearize::Linearizer;
use crate::space::{Endomorphism, FpPoint, ProjectivePoint};

/// Linearizers of `f` over ℤ/pᵏ, built on first use.
struct LinearizerCache<'a> {
    f: &'a Endomorphism,
    p: u64,
    by_precision: HashMap<u32, Linearizer<ResidueRing>>,
}

impl<'a> LinearizerCache<'a> {
    fn new(f: &'a Endomorphism, p: u64) -> Self {
        Self {
            f,
            p,
            by_precision: HashMap::new(),
        }
    }

    fn at(&mut self, k: u32) -> &Linearizer<ResidueRing> {
        let (f, p) = (self.f, self.p);
        self.by_precision.entry(k).or_insert_with(|| {
            let ring = ResidueRing::new(p, k);
            let polys = f.polys_in(&ring);
            Linearizer::new(ring, polys)
        })
    }
}

enum Newton {
    Lifted(Vec<BigInt>),
    NotPeriodic,
    Singular,
}

/// Lifts periodic points of `f mod p` to rational periodic points.
#[derive(Clone, Debug)]
pub struct Lifter<'a> {
    f: &'a Endomorphism,
    p: u64,
    precision: u32,
    log_bound: f64,
}

impl<'a> Lifter<'a> {
    pub fn new(f: &'a Endomorphism, p: u64, bound: &HeightBound) -> Self {
        Self {
            f,
            p,
            precision: bound.precision_for(p),
            log_bound: bound.log_bound(),
        }
    }

    /// Override the target p-adic precision.
    pub fn with_precision(self, precision: u32) -> Self {
        Self {
            precision: precision.max(1),
            ..self
        }
    }

    #[inline]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    #[inline]
    pub fn prime(&self) -> u64 {
        self.p
    }

    /// Runs every work item spawned by one seed to a terminal outcome.
    pub fn lift_seed(&self, seed: &FpPoint, period: usize) -> Result<Vec<LiftOutcome>> {
        let mut cache = LinearizerCache::new(self.f, self.p);
        let mut queue = VecDeque::from([LiftTask {
            coords: seed.lift(),
            pivot: seed.pivot(),
            period,
            precision: PrecisionState::seeded(self.p, self.precision),
        }]);
        let mut outcomes = Vec::new();
        while let Some(task) = queue.pop_front() {
            trace!(seed = %seed, period, state = ?LiftState::Seeded, k = task.precision.k, "work item");
            let outcome = self.run(task, &mut cache, &mut queue)?;
            match &outcome {
                LiftOutcome::Validated { point, period } => {
                    trace!(seed = %seed, %point, period, "validated")
                }
                LiftOutcome::Rejected(why) => trace!(seed = %seed, n = period, %why, "rejected"),
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    fn run(
        &self,
        mut task: LiftTask,
        cache: &mut LinearizerCache<'_>,
        queue: &mut VecDeque<LiftTask>,
    ) -> Result<LiftOutcome> {
        while !task.precision.is_complete() {
            let k = task.precision.k;
            let next = task.precision.doubled();
            match self.hensel_step(&task, next.k, cache)? {
                Newton::Lifted(coords) => {
                    trace!(state = ?LiftState::HenselStep, k = next.k, "newton step");
                    task.coords = coords;
                    task.precision = next;
                }
                Newton::NotPeriodic => {
                    return Ok(LiftOutcome::Rejected(LiftRejection::NotPeriodicModPk { k }));
                }
                Newton::Singular => {
                    trace!(state = ?LiftState::BruteForceStep, k, "newton matrix singular");
                    let mut lifts = self.digit_lifts(&task, cache)?.into_iter();
                    let Some(first) = lifts.next() else {
                        return Ok(LiftOutcome::Rejected(LiftRejection::NoLift { k }));
                    };
                    let precision = task.precision.next_digit();
                    for coords in lifts {
                        queue.push_back(LiftTask {
                            coords,
                            precision,
                            ..task.clone()
                        });
                    }
                    task.coords = first;
                    task.precision = precision;
                }
            }
        }
        self.finish(&task)
    }

    /// One Newton step from pᵏ to p^`k2`.
    fn hensel_step(
        &self,
        task: &LiftTask,
        k2: u32,
        cache: &mut LinearizerCache<'_>,
    ) -> Result<Newton> {
        let k = task.precision.k;
        let n = task.period;
        let pk = task.precision.modulus();

        let lin2 = cache.at(k2);
        let image = lin2.iterate(&task.coords, n)?;
        let full = lin2.ring().modulus().clone();
        let g: Vec<BigInt> = image
            .iter()
            .zip(&task.coords)
            .map(|(s, t)| (s - t).mod_floor(&full))
            .collect();
        if g.iter().any(|x| !x.mod_floor(&pk).is_zero()) {
            return Ok(Newton::NotPeriodic);
        }

        let lin_d = cache.at(k2 - k);
        let ring_d = lin_d.ring().clone();
        let base: Vec<BigInt> = task.coords.iter().map(|c| ring_d.reduce(c)).collect();
        let m = lin_d.multiplier(&base, n)?;
        let a = mat_sub(&ring_d, &m, &identity(&ring_d, m.nrows()));
        let Some(a_inv) = inverse(&ring_d, &a) else {
            return Ok(Newton::Singular);
        };
        let delta: Vec<BigInt> = g
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != task.pivot)
            .map(|(_, x)| ring_d.reduce(&(x / &pk)))
            .collect();
        let step = mat_vec(&ring_d, &a_inv, &delta);

        let mut coords = task.coords.clone();
        let chart = (0..coords.len()).filter(|&i| i != task.pivot);
        for (i, s) in chart.zip(step) {
            coords[i] = (&coords[i] - &pk * s).mod_floor(&full);
        }
        Ok(Newton::Lifted(coords))
    }

    /// All extensions by one digit that are still periodic mod pᵏ⁺¹.
    fn digit_lifts(
        &self,
        task: &LiftTask,
        cache: &mut LinearizerCache<'_>,
    ) -> Result<Vec<Vec<BigInt>>> {
        let pk = task.precision.modulus();
        let lin = cache.at(task.precision.k + 1);
        let chart: Vec<usize> = (0..task.coords.len()).filter(|&i| i != task.pivot).collect();
        let total = (self.p as u128).pow(chart.len() as u32);
        let mut out = Vec::new();
        for idx in 0..total {
            let mut t = idx;
            let mut coords = task.coords.clone();
            for &i in &chart {
                let digit = BigInt::from((t % self.p as u128) as u64);
                t /= self.p as u128;
                coords[i] = lin.ring().reduce(&(&coords[i] + &pk * digit));
            }
            if lin.iterate(&coords, task.period)? == coords {
                out.push(coords);
            }
        }
        Ok(out)
    }

    /// Round at full precision, then confirm periodicity over ℚ.
    fn finish(&self, task: &LiftTask) -> Result<LiftOutcome> {
        let modulus = task.precision.modulus();
        let Some(v) = round_to_point(&task.coords, &modulus, self.log_bound) else {
            return Ok(LiftOutcome::Rejected(LiftRejection::PrecisionExhausted));
        };
        let point = ProjectivePoint::from_integers(&v)?.normalize();
        let mut q = point.clone();
        for j in 1..=task.period {
            q = self.f.apply(&q)?;
            if q == point {
                return Ok(LiftOutcome::Validated { point, period: j });
            }
        }
        Ok(LiftOutcome::Rejected(LiftRejection::NotPeriodic))
    }
}

/// Lift every seed on `workers` threads; returns the validated points with
/// their minimal periods, sorted and deduplicated. Branches of one seed that
/// converge on the same point count once.
pub fn lift_all(
    lifter: &Lifter<'_>,
    seeds: &[(FpPoint, usize)],
    workers: usize,
) -> Result<Vec<(ProjectivePoint, usize)>> {
    let pool = worker_pool(workers)?;
    let per_seed: Vec<Result<Vec<LiftOutcome>>> = pool.install(|| {
        seeds
            .par_iter()
            .map(|(seed, n)| lifter.lift_seed(seed, *n))
            .collect()
    });
    let mut found = BTreeSet::new();
    let mut validated = 0usize;
    let mut rejected = 0usize;
    for outcomes in per_seed {
        for outcome in outcomes? {
            match outcome {
                LiftOutcome::Validated { point, period } => {
                    validated += 1;
                    found.insert((point, period));
                }
                LiftOutcome::Rejected(_) => rejected += 1,
            }
        }
    }
    debug!(
        p = lifter.prime(),
        precision = lifter.precision(),
        seeds = seeds.len(),
        validated,
        distinct = found.len(),
        rejected,
        "lifting finished"
    );
    Ok(found.into_iter().collect())
}
