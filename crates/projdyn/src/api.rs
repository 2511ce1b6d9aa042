//! Curated entry points: the full pipeline from a map to its rational
//! periodic and preperiodic points.
//!
//! Policy
//! - Functions here only orchestrate; the algorithms live in `reduction`,
//!   `lifting`, `preimage` and `graph`.
//! - Returned point sets are normalized, deduplicated and sorted.

use std::collections::BTreeSet;

use nalgebra::DMatrix;
use num_rational::BigRational;
use tracing::{debug, info};

use crate::arith::{next_prime, Rationals};
use crate::cfg::PeriodicCfg;
use crate::error::{DynamicsError, Result};
use crate::graph::CycleGraph;
use crate::lifting::{lift_all, HeightBound, Lifter};
use crate::linearize::Linearizer;
use crate::reduction::{reduce_and_classify, ReductionReport};
use crate::space::{Endomorphism, ProjectivePoint};

pub use crate::graph::cyclegraph;
pub use crate::preimage::{
    all_rational_preimages, connected_rational_component, rational_preimages, ClosureCfg,
    ClosureOutcome,
};
pub use crate::reduction::{possible_periods, PrimeRange};

/// Height-difference bound of `f` (degree ≥ 2).
pub fn height_bound(f: &Endomorphism) -> Result<HeightBound> {
    HeightBound::compute(f)
}

/// Reduction at the first good prime `>= start` that the caller has not
/// excluded.
fn lifting_report(f: &Endomorphism, start: u64, bad_primes: &[u64]) -> Result<ReductionReport> {
    let mut p = next_prime(start);
    loop {
        if !bad_primes.contains(&p) {
            match reduce_and_classify(f, p) {
                Ok(report) => return Ok(report),
                Err(DynamicsError::BadPrime { prime }) => debug!(prime, "lifting prime is bad"),
                Err(e) => return Err(e),
            }
        }
        p = next_prime(p + 1);
    }
}

/// Sorted possible periods, from `cfg.periods` when given.
fn periods_for(f: &Endomorphism, cfg: &PeriodicCfg) -> Result<Vec<usize>> {
    match &cfg.periods {
        Some(periods) => Ok(periods.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()),
        None => possible_periods(f, cfg.prime_bound, &cfg.bad_primes, cfg.workers),
    }
}

/// Every rational periodic point of `f`.
pub fn rational_periodic_points(f: &Endomorphism, cfg: &PeriodicCfg) -> Result<Vec<ProjectivePoint>> {
    let periods = periods_for(f, cfg)?;
    if periods.is_empty() {
        return Ok(Vec::new());
    }
    let bound = HeightBound::compute(f)?;
    let report = lifting_report(f, cfg.lifting_prime, &cfg.bad_primes)?;
    let wanted: BTreeSet<usize> = periods.into_iter().collect();
    let mut seeds = report.seeds();
    seeds.retain(|(_, n)| wanted.contains(n));
    seeds.sort();
    seeds.dedup();

    let lifter = Lifter::new(f, report.prime, &bound);
    info!(
        p = report.prime,
        precision = lifter.precision(),
        seeds = seeds.len(),
        "lifting"
    );
    let mut points = BTreeSet::new();
    for (p, n) in lift_all(&lifter, &seeds, cfg.workers)? {
        points.extend(f.orbit(&p, n.saturating_sub(1))?);
    }
    Ok(points.into_iter().collect())
}

/// Periodic points followed by their preimage closure, with the cap flag.
pub fn preperiodic_closure(f: &Endomorphism, cfg: &PeriodicCfg) -> Result<ClosureOutcome> {
    let periodic = rational_periodic_points(f, cfg)?;
    if periodic.is_empty() {
        return Ok(ClosureOutcome::default());
    }
    all_rational_preimages(f, &periodic, cfg.closure)
}

/// Every rational preperiodic point of `f`.
///
/// The closure stops at `cfg.closure.max_iterations`; use
/// `preperiodic_closure` to see whether that cap was hit.
pub fn rational_preperiodic_points(f: &Endomorphism, cfg: &PeriodicCfg) -> Result<Vec<ProjectivePoint>> {
    Ok(preperiodic_closure(f, cfg)?.points)
}

/// Orbit graph on the rational preperiodic points.
///
/// Built from `rational_preperiodic_points`, so a capped closure yields a
/// partial graph; check `preperiodic_closure(..).capped` when that matters.
pub fn rational_preperiodic_graph(
    f: &Endomorphism,
    cfg: &PeriodicCfg,
) -> Result<CycleGraph<ProjectivePoint>> {
    cyclegraph(&rational_preperiodic_points(f, cfg)?, f)
}

/// Exact multiplier of fⁿ at `p` over ℚ. With `check`, `p` must satisfy
/// fⁿ(p) = p and `n ≥ 1`.
pub fn multiplier(
    f: &Endomorphism,
    p: &ProjectivePoint,
    n: usize,
    check: bool,
) -> Result<DMatrix<BigRational>> {
    f.check_point(p)?;
    if check {
        if n < 1 {
            return Err(DynamicsError::InvalidInput {
                reason: "period must be a positive integer".into(),
            });
        }
        if f.nth_iterate(p, n)? != *p {
            return Err(DynamicsError::InvalidInput {
                reason: format!("{p} is not periodic of period {n}"),
            });
        }
    }
    let lin = Linearizer::new(Rationals, f.polys_in(&Rationals));
    lin.multiplier(p.coords(), n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::parse_point;
    use num_bigint::BigInt;

    fn q(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    fn cfg() -> PeriodicCfg {
        PeriodicCfg {
            workers: 2,
            ..PeriodicCfg::default()
        }
    }

    fn pts(items: &[&str]) -> Vec<ProjectivePoint> {
        let mut v: Vec<ProjectivePoint> = items.iter().map(|s| parse_point(s).unwrap()).collect();
        v.sort();
        v
    }

    fn quadratic_29_16() -> Endomorphism {
        Endomorphism::parse(&["x", "y"], &["x^2 - 29/16*y^2", "y^2"]).unwrap()
    }

    #[test]
    fn periodic_points_of_the_three_cycle_map() {
        let f = quadratic_29_16();
        assert_eq!(
            rational_periodic_points(&f, &cfg()).unwrap(),
            pts(&["(-7/4 : 1)", "(-1/4 : 1)", "(5/4 : 1)", "(1 : 0)"])
        );
    }

    #[test]
    fn preperiodic_points_of_the_three_cycle_map() {
        let f = quadratic_29_16();
        let out = preperiodic_closure(&f, &cfg()).unwrap();
        assert!(!out.capped);
        assert_eq!(out.points.len(), 9);
        let graph = rational_preperiodic_graph(&f, &cfg()).unwrap();
        assert_eq!(graph.len(), 9);
        assert!(graph.is_total());
        let mut lengths: Vec<usize> = graph.cycles().iter().map(Vec::len).collect();
        lengths.sort();
        assert_eq!(lengths, vec![1, 3]);
    }

    #[test]
    fn precomputed_periods_restrict_the_search() {
        let f = quadratic_29_16();
        let only_fixed = PeriodicCfg {
            periods: Some(vec![1]),
            ..cfg()
        };
        assert_eq!(
            rational_periodic_points(&f, &only_fixed).unwrap(),
            pts(&["(1 : 0)"])
        );
        let none = PeriodicCfg {
            periods: Some(Vec::new()),
            ..cfg()
        };
        assert!(rational_periodic_points(&f, &none).unwrap().is_empty());
        assert!(rational_preperiodic_points(&f, &none).unwrap().is_empty());
    }

    #[test]
    fn bad_lifting_prime_is_skipped() {
        let f = quadratic_29_16();
        let from_two = PeriodicCfg {
            lifting_prime: 2,
            bad_primes: vec![3],
            ..cfg()
        };
        assert_eq!(
            rational_periodic_points(&f, &from_two).unwrap(),
            rational_periodic_points(&f, &cfg()).unwrap()
        );
    }

    #[test]
    fn chebyshev_like_map() {
        // (x^2 + y^2 : 2xy): fixed points 1, -1 and ∞ ... 0 ↦ ∞.
        let f = Endomorphism::parse(&["x", "y"], &["x^2 + y^2", "2*x*y"]).unwrap();
        let periodic = rational_periodic_points(&f, &cfg()).unwrap();
        assert_eq!(periodic, pts(&["(-1 : 1)", "(1 : 1)", "(1 : 0)"]));
        let preperiodic = rational_preperiodic_points(&f, &cfg()).unwrap();
        assert_eq!(preperiodic, pts(&["(-1 : 1)", "(0 : 1)", "(1 : 1)", "(1 : 0)"]));
    }

    #[test]
    fn periodic_points_needing_digit_branching() {
        let f = Endomorphism::parse(&["x", "y"], &["-5*x^2 + 4*y^2", "4*x*y"]).unwrap();
        assert_eq!(
            rational_periodic_points(&f, &cfg()).unwrap(),
            pts(&["(-2 : 1)", "(-2/3 : 1)", "(2/3 : 1)", "(1 : 0)", "(2 : 1)"])
        );
        let from_three = PeriodicCfg {
            lifting_prime: 3,
            ..cfg()
        };
        assert_eq!(
            rational_periodic_points(&f, &from_three).unwrap(),
            rational_periodic_points(&f, &cfg()).unwrap()
        );
    }

    #[test]
    fn capped_closure_is_visible_through_preperiodic_closure() {
        let f = quadratic_29_16();
        let tight = PeriodicCfg {
            closure: ClosureCfg { max_iterations: 1 },
            ..cfg()
        };
        assert!(preperiodic_closure(&f, &tight).unwrap().capped);
        assert!(rational_preperiodic_points(&f, &tight).unwrap().len() < 9);
    }

    #[test]
    fn multiplier_of_the_three_cycle() {
        let f = quadratic_29_16();
        let p = parse_point("(5/4 : 1)").unwrap();
        let m = multiplier(&f, &p, 3, true).unwrap();
        assert_eq!(m[(0, 0)], q(35, 8));
    }

    #[test]
    fn multiplier_checks_periodicity() {
        let f = quadratic_29_16();
        let p = parse_point("(5/4 : 1)").unwrap();
        assert!(matches!(
            multiplier(&f, &p, 2, true),
            Err(DynamicsError::InvalidInput { .. })
        ));
        assert!(matches!(
            multiplier(&f, &p, 0, true),
            Err(DynamicsError::InvalidInput { .. })
        ));
        // Unchecked: the derivative of the second iterate, 4·(5/4)·(-1/4).
        assert_eq!(multiplier(&f, &p, 2, false).unwrap()[(0, 0)], q(-5, 4));
    }

    #[test]
    fn height_bound_is_exposed() {
        let f = Endomorphism::parse(&["x", "y"], &["x^2 + y^2", "x*y"]).unwrap();
        assert!((height_bound(&f).unwrap().log_bound() - 4f64.ln()).abs() < 1e-12);
    }
}
