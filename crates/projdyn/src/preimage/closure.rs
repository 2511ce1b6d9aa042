//! Backward closure of a point set under rational preimages.

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, warn};

use super::solver::rational_preimages;
use crate::error::Result;
use crate::space::{Endomorphism, ProjectivePoint};

/// Default cap on preimage computations in one closure.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClosureCfg {
    /// Points whose preimages are computed before giving up.
    pub max_iterations: usize,
}

impl Default for ClosureCfg {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Points found by a closure; `capped` means work was left when the cap hit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClosureOutcome {
    pub points: Vec<ProjectivePoint>,
    pub capped: bool,
}

/// The seeds together with all their iterated rational preimages, sorted.
pub fn all_rational_preimages(
    f: &Endomorphism,
    seeds: &[ProjectivePoint],
    cfg: ClosureCfg,
) -> Result<ClosureOutcome> {
    let mut visited: BTreeSet<ProjectivePoint> = seeds.iter().map(|p| p.normalize()).collect();
    let mut work: VecDeque<ProjectivePoint> = visited.iter().cloned().collect();
    let mut iterations = 0usize;
    let mut capped = false;
    while let Some(q) = work.pop_front() {
        if iterations == cfg.max_iterations {
            capped = true;
            warn!(
                cap = cfg.max_iterations,
                pending = work.len() + 1,
                "preimage closure hit its iteration cap"
            );
            break;
        }
        iterations += 1;
        for r in rational_preimages(f, &q)? {
            if visited.insert(r.clone()) {
                work.push_back(r);
            }
        }
    }
    debug!(iterations, points = visited.len(), capped, "preimage closure");
    Ok(ClosureOutcome {
        points: visited.into_iter().collect(),
        capped,
    })
}

/// Rational points reachable from `p` by images and rational preimages,
/// level by level; `max_level = 0` means no bound (terminates only for
/// preperiodic `p`).
pub fn connected_rational_component(
    f: &Endomorphism,
    p: &ProjectivePoint,
    max_level: usize,
) -> Result<Vec<ProjectivePoint>> {
    f.check_point(p)?;
    let start = p.normalize();
    let mut seen: BTreeSet<ProjectivePoint> = BTreeSet::from([start.clone()]);
    // Discovery order, as callers read the component outward from `p`.
    let mut component = vec![start.clone()];
    let mut frontier = vec![start];
    let mut level = 1;
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for q in &frontier {
            let mut neighbours = vec![f.apply(q)?];
            neighbours.extend(rational_preimages(f, q)?);
            for r in neighbours {
                if seen.insert(r.clone()) {
                    component.push(r.clone());
                    next.push(r);
                }
            }
        }
        if max_level != 0 && level >= max_level {
            break;
        }
        frontier = next;
        level += 1;
    }
    debug!(points = component.len(), levels = level, "connected component");
    Ok(component)
}
