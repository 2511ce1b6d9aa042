//! Rational preimages and the backward closure built on them.
//!
//! Purpose
//! - `rational_preimages`: every rational P with f(P) = Q, by lex elimination
//!   in each affine chart.
//! - `all_rational_preimages`: close a set under taking rational preimages;
//!   applied to the periodic points it yields all rational preperiodic points.
//! - `connected_rational_component`: walk images and preimages outward from
//!   one point.
//!
//! Why this design
//! - Charts are solved independently; a chart that cannot be eliminated only
//!   loses its own solutions, which the other charts usually recover.
//! - Closure terminates for degree ≥ 2 (finitely many preperiodic points of
//!   bounded height), but an explicit iteration cap is kept and reported.

mod closure;
mod solver;

pub use closure::{
    all_rational_preimages, connected_rational_component, ClosureCfg, ClosureOutcome,
    DEFAULT_MAX_ITERATIONS,
};
pub use solver::rational_preimages;
