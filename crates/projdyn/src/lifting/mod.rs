//! p-adic lifting of periodic points mod p to rational periodic points.
//!
//! Purpose
//! - Start from a cycle point mod p and a candidate period n, refine it to a
//!   p-adic solution of fⁿ(T) = T to the precision the height bound demands,
//!   then round to the rational point of small height it must be if one exists.
//!
//! Why this design
//! - Each seed is an independent state machine (`engine`), so seeds fan out
//!   over rayon. Brute-force branching stays local to the seed's queue.
//! - `types` holds the states and outcomes; rejections are ordinary outcomes,
//!   errors are reserved for broken inputs.
//!
//! References
//! - B. Hutz, "Determination of all rational preperiodic points for morphisms
//!   of PN", Math. Comp. 84 (2015).
//! - A. K. Lenstra, H. W. Lenstra, L. Lovász, "Factoring polynomials with
//!   rational coefficients" (1982).

mod engine;
mod height;
pub mod lattice;
mod types;

pub use engine::{lift_all, Lifter};
pub use height::HeightBound;
pub use types::{LiftOutcome, LiftRejection, LiftState, LiftTask, PrecisionState};

#[cfg(test)]
mod tests;
