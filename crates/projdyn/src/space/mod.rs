//! Projective space: points, endomorphisms, text forms.
//!
//! Purpose
//! - `ProjectivePoint` / `FpPoint`: points of Pᴺ over ℚ and 𝔽ₚ with canonical
//!   normal forms, so hashing and equality agree.
//! - `Endomorphism`: a validated morphism over ℚ; `ReducedEndomorphism`: its
//!   reduction at a good prime, which can enumerate its whole domain.
//! - `SelfMap`: what the two have in common (degree, dimension, evaluation,
//!   morphism test, reduction).
//!
//! Why this design
//! - Both map kinds are immutable; reduction returns a new value. Points are
//!   immutable too and `normalize` returns a fresh point.

mod map;
mod parse;
mod point;

pub use map::{Endomorphism, ReducedEndomorphism, SelfMap};
pub use parse::{parse_point, parse_poly, parse_rational};
pub use point::{FpPoint, ProjectivePoint};
