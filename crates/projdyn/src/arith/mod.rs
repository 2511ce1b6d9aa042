//! Exact arithmetic the dynamics pipeline runs on.
//!
//! Purpose
//! - Provide the small algebra toolkit the algorithms need: coefficient rings
//!   (ℤ, ℚ, 𝔽ₚ, ℤ/pᵏ), sparse polynomials, Gröbner bases, univariate roots and
//!   factorisation, dense linear algebra, primes.
//!
//! Why this design
//! - One `Ring` trait with value-type elements keeps every algorithm generic
//!   over the working ring: the same multiplier code runs over ℚ for exact
//!   answers, over 𝔽ₚ for the closure rule, and over ℤ/pᵏ during lifting.
//! - Nothing here aims at generality beyond what the pipeline calls.

pub mod groebner;
pub mod linalg;
pub mod poly;
pub mod primes;
pub mod ring;
pub mod univariate;

pub use groebner::{groebner_basis, is_zero_dimensional, GroebnerCfg};
pub use poly::{Monomial, MonomialOrder, Poly};
pub use primes::{is_prime, next_prime, primes_in};
pub use ring::{log_abs, Integers, PrimeField, Rationals, ResidueRing, Ring};
pub use univariate::rational_roots;

#[cfg(test)]
mod tests;
