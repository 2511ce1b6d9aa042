//! Coefficient rings used across the pipeline.
//!
//! - `Integers` (ℤ) for exact iteration on normalized integer points.
//! - `Rationals` (ℚ) for elimination, Nullstellensatz certificates, and exact
//!   multipliers.
//! - `PrimeField` (𝔽ₚ, word-sized) for reduction mod p.
//! - `ResidueRing` (ℤ/pᵏ, arbitrary precision) for p-adic lifting.
//!
//! Elements are plain values; the ring is a small context object passed by
//! reference. This keeps `Poly<E>` and `DMatrix<E>` free of modulus bookkeeping.

use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Commutative ring with identity. `inv` returns `None` for non-units.
pub trait Ring: Clone + fmt::Debug + Send + Sync {
    type Elem: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    fn zero(&self) -> Self::Elem;
    fn one(&self) -> Self::Elem;
    fn from_int(&self, n: &BigInt) -> Self::Elem;
    fn add(&self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;
    fn sub(&self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;
    fn mul(&self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;
    fn neg(&self, a: &Self::Elem) -> Self::Elem;
    fn is_zero(&self, a: &Self::Elem) -> bool;
    fn inv(&self, a: &Self::Elem) -> Option<Self::Elem>;

    #[inline]
    fn from_i64(&self, n: i64) -> Self::Elem {
        self.from_int(&BigInt::from(n))
    }

    #[inline]
    fn is_unit(&self, a: &Self::Elem) -> bool {
        self.inv(a).is_some()
    }

    /// Square-and-multiply.
    fn pow(&self, a: &Self::Elem, mut e: u32) -> Self::Elem {
        let mut base = a.clone();
        let mut acc = self.one();
        while e > 0 {
            if e & 1 == 1 {
                acc = self.mul(&acc, &base);
            }
            e >>= 1;
            if e > 0 {
                base = self.mul(&base, &base);
            }
        }
        acc
    }

    /// `a / b` when `b` is a unit.
    #[inline]
    fn div(&self, a: &Self::Elem, b: &Self::Elem) -> Option<Self::Elem> {
        self.inv(b).map(|bi| self.mul(a, &bi))
    }
}

/// ℤ with arbitrary precision.
#[derive(Clone, Copy, Debug, Default)]
pub struct Integers;

impl Ring for Integers {
    type Elem = BigInt;

    fn zero(&self) -> BigInt {
        BigInt::zero()
    }
    fn one(&self) -> BigInt {
        BigInt::one()
    }
    fn from_int(&self, n: &BigInt) -> BigInt {
        n.clone()
    }
    fn add(&self, a: &BigInt, b: &BigInt) -> BigInt {
        a + b
    }
    fn sub(&self, a: &BigInt, b: &BigInt) -> BigInt {
        a - b
    }
    fn mul(&self, a: &BigInt, b: &BigInt) -> BigInt {
        a * b
    }
    fn neg(&self, a: &BigInt) -> BigInt {
        -a
    }
    fn is_zero(&self, a: &BigInt) -> bool {
        a.is_zero()
    }
    fn inv(&self, a: &BigInt) -> Option<BigInt> {
        if a.abs().is_one() {
            Some(a.clone())
        } else {
            None
        }
    }
}

/// ℚ with arbitrary precision.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rationals;

impl Ring for Rationals {
    type Elem = BigRational;

    fn zero(&self) -> BigRational {
        BigRational::zero()
    }
    fn one(&self) -> BigRational {
        BigRational::one()
    }
    fn from_int(&self, n: &BigInt) -> BigRational {
        BigRational::from_integer(n.clone())
    }
    fn add(&self, a: &BigRational, b: &BigRational) -> BigRational {
        a + b
    }
    fn sub(&self, a: &BigRational, b: &BigRational) -> BigRational {
        a - b
    }
    fn mul(&self, a: &BigRational, b: &BigRational) -> BigRational {
        a * b
    }
    fn neg(&self, a: &BigRational) -> BigRational {
        -a
    }
    fn is_zero(&self, a: &BigRational) -> bool {
        a.is_zero()
    }
    fn inv(&self, a: &BigRational) -> Option<BigRational> {
        if a.is_zero() {
            None
        } else {
            Some(a.recip())
        }
    }
}

/// 𝔽ₚ for a word-sized prime `p` (products go through `u128`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrimeField {
    p: u64,
}

impl PrimeField {
    /// Caller guarantees `p` is prime; only `p >= 2` is asserted.
    pub fn new(p: u64) -> Self {
        debug_assert!(p >= 2, "field characteristic must be a prime");
        Self { p }
    }

    #[inline]
    pub fn characteristic(&self) -> u64 {
        self.p
    }

    /// Residue of an arbitrary rational with denominator prime to `p`.
    pub fn from_rational(&self, q: &BigRational) -> Option<u64> {
        let num = self.from_int(q.numer());
        let den = self.from_int(q.denom());
        self.div(&num, &den)
    }
}

impl Ring for PrimeField {
    type Elem = u64;

    fn zero(&self) -> u64 {
        0
    }
    fn one(&self) -> u64 {
        1 % self.p
    }
    fn from_int(&self, n: &BigInt) -> u64 {
        let m = BigInt::from(self.p);
        n.mod_floor(&m).to_u64().unwrap_or(0)
    }
    fn from_i64(&self, n: i64) -> u64 {
        n.rem_euclid(self.p as i64) as u64
    }
    fn add(&self, a: &u64, b: &u64) -> u64 {
        ((*a as u128 + *b as u128) % self.p as u128) as u64
    }
    fn sub(&self, a: &u64, b: &u64) -> u64 {
        ((*a as u128 + self.p as u128 - (*b % self.p) as u128) % self.p as u128) as u64
    }
    fn mul(&self, a: &u64, b: &u64) -> u64 {
        ((*a as u128 * *b as u128) % self.p as u128) as u64
    }
    fn neg(&self, a: &u64) -> u64 {
        (self.p - a % self.p) % self.p
    }
    fn is_zero(&self, a: &u64) -> bool {
        a % self.p == 0
    }
    fn inv(&self, a: &u64) -> Option<u64> {
        let a = a % self.p;
        if a == 0 {
            return None;
        }
        // Fermat: a^(p-2).
        let mut e = self.p - 2;
        let mut base = a;
        let mut acc = 1u64;
        while e > 0 {
            if e & 1 == 1 {
                acc = self.mul(&acc, &base);
            }
            base = self.mul(&base, &base);
            e >>= 1;
        }
        Some(acc)
    }
}

/// ℤ/pᵏ with `p` prime; elements are canonical residues in `[0, pᵏ)`.
///
/// Units are exactly the residues not divisible by `p`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResidueRing {
    p: BigInt,
    k: u32,
    modulus: BigInt,
}

impl ResidueRing {
    pub fn new(p: u64, k: u32) -> Self {
        let p = BigInt::from(p);
        let modulus = num_traits::pow(p.clone(), k as usize);
        Self { p, k, modulus }
    }

    #[inline]
    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    #[inline]
    pub fn prime(&self) -> &BigInt {
        &self.p
    }

    #[inline]
    pub fn exponent(&self) -> u32 {
        self.k
    }

    /// Residue of a rational whose denominator is a `p`-unit.
    pub fn from_rational(&self, q: &BigRational) -> Option<BigInt> {
        let num = self.from_int(q.numer());
        let den = self.from_int(q.denom());
        self.div(&num, &den)
    }

    /// Reduce into `[0, pᵏ)`.
    #[inline]
    pub fn reduce(&self, a: &BigInt) -> BigInt {
        a.mod_floor(&self.modulus)
    }
}

impl Ring for ResidueRing {
    type Elem = BigInt;

    fn zero(&self) -> BigInt {
        BigInt::zero()
    }
    fn one(&self) -> BigInt {
        self.reduce(&BigInt::one())
    }
    fn from_int(&self, n: &BigInt) -> BigInt {
        self.reduce(n)
    }
    fn add(&self, a: &BigInt, b: &BigInt) -> BigInt {
        self.reduce(&(a + b))
    }
    fn sub(&self, a: &BigInt, b: &BigInt) -> BigInt {
        self.reduce(&(a - b))
    }
    fn mul(&self, a: &BigInt, b: &BigInt) -> BigInt {
        self.reduce(&(a * b))
    }
    fn neg(&self, a: &BigInt) -> BigInt {
        self.reduce(&(-a))
    }
    fn is_zero(&self, a: &BigInt) -> bool {
        self.reduce(a).is_zero()
    }
    fn inv(&self, a: &BigInt) -> Option<BigInt> {
        let a = self.reduce(a);
        if a.is_multiple_of(&self.p) {
            return None;
        }
        let eg = a.extended_gcd(&self.modulus);
        if eg.gcd.is_one() {
            Some(self.reduce(&eg.x))
        } else {
            None
        }
    }
}

/// Natural log of `|n|`, robust for integers far beyond `f64` range.
pub fn log_abs(n: &BigInt) -> f64 {
    let a = n.abs();
    if a.is_zero() {
        return f64::NEG_INFINITY;
    }
    let bits = a.bits();
    if bits <= 1000 {
        return a.to_f64().map(f64::ln).unwrap_or(f64::INFINITY);
    }
    let shift = bits - 64;
    let top: BigInt = &a >> shift;
    top.to_f64().map(f64::ln).unwrap_or(0.0) + (shift as f64) * std::f64::consts::LN_2
}
