//! Points of projective space over ℚ and over 𝔽ₚ.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::arith::{log_abs, PrimeField, Ring};
use crate::error::{DynamicsError, Result};

/// A point of Pᴺ(ℚ): N+1 rational coordinates up to nonzero scaling.
///
/// Equality is cross-ratio equality, so `(2 : 4)` equals `(1 : 2)`. Hashing and
/// ordering go through [`ProjectivePoint::normalize`], which keeps all three
/// consistent.
#[derive(Clone, Debug)]
pub struct ProjectivePoint {
    coords: Vec<BigRational>,
}

impl ProjectivePoint {
    pub fn new(coords: Vec<BigRational>) -> Result<Self> {
        if coords.is_empty() || coords.iter().all(|c| c.is_zero()) {
            return Err(DynamicsError::InvalidInput {
                reason: "projective point with all coordinates zero".into(),
            });
        }
        Ok(Self { coords })
    }

    pub fn from_integers(coords: &[BigInt]) -> Result<Self> {
        Self::new(coords.iter().cloned().map(BigRational::from_integer).collect())
    }

    pub fn from_i64(coords: &[i64]) -> Result<Self> {
        Self::new(
            coords
                .iter()
                .map(|c| BigRational::from_integer(BigInt::from(*c)))
                .collect(),
        )
    }

    #[inline]
    pub fn coords(&self) -> &[BigRational] {
        &self.coords
    }

    /// N for a point of Pᴺ.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.coords.len() - 1
    }

    /// Index of the last nonzero coordinate.
    pub fn last_nonzero(&self) -> usize {
        self.coords.iter().rposition(|c| !c.is_zero()).unwrap_or(0)
    }

    /// Coprime integer coordinates with the last nonzero one positive.
    pub fn integer_coords(&self) -> Vec<BigInt> {
        let lcm = self
            .coords
            .iter()
            .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
        let ints: Vec<BigInt> = self
            .coords
            .iter()
            .map(|c| (c * BigRational::from_integer(lcm.clone())).to_integer())
            .collect();
        let mut g = ints.iter().fold(BigInt::zero(), |acc, c| acc.gcd(c));
        if ints[self.last_nonzero()].is_negative() {
            g = -g;
        }
        ints.into_iter().map(|c| c / &g).collect()
    }

    /// New point with coprime integer coordinates, last nonzero one positive.
    /// Idempotent.
    pub fn normalize(&self) -> Self {
        Self {
            coords: self
                .integer_coords()
                .into_iter()
                .map(BigRational::from_integer)
                .collect(),
        }
    }

    /// Affine coordinates in the chart of the last nonzero coordinate.
    pub fn dehomogenize(&self) -> Vec<BigRational> {
        let pivot = &self.coords[self.last_nonzero()];
        self.coords.iter().map(|c| c / pivot).collect()
    }

    /// Logarithmic height: log max |xᵢ| over the normalized coordinates.
    pub fn height(&self) -> f64 {
        self.integer_coords()
            .iter()
            .filter(|c| !c.is_zero())
            .map(log_abs)
            .fold(0.0, f64::max)
    }

    /// Reduction mod p of the normalized coordinates; `None` if they all vanish,
    /// which cannot happen for coprime integers, or if `p` is not prime.
    pub fn reduce(&self, p: u64) -> Option<FpPoint> {
        let field = PrimeField::new(p);
        FpPoint::new(
            field,
            self.integer_coords().iter().map(|c| field.from_int(c)).collect(),
        )
    }
}

impl PartialEq for ProjectivePoint {
    fn eq(&self, other: &Self) -> bool {
        if self.coords.len() != other.coords.len() {
            return false;
        }
        let n = self.coords.len();
        (0..n).all(|i| {
            (i + 1..n).all(|j| {
                &self.coords[i] * &other.coords[j] == &self.coords[j] * &other.coords[i]
            })
        })
    }
}

impl Eq for ProjectivePoint {}

impl Hash for ProjectivePoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.integer_coords().hash(state);
    }
}

impl Ord for ProjectivePoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.coords
            .len()
            .cmp(&other.coords.len())
            .then_with(|| self.integer_coords().cmp(&other.integer_coords()))
    }
}

impl PartialOrd for ProjectivePoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ProjectivePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.dehomogenize().iter().map(|c| c.to_string()).collect();
        write!(f, "({})", parts.join(" : "))
    }
}

/// A point of Pᴺ(𝔽ₚ), stored with its last nonzero coordinate equal to 1.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FpPoint {
    p: u64,
    coords: Vec<u64>,
}

impl FpPoint {
    /// Normalizes; `None` for the all-zero vector.
    pub fn new(field: PrimeField, coords: Vec<u64>) -> Option<Self> {
        let pivot = coords.iter().rposition(|c| !field.is_zero(c))?;
        let inv = field.inv(&coords[pivot])?;
        Some(Self {
            p: field.characteristic(),
            coords: coords.iter().map(|c| field.mul(c, &inv)).collect(),
        })
    }

    #[inline]
    pub fn prime(&self) -> u64 {
        self.p
    }

    #[inline]
    pub fn field(&self) -> PrimeField {
        PrimeField::new(self.p)
    }

    #[inline]
    pub fn coords(&self) -> &[u64] {
        &self.coords
    }

    /// Index of the coordinate equal to 1 that all others are scaled against.
    pub fn pivot(&self) -> usize {
        self.coords.iter().rposition(|c| *c != 0).unwrap_or(0)
    }

    /// Canonical integer representatives in `[0, p)`.
    pub fn lift(&self) -> Vec<BigInt> {
        self.coords.iter().map(|c| BigInt::from(*c)).collect()
    }

    /// Every point of Pᴺ(𝔽ₚ), grouped by pivot, in a fixed order.
    pub fn enumerate(field: PrimeField, n: usize) -> Vec<FpPoint> {
        let p = field.characteristic();
        let mut out = Vec::new();
        for pivot in 0..=n {
            let free = pivot as u32;
            let count = p.pow(free);
            for idx in 0..count {
                let mut coords = vec![0u64; n + 1];
                let mut t = idx;
                for c in coords.iter_mut().take(pivot) {
                    *c = t % p;
                    t /= p;
                }
                coords[pivot] = 1;
                out.push(FpPoint {
                    p,
                    coords,
                });
            }
        }
        out
    }
}

impl fmt::Display for FpPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.coords.iter().map(|c| c.to_string()).collect();
        write!(f, "({})", parts.join(" : "))
    }
}
