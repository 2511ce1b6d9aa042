//! Data types for the lifting state machine.
//!
//! Kept small and explicit so `engine` reads as the state transitions only.

use std::fmt;

use num_bigint::BigInt;

use crate::space::ProjectivePoint;

/// p-adic precision of a work item: residues are known mod pᵏ, and `k` never
/// exceeds `cap` (the precision the height bound asks for).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrecisionState {
    pub p: u64,
    pub k: u32,
    pub cap: u32,
}

impl PrecisionState {
    pub fn seeded(p: u64, cap: u32) -> Self {
        Self { p, k: 1, cap }
    }

    /// Precision after a Newton step.
    pub fn doubled(self) -> Self {
        Self {
            k: (2 * self.k).min(self.cap),
            ..self
        }
    }

    /// Precision after fixing one more digit.
    pub fn next_digit(self) -> Self {
        Self {
            k: (self.k + 1).min(self.cap),
            ..self
        }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.k >= self.cap
    }

    pub fn modulus(&self) -> BigInt {
        num_traits::pow(BigInt::from(self.p), self.k as usize)
    }
}

/// One unit of lifting work: a point known mod pᵏ that is periodic mod pᵏ.
///
/// `coords` are canonical residues in `[0, pᵏ)` with `coords[pivot] == 1`; the
/// pivot is the last coordinate that is a unit mod p.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiftTask {
    pub coords: Vec<BigInt>,
    pub pivot: usize,
    pub period: usize,
    pub precision: PrecisionState,
}

/// States a work item passes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiftState {
    Seeded,
    HenselStep,
    BruteForceStep,
    Validated,
    Rejected,
}

/// Why a work item produced no rational point. None of these are errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LiftRejection {
    /// fⁿ(T) ≢ T mod pᵏ before a Newton step.
    NotPeriodicModPk { k: u32 },
    /// No lift to the next digit is periodic.
    NoLift { k: u32 },
    /// Full precision reached but rounding found no point of small height.
    PrecisionExhausted,
    /// The rounded point is not periodic with period dividing the target.
    NotPeriodic,
}

impl fmt::Display for LiftRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiftRejection::NotPeriodicModPk { k } => write!(f, "not periodic mod p^{k}"),
            LiftRejection::NoLift { k } => write!(f, "no periodic lift to p^{}", k + 1),
            LiftRejection::PrecisionExhausted => write!(f, "no rational point within the height bound"),
            LiftRejection::NotPeriodic => write!(f, "rounded point is not periodic"),
        }
    }
}

/// Terminal result of one work item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LiftOutcome {
    /// A rational periodic point and its minimal period.
    Validated { point: ProjectivePoint, period: usize },
    Rejected(LiftRejection),
}

impl LiftOutcome {
    pub fn state(&self) -> LiftState {
        match self {
            LiftOutcome::Validated { .. } => LiftState::Validated,
            LiftOutcome::Rejected(_) => LiftState::Rejected,
        }
    }
}
