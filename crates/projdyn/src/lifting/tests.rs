use super::lattice::round_to_point;
use super::*;
use std::collections::BTreeSet;
use crate::arith::{PrimeField, ResidueRing};
use crate::error::DynamicsError;
use crate::space::{Endomorphism, FpPoint, ProjectivePoint};
use num_bigint::BigInt;
use num_rational::BigRational;
use proptest::prelude::*;

fn three_cycle_map() -> Endomorphism {
    Endomorphism::parse(&["x", "y"], &["16*x^2 - 29*y^2", "16*y^2"]).unwrap()
}

/// (-5x^2 + 4y^2 : 4xy): fixed points ∞ and ±2/3, a 2-cycle {2, -2}. Mod 3
/// the Newton matrix at ∞ is singular, so lifting has to branch on digits.
fn branching_map() -> Endomorphism {
    Endomorphism::parse(&["x", "y"], &["-5*x^2 + 4*y^2", "4*x*y"]).unwrap()
}

fn seed(p: u64, coords: Vec<u64>) -> FpPoint {
    FpPoint::new(PrimeField::new(p), coords).unwrap()
}

#[test]
fn height_bound_of_x2_plus_y2() {
    let f = Endomorphism::parse(&["x", "y"], &["x^2 + y^2", "x*y"]).unwrap();
    let b = HeightBound::compute(&f).unwrap();
    assert!((b.log_bound() - 4f64.ln()).abs() < 1e-12);
    assert!((b.bound() - 4.0).abs() < 1e-9);
    assert_eq!(b.precision_for(23), 3);
}

#[test]
fn height_bound_grows_with_coefficients() {
    let b = HeightBound::compute(&three_cycle_map()).unwrap();
    // ln 29 + ln 3 dominates the certificate term.
    assert!((b.log_bound() - (29f64.ln() + 3f64.ln())).abs() < 1e-12);
    assert_eq!(b.precision_for(23), 5);
}

#[test]
fn height_bound_needs_degree_two() {
    let f = Endomorphism::parse(&["x", "y"], &["x", "y"]).unwrap();
    assert!(matches!(
        HeightBound::compute(&f),
        Err(DynamicsError::InvalidInput { .. })
    ));
}

#[test]
fn precision_is_monotone_in_the_bound() {
    let small = HeightBound::compute(
        &Endomorphism::parse(&["x", "y"], &["x^2 + y^2", "x*y"]).unwrap(),
    )
    .unwrap();
    let big = HeightBound::compute(&three_cycle_map()).unwrap();
    for p in [2, 3, 5, 23, 101] {
        assert!(small.precision_for(p) <= big.precision_for(p));
    }
}

#[test]
fn lifts_the_three_cycle_from_23() {
    let f = three_cycle_map();
    let bound = HeightBound::compute(&f).unwrap();
    let lifter = Lifter::new(&f, 23, &bound);
    // 5/4 ≡ 7 (mod 23)
    let out = lifter.lift_seed(&seed(23, vec![7, 1]), 3).unwrap();
    let expected = ProjectivePoint::from_i64(&[5, 4]).unwrap();
    assert_eq!(
        out,
        vec![LiftOutcome::Validated {
            point: expected,
            period: 3
        }]
    );
    assert_eq!(out[0].state(), LiftState::Validated);
}

#[test]
fn extra_precision_finds_the_same_point() {
    let f = three_cycle_map();
    let bound = HeightBound::compute(&f).unwrap();
    let base = Lifter::new(&f, 23, &bound);
    let deeper = base.clone().with_precision(base.precision() + 3);
    let s = seed(23, vec![7, 1]);
    assert_eq!(base.lift_seed(&s, 3).unwrap(), deeper.lift_seed(&s, 3).unwrap());
}

#[test]
fn wrong_period_is_rejected_mod_p() {
    let f = three_cycle_map();
    let bound = HeightBound::compute(&f).unwrap();
    let lifter = Lifter::new(&f, 23, &bound);
    let out = lifter.lift_seed(&seed(23, vec![7, 1]), 1).unwrap();
    assert_eq!(
        out,
        vec![LiftOutcome::Rejected(LiftRejection::NotPeriodicModPk { k: 1 })]
    );
    assert_eq!(out[0].state(), LiftState::Rejected);
}

#[test]
fn lift_all_collects_validated_points() {
    let f = three_cycle_map();
    let bound = HeightBound::compute(&f).unwrap();
    let lifter = Lifter::new(&f, 23, &bound);
    let seeds = vec![(seed(23, vec![7, 1]), 3), (seed(23, vec![7, 1]), 1)];
    let found = lift_all(&lifter, &seeds, 2).unwrap();
    assert_eq!(found, vec![(ProjectivePoint::from_i64(&[5, 4]).unwrap(), 3)]);
}

#[test]
fn singular_newton_matrix_branches_on_digits() {
    let f = branching_map();
    let bound = HeightBound::compute(&f).unwrap();
    let lifter = Lifter::new(&f, 3, &bound);
    let out = lifter.lift_seed(&seed(3, vec![1, 0]), 1).unwrap();

    let validated: BTreeSet<ProjectivePoint> = out
        .iter()
        .filter_map(|o| match o {
            LiftOutcome::Validated { point, period } => {
                assert_eq!(*period, 1);
                Some(point.clone())
            }
            LiftOutcome::Rejected(_) => None,
        })
        .collect();
    let expected: BTreeSet<ProjectivePoint> = [[1i64, 0], [2, 3], [-2, 3]]
        .iter()
        .map(|c| ProjectivePoint::from_i64(c).unwrap())
        .collect();
    assert_eq!(validated, expected);
    // Some digit branches die out before reaching full precision.
    assert!(out
        .iter()
        .any(|o| matches!(o, LiftOutcome::Rejected(LiftRejection::NoLift { .. }))));
}

#[test]
fn lift_all_merges_converging_branches() {
    let f = branching_map();
    let bound = HeightBound::compute(&f).unwrap();
    let lifter = Lifter::new(&f, 3, &bound);
    let s = seed(3, vec![1, 0]);
    let raw = lifter
        .lift_seed(&s, 1)
        .unwrap()
        .into_iter()
        .filter(|o| o.state() == LiftState::Validated)
        .count();
    let found = lift_all(&lifter, &[(s.clone(), 1), (s, 1)], 2).unwrap();
    assert!(raw > found.len());
    assert_eq!(found.len(), 3);
    let mut sorted = found.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted, found);
}

#[test]
fn lattice_rounds_to_small_rational() {
    let ring = ResidueRing::new(23, 5);
    let q = BigRational::new(BigInt::from(5), BigInt::from(4));
    let d = ring.from_rational(&q).unwrap();
    let digits = vec![d, BigInt::from(1)];
    let v = round_to_point(&digits, ring.modulus(), 29f64.ln()).unwrap();
    assert_eq!(
        ProjectivePoint::from_integers(&v).unwrap(),
        ProjectivePoint::from_i64(&[5, 4]).unwrap()
    );
    // ln 5 exceeds the bound.
    assert_eq!(round_to_point(&digits, ring.modulus(), 0.5), None);
}

#[test]
fn precision_state_transitions() {
    let s = PrecisionState::seeded(23, 5);
    assert_eq!(s.k, 1);
    let s = s.doubled().doubled();
    assert_eq!(s.k, 4);
    assert_eq!(s.doubled().k, 5);
    assert!(s.doubled().is_complete());
    assert_eq!(s.next_digit().k, 5);
    assert_eq!(PrecisionState::seeded(3, 5).modulus(), BigInt::from(3));
}

proptest! {
    #[test]
    fn lattice_recovers_any_small_point(a in -50i64..=50, b in 1i64..=50) {
        prop_assume!(b % 23 != 0);
        prop_assume!(num_integer::gcd(a, b) == 1);
        let ring = ResidueRing::new(23, 8);
        let q = BigRational::new(BigInt::from(a), BigInt::from(b));
        let digits = vec![ring.from_rational(&q).unwrap(), BigInt::from(1)];
        let v = round_to_point(&digits, ring.modulus(), 50f64.ln() + 1e-9).unwrap();
        prop_assert_eq!(
            ProjectivePoint::from_integers(&v).unwrap(),
            ProjectivePoint::from_i64(&[a, b]).unwrap()
        );
    }
}
