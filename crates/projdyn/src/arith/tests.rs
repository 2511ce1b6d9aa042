use super::*;
use crate::arith::linalg::{charpoly, det, identity, inverse, mat_mul, solve_particular};
use crate::arith::univariate::{fp_factor, primitive_integer, rational_reconstruct, root_order};
use nalgebra::DMatrix;
use num_bigint::BigInt;
use num_rational::BigRational;
use proptest::prelude::*;

fn q(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

fn qi(n: i64) -> BigRational {
    q(n, 1)
}

#[test]
fn primes_small_range_and_factorisation() {
    assert_eq!(primes_in(1, 20), vec![2, 3, 5, 7, 11, 13, 17, 19]);
    assert_eq!(next_prime(24), 29);
    assert!(!is_prime(1) && is_prime(2) && !is_prime(91));
    assert_eq!(primes::factor_u64(360), vec![(2, 3), (3, 2), (5, 1)]);
}

#[test]
fn residue_ring_units_are_prime_to_p() {
    let r = ResidueRing::new(5, 3);
    assert_eq!(r.modulus(), &BigInt::from(125));
    let inv = r.inv(&BigInt::from(2)).unwrap();
    assert_eq!(r.mul(&inv, &BigInt::from(2)), BigInt::from(1));
    assert!(r.inv(&BigInt::from(10)).is_none());
    assert_eq!(r.from_rational(&q(1, 3)).unwrap(), BigInt::from(42));
    assert!(r.from_rational(&q(1, 5)).is_none());
}

#[test]
fn prime_field_basics() {
    let f = PrimeField::new(7);
    assert_eq!(f.from_i64(-1), 6);
    assert_eq!(f.inv(&3), Some(5));
    assert_eq!(f.inv(&0), None);
    assert_eq!(f.from_rational(&q(1, 2)), Some(4));
}

#[test]
fn log_abs_matches_ln_for_small_and_large() {
    assert!((log_abs(&BigInt::from(1000)) - 1000f64.ln()).abs() < 1e-12);
    let big = num_traits::pow(BigInt::from(10), 400);
    assert!((log_abs(&big) - 400.0 * 10f64.ln()).abs() < 1e-6);
}

#[test]
fn poly_derivative_eval_and_display() {
    let r = Rationals;
    let x = Poly::var(&r, 2, 0);
    let y = Poly::var(&r, 2, 1);
    // x^2 - 29/16 y^2
    let f = x
        .mul(&r, &x)
        .sub(&r, &y.mul(&r, &y).scale(&r, &q(29, 16)));
    assert_eq!(f.homogeneous_degree(), Some(2));
    assert_eq!(f.eval(&r, &[qi(5), qi(4)]), q(-4, 1));
    let fx = f.derivative(&r, 0);
    assert_eq!(fx, x.scale(&r, &qi(2)));
    assert_eq!(f.display_with(&["x", "y"]), "x^2 - 29/16*y^2");
    let sub = f.substitute(&r, &[None, Some(qi(1))]);
    assert_eq!(sub.as_univariate(&r, 0).unwrap(), vec![q(-29, 16), qi(0), qi(1)]);
}

#[test]
fn linalg_det_inverse_charpoly_over_rationals() {
    let r = Rationals;
    let m = DMatrix::from_row_slice(2, 2, &[qi(2), qi(1), qi(1), qi(2)]);
    assert_eq!(det(&r, &m), Some(qi(3)));
    let inv = inverse(&r, &m).unwrap();
    assert_eq!(mat_mul(&r, &m, &inv), identity(&r, 2));
    assert_eq!(charpoly(&r, &m), vec![qi(3), qi(-4), qi(1)]);

    let m3 = DMatrix::from_row_slice(
        3,
        3,
        &[qi(0), qi(1), qi(0), qi(0), qi(0), qi(1), qi(6), qi(-11), qi(6)],
    );
    // Companion matrix of (x-1)(x-2)(x-3).
    assert_eq!(charpoly(&r, &m3), vec![qi(-6), qi(11), qi(-6), qi(1)]);
    let singular = DMatrix::from_row_slice(2, 2, &[qi(1), qi(2), qi(2), qi(4)]);
    assert!(inverse(&r, &singular).is_none());
    assert_eq!(det(&r, &singular), Some(qi(0)));
}

#[test]
fn linalg_inverse_mod_prime_power_needs_unit_det() {
    let r = ResidueRing::new(3, 4);
    let m = DMatrix::from_row_slice(2, 2, &[BigInt::from(3), BigInt::from(1), BigInt::from(1), BigInt::from(0)]);
    let inv = inverse(&r, &m).unwrap();
    assert_eq!(mat_mul(&r, &m, &inv), identity(&r, 2));
    let bad = DMatrix::from_row_slice(2, 2, &[BigInt::from(3), BigInt::from(0), BigInt::from(0), BigInt::from(1)]);
    assert!(inverse(&r, &bad).is_none());
}

#[test]
fn solve_particular_sets_free_unknowns_to_zero() {
    let r = Rationals;
    let a = DMatrix::from_row_slice(1, 3, &[qi(1), qi(2), qi(3)]);
    let x = solve_particular(&r, &a, &[qi(6)]).unwrap();
    assert_eq!(x, vec![qi(6), qi(0), qi(0)]);
    let inconsistent = DMatrix::from_row_slice(2, 1, &[qi(1), qi(1)]);
    assert!(solve_particular(&r, &inconsistent, &[qi(1), qi(2)]).is_none());
}

#[test]
fn factor_over_fp_and_root_orders() {
    let f5 = PrimeField::new(5);
    // x^2 + 1 = (x - 2)(x - 3) over F_5.
    let mut facs = fp_factor(&f5, &[1, 0, 1]);
    facs.sort();
    assert_eq!(facs, vec![(vec![2, 1], 1), (vec![3, 1], 1)]);
    assert_eq!(root_order(&f5, &[3, 1]), Some(4)); // root 2
    assert_eq!(root_order(&f5, &[4, 1]), Some(1)); // root 1

    let f3 = PrimeField::new(3);
    // x^2 + 1 irreducible over F_3; its roots are primitive 4th roots of unity.
    let facs = fp_factor(&f3, &[1, 0, 1]);
    assert_eq!(facs, vec![(vec![1, 0, 1], 1)]);
    assert_eq!(root_order(&f3, &[1, 0, 1]), Some(4));
    // x (x - 1)^2 over F_3.
    let facs = fp_factor(&f3, &[0, 1, 1, 1]);
    assert_eq!(facs, vec![(vec![0, 1], 1), (vec![2, 1], 2)]);
    assert_eq!(root_order(&f3, &[0, 1]), None);
}

#[test]
fn rational_roots_of_mixed_polynomial() {
    // (2x - 1)(x + 3)(x^2 + 1) x^2 (x + 3)
    let r = Rationals;
    let x = Poly::var(&r, 1, 0);
    let c = |n: i64| Poly::constant(&r, 1, qi(n));
    let p = x
        .scale(&r, &qi(2))
        .sub(&r, &c(1))
        .mul(&r, &x.add(&r, &c(3)))
        .mul(&r, &x.mul(&r, &x).add(&r, &c(1)))
        .mul(&r, &x.mul(&r, &x))
        .mul(&r, &x.add(&r, &c(3)));
    let dense = p.as_univariate(&r, 0).unwrap();
    let roots = rational_roots(&dense).unwrap();
    assert_eq!(roots, vec![qi(-3), qi(0), q(1, 2)]);
}

#[test]
fn rational_roots_none_for_irreducible_quadratic() {
    assert!(rational_roots(&[qi(-2), qi(0), qi(1)]).unwrap().is_empty());
    assert!(rational_roots(&[qi(5)]).unwrap().is_empty());
}

#[test]
fn reconstruct_small_fraction() {
    let m = BigInt::from(7u64.pow(6));
    let a = BigInt::from(3) * num_integer::Integer::extended_gcd(&BigInt::from(5), &m).x;
    let got = rational_reconstruct(&a, &m, &BigInt::from(10), &BigInt::from(10)).unwrap();
    assert_eq!(got, q(3, 5));
    assert_eq!(primitive_integer(&[q(1, 2), q(-3, 4)]), vec![BigInt::from(-2), BigInt::from(3)]);
}

#[test]
fn groebner_lex_is_triangular() {
    let r = Rationals;
    let x = Poly::var(&r, 2, 0);
    let y = Poly::var(&r, 2, 1);
    let one = Poly::one(&r, 2);
    let circle = x.mul(&r, &x).add(&r, &y.mul(&r, &y)).sub(&r, &one);
    let diag = x.sub(&r, &y);
    let gb = groebner_basis(&r, &[circle, diag.clone()], GroebnerCfg::lex()).unwrap();
    let expected_tail = y.mul(&r, &y).sub(&r, &Poly::constant(&r, 2, q(1, 2)));
    assert_eq!(gb, vec![diag, expected_tail]);
    assert!(is_zero_dimensional(&gb, MonomialOrder::Lex, &[0, 1]));
}

#[test]
fn groebner_detects_common_projective_zero() {
    let f = PrimeField::new(5);
    let x = Poly::var(&f, 2, 0);
    let y = Poly::var(&f, 2, 1);
    // x^2 and y^2: only the trivial common zero.
    let gb = groebner_basis(&f, &[x.mul(&f, &x), y.mul(&f, &y)], GroebnerCfg::default()).unwrap();
    assert!(is_zero_dimensional(&gb, MonomialOrder::GrevLex, &[0, 1]));
    // x^2 and xy share the zero (0 : 1).
    let gb = groebner_basis(&f, &[x.mul(&f, &x), x.mul(&f, &y)], GroebnerCfg::default()).unwrap();
    assert!(!is_zero_dimensional(&gb, MonomialOrder::GrevLex, &[0, 1]));
}

#[test]
fn groebner_unit_ideal_collapses_to_one() {
    let r = Rationals;
    let x = Poly::var(&r, 1, 0);
    let one = Poly::one(&r, 1);
    let gb = groebner_basis(&r, &[x.clone(), x.sub(&r, &one)], GroebnerCfg::lex()).unwrap();
    assert_eq!(gb, vec![one]);
}

proptest! {
    #[test]
    fn rational_roots_recover_linear_factors(
        roots in proptest::collection::vec((-9i64..=9, 1i64..=6), 1..4)
    ) {
        let r = Rationals;
        let x = Poly::var(&r, 1, 0);
        let mut p = Poly::one(&r, 1);
        for (n, d) in &roots {
            let lin = x.scale(&r, &qi(*d)).sub(&r, &Poly::constant(&r, 1, qi(*n)));
            p = p.mul(&r, &lin);
        }
        let got = rational_roots(&p.as_univariate(&r, 0).unwrap()).unwrap();
        let mut want: Vec<BigRational> = roots.iter().map(|(n, d)| q(*n, *d)).collect();
        want.sort();
        want.dedup();
        prop_assert_eq!(got, want);
    }
}
