//! Univariate tools: factorisation over 𝔽ₚ and rational roots over ℚ.
//!
//! Dense coefficient vectors, lowest degree first.
//!
//! - `fp_factor` splits a polynomial over 𝔽ₚ into monic irreducibles by trial
//!   division in increasing degree. Inputs are characteristic polynomials of
//!   N×N multipliers, so degrees stay tiny.
//! - `root_order` is the multiplicative order of a root of an irreducible
//!   factor, computed as the order of `x` in 𝔽ₚ[x]/(g).
//! - `rational_roots` finds the degree-one factors of a ℚ-polynomial: roots mod a
//!   suitable prime, Hensel lifting, and rational reconstruction, each
//!   candidate verified exactly.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::primes::{factor_u64, next_prime};
use super::ring::{PrimeField, Rationals, ResidueRing, Ring};
use crate::error::DynamicsError;

/// Largest prime tried when looking for a square-free reduction.
const ROOT_PRIME_CAP: u64 = 20_000;

// ----- 𝔽ₚ[x] -----

pub fn fp_trim(a: &mut Vec<u64>) {
    while a.last() == Some(&0) {
        a.pop();
    }
}

/// Degree, or `None` for the zero polynomial.
pub fn fp_degree(a: &[u64]) -> Option<usize> {
    a.iter().rposition(|c| *c != 0)
}

pub fn fp_monic(f: &PrimeField, a: &[u64]) -> Vec<u64> {
    let mut out = a.to_vec();
    fp_trim(&mut out);
    if let Some(lc) = out.last().copied() {
        if let Some(inv) = f.inv(&lc) {
            for c in out.iter_mut() {
                *c = f.mul(c, &inv);
            }
        }
    }
    out
}

pub fn fp_mul(f: &PrimeField, a: &[u64], b: &[u64]) -> Vec<u64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0u64; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        if *x == 0 {
            continue;
        }
        for (j, y) in b.iter().enumerate() {
            out[i + j] = f.add(&out[i + j], &f.mul(x, y));
        }
    }
    fp_trim(&mut out);
    out
}

/// Quotient and remainder. Division by zero yields `(0, a)`.
pub fn fp_divrem(f: &PrimeField, a: &[u64], b: &[u64]) -> (Vec<u64>, Vec<u64>) {
    let mut r = a.to_vec();
    fp_trim(&mut r);
    let Some(db) = fp_degree(b) else {
        return (Vec::new(), r);
    };
    let Some(inv_lc) = f.inv(&b[db]) else {
        return (Vec::new(), r);
    };
    let mut q = vec![0u64; r.len().saturating_sub(db).max(1)];
    while let Some(dr) = fp_degree(&r) {
        if dr < db {
            break;
        }
        let c = f.mul(&r[dr], &inv_lc);
        let shift = dr - db;
        q[shift] = c;
        for (j, bj) in b.iter().enumerate().take(db + 1) {
            r[shift + j] = f.sub(&r[shift + j], &f.mul(&c, bj));
        }
        fp_trim(&mut r);
    }
    fp_trim(&mut q);
    (q, r)
}

pub fn fp_gcd(f: &PrimeField, a: &[u64], b: &[u64]) -> Vec<u64> {
    let mut x = fp_monic(f, a);
    let mut y = fp_monic(f, b);
    while !y.is_empty() {
        let (_, r) = fp_divrem(f, &x, &y);
        x = y;
        y = fp_monic(f, &r);
    }
    x
}

pub fn fp_derivative(f: &PrimeField, a: &[u64]) -> Vec<u64> {
    let mut out: Vec<u64> = a
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, c)| f.mul(c, &f.from_i64(i as i64)))
        .collect();
    fp_trim(&mut out);
    out
}

pub fn fp_eval(f: &PrimeField, a: &[u64], x: u64) -> u64 {
    a.iter().rev().fold(0u64, |acc, c| f.add(&f.mul(&acc, &x), c))
}

fn fp_powmod(f: &PrimeField, base: &[u64], mut e: u64, m: &[u64]) -> Vec<u64> {
    let mut acc = vec![f.one()];
    let (_, mut b) = fp_divrem(f, base, m);
    while e > 0 {
        if e & 1 == 1 {
            acc = fp_divrem(f, &fp_mul(f, &acc, &b), m).1;
        }
        e >>= 1;
        if e > 0 {
            b = fp_divrem(f, &fp_mul(f, &b, &b), m).1;
        }
    }
    acc
}

/// Monic irreducible factors with multiplicities.
pub fn fp_factor(f: &PrimeField, poly: &[u64]) -> Vec<(Vec<u64>, u32)> {
    let mut rem = fp_monic(f, poly);
    let mut out = Vec::new();
    let p = f.characteristic();
    let mut d = 1usize;
    while fp_degree(&rem).is_some_and(|dr| dr >= 2 * d) {
        // Enumerate monic candidates of degree d: coefficients c_0..c_{d-1}.
        let count = p.checked_pow(d as u32).unwrap_or(u64::MAX);
        for idx in 0..count {
            let mut g = Vec::with_capacity(d + 1);
            let mut t = idx;
            for _ in 0..d {
                g.push(t % p);
                t /= p;
            }
            g.push(1);
            let mut mult = 0u32;
            loop {
                let (q, r) = fp_divrem(f, &rem, &g);
                if !r.is_empty() {
                    break;
                }
                rem = q;
                mult += 1;
            }
            if mult > 0 {
                out.push((g, mult));
            }
            if fp_degree(&rem).map_or(true, |dr| dr < 2 * d) {
                break;
            }
        }
        d += 1;
    }
    if fp_degree(&rem).is_some_and(|dr| dr >= 1) {
        out.push((rem, 1));
    }
    out
}

/// Multiplicative order of a root of the irreducible `g` in 𝔽_{p^deg g}.
///
/// `None` when the root is zero (`g = x`).
pub fn root_order(f: &PrimeField, g: &[u64]) -> Option<u64> {
    let g = fp_monic(f, g);
    let e = fp_degree(&g)?;
    if e == 0 || (e == 1 && g[0] == 0) {
        return None;
    }
    let group = f.characteristic().checked_pow(e as u32)? - 1;
    let x = vec![0u64, 1u64];
    let mut order = group;
    for (r, _) in factor_u64(group) {
        while order % r == 0 && fp_powmod(f, &x, order / r, &g) == vec![f.one()] {
            order /= r;
        }
    }
    Some(order)
}

// ----- ℚ[x] -----

fn q_trim(a: &mut Vec<BigRational>) {
    while a.last().is_some_and(|c| c.is_zero()) {
        a.pop();
    }
}

fn q_divrem(a: &[BigRational], b: &[BigRational]) -> (Vec<BigRational>, Vec<BigRational>) {
    let mut r = a.to_vec();
    q_trim(&mut r);
    let db = b.len() - 1;
    let lc = b[db].clone();
    let mut q = vec![BigRational::zero(); r.len().saturating_sub(db).max(1)];
    while r.len() > db {
        let dr = r.len() - 1;
        let c = &r[dr] / &lc;
        let shift = dr - db;
        for (j, bj) in b.iter().enumerate() {
            r[shift + j] = &r[shift + j] - &c * bj;
        }
        q[shift] = c;
        q_trim(&mut r);
    }
    q_trim(&mut q);
    (q, r)
}

fn q_monic(a: &[BigRational]) -> Vec<BigRational> {
    let mut out = a.to_vec();
    q_trim(&mut out);
    if let Some(lc) = out.last().cloned() {
        for c in out.iter_mut() {
            *c = &*c / &lc;
        }
    }
    out
}

fn q_gcd(a: &[BigRational], b: &[BigRational]) -> Vec<BigRational> {
    let mut x = q_monic(a);
    let mut y = q_monic(b);
    while !y.is_empty() {
        let (_, r) = q_divrem(&x, &y);
        x = y;
        y = q_monic(&r);
    }
    x
}

/// Scale to coprime integer coefficients with positive leading coefficient.
pub fn primitive_integer(poly: &[BigRational]) -> Vec<BigInt> {
    let mut a = poly.to_vec();
    q_trim(&mut a);
    let lcm = a
        .iter()
        .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
    let ints: Vec<BigInt> = a
        .iter()
        .map(|c| (c * BigRational::from_integer(lcm.clone())).to_integer())
        .collect();
    let content = ints.iter().fold(BigInt::zero(), |acc, c| acc.gcd(c));
    if content.is_zero() {
        return Vec::new();
    }
    let sign = if ints.last().is_some_and(|c| c.is_negative()) {
        -BigInt::one()
    } else {
        BigInt::one()
    };
    ints.into_iter().map(|c| c / &content * &sign).collect()
}

/// Wang's rational reconstruction: `u/v ≡ a (mod m)` with `|u| <= nb`, `0 < v <= db`.
pub fn rational_reconstruct(
    a: &BigInt,
    m: &BigInt,
    nb: &BigInt,
    db: &BigInt,
) -> Option<BigRational> {
    let (mut r0, mut r1) = (m.clone(), a.mod_floor(m));
    let (mut t0, mut t1) = (BigInt::zero(), BigInt::one());
    while &r1 > nb {
        let q = &r0 / &r1;
        let r2 = &r0 - &q * &r1;
        r0 = std::mem::replace(&mut r1, r2);
        let t2 = &t0 - &q * &t1;
        t0 = std::mem::replace(&mut t1, t2);
    }
    if t1.is_zero() || &t1.abs() > db || !r1.gcd(&t1).is_one() {
        return None;
    }
    Some(BigRational::new(r1, t1))
}

/// All rational roots (without multiplicity), sorted ascending.
pub fn rational_roots(poly: &[BigRational]) -> Result<Vec<BigRational>, DynamicsError> {
    let mut a = poly.to_vec();
    q_trim(&mut a);
    if a.len() <= 1 {
        return Ok(Vec::new());
    }
    let mut roots = Vec::new();
    // Strip the x^m factor.
    let zeros = a.iter().position(|c| !c.is_zero()).unwrap_or(0);
    if zeros > 0 {
        roots.push(BigRational::zero());
        a.drain(..zeros);
    }
    if a.len() == 2 {
        roots.push(-&a[0] / &a[1]);
    } else if a.len() > 2 {
        let deriv: Vec<BigRational> = a
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, c)| c * BigRational::from_integer(BigInt::from(i)))
            .collect();
        let g = q_gcd(&a, &deriv);
        let sqfree = if g.len() > 1 { q_divrem(&a, &g).0 } else { a.clone() };
        roots.extend(roots_of_squarefree(&primitive_integer(&sqfree))?);
    }
    roots.sort();
    roots.dedup();
    Ok(roots)
}

fn roots_of_squarefree(h: &[BigInt]) -> Result<Vec<BigRational>, DynamicsError> {
    if h.len() <= 1 {
        return Ok(Vec::new());
    }
    if h.len() == 2 {
        return Ok(vec![BigRational::new(-h[0].clone(), h[1].clone())]);
    }
    let lead = h[h.len() - 1].abs();
    let constant = h[0].abs();
    let mut p = 3u64;
    let field = loop {
        if p > ROOT_PRIME_CAP {
            return Err(DynamicsError::AlgebraSolver {
                reason: "no square-free reduction found for root finding".into(),
            });
        }
        if !lead.is_multiple_of(&BigInt::from(p)) {
            let f = PrimeField::new(p);
            let hp: Vec<u64> = h.iter().map(|c| f.from_int(c)).collect();
            let g = fp_gcd(&f, &hp, &fp_derivative(&f, &hp));
            if fp_degree(&g) == Some(0) {
                break f;
            }
        }
        p = next_prime(p + 1);
    };
    let p = field.characteristic();
    let hp: Vec<u64> = h.iter().map(|c| field.from_int(c)).collect();
    let target = BigInt::from(2) * &lead * &constant;
    let mut k = 1u32;
    while num_traits::pow(BigInt::from(p), k as usize) <= target {
        k *= 2;
    }
    let ring = ResidueRing::new(p, k);
    let h_mod: Vec<BigInt> = h.iter().map(|c| ring.from_int(c)).collect();
    let dh_mod: Vec<BigInt> = h_mod
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, c)| ring.mul(c, &ring.from_i64(i as i64)))
        .collect();
    let eval = |coeffs: &[BigInt], x: &BigInt| {
        coeffs
            .iter()
            .rev()
            .fold(ring.zero(), |acc, c| ring.add(&ring.mul(&acc, x), c))
    };
    let mut out = Vec::new();
    for r0 in (0..p).filter(|&r| fp_eval(&field, &hp, r) == 0) {
        // Newton iteration in ℤ/p^k; quadratic convergence from a simple root.
        let mut r = BigInt::from(r0);
        let mut prec = 1u32;
        while prec < k {
            let Some(step) = ring.div(&eval(&h_mod, &r), &eval(&dh_mod, &r)) else {
                break;
            };
            r = ring.sub(&r, &step);
            prec *= 2;
        }
        if let Some(q) = rational_reconstruct(&r, ring.modulus(), &constant, &lead) {
            let qr = Rationals;
            let coeffs: Vec<BigRational> = h.iter().map(|c| qr.from_int(c)).collect();
            let value = coeffs
                .iter()
                .rev()
                .fold(BigRational::zero(), |acc, c| acc * &q + c);
            if value.is_zero() {
                out.push(q);
            }
        }
    }
    Ok(out)
}
