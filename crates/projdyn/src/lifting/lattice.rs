//! Lattice rounding: from a p-adic approximation to a rational point.
//!
//! The integer points congruent (projectively) to the digit vector T mod pᴸ
//! form the lattice spanned by T and pᴸ·eᵢ. A rational point of small height
//! is a short vector there; LLL finds it when the precision is large enough
//! relative to the height bound.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::arith::log_abs;

/// Row echelon form by unimodular integer row operations; zero rows dropped.
/// The result is a basis of the row lattice.
pub fn integer_echelon(mut rows: Vec<Vec<BigInt>>) -> Vec<Vec<BigInt>> {
    let ncols = rows.first().map(Vec::len).unwrap_or(0);
    let mut top = 0;
    for col in 0..ncols {
        loop {
            // Smallest nonzero entry at or below `top` becomes the pivot.
            let Some(piv) = (top..rows.len())
                .filter(|&r| !rows[r][col].is_zero())
                .min_by(|&a, &b| rows[a][col].abs().cmp(&rows[b][col].abs()))
            else {
                break;
            };
            rows.swap(top, piv);
            let mut done = true;
            for r in top + 1..rows.len() {
                if rows[r][col].is_zero() {
                    continue;
                }
                let q = rows[r][col].div_floor(&rows[top][col]);
                let pivot_row = rows[top].clone();
                for (x, y) in rows[r].iter_mut().zip(&pivot_row) {
                    *x -= &q * y;
                }
                if !rows[r][col].is_zero() {
                    done = false;
                }
            }
            if done {
                top += 1;
                break;
            }
        }
        if top == rows.len() {
            break;
        }
    }
    rows.into_iter()
        .filter(|r| r.iter().any(|x| !x.is_zero()))
        .collect()
}

fn dot(a: &[BigRational], b: &[BigRational]) -> BigRational {
    a.iter().zip(b).fold(BigRational::zero(), |acc, (x, y)| acc + x * y)
}

fn to_rational(v: &[BigInt]) -> Vec<BigRational> {
    v.iter().cloned().map(BigRational::from_integer).collect()
}

/// Gram–Schmidt data: μ coefficients and squared norms of the b*ᵢ.
fn gram_schmidt(b: &[Vec<BigInt>]) -> (Vec<Vec<BigRational>>, Vec<BigRational>) {
    let n = b.len();
    let mut star: Vec<Vec<BigRational>> = Vec::with_capacity(n);
    let mut mu = vec![vec![BigRational::zero(); n]; n];
    let mut norms = Vec::with_capacity(n);
    for i in 0..n {
        let bi = to_rational(&b[i]);
        let mut v = bi.clone();
        for j in 0..i {
            let m = if norms[j] == BigRational::zero() {
                BigRational::zero()
            } else {
                dot(&bi, &star[j]) / &norms[j]
            };
            for (x, y) in v.iter_mut().zip(&star[j]) {
                *x -= &m * y;
            }
            mu[i][j] = m;
        }
        norms.push(dot(&v, &v));
        star.push(v);
    }
    (mu, norms)
}

/// Exact LLL reduction with δ = 3/4 of linearly independent rows.
pub fn lll(mut b: Vec<Vec<BigInt>>) -> Vec<Vec<BigInt>> {
    let n = b.len();
    if n < 2 {
        return b;
    }
    let delta = BigRational::new(BigInt::from(3), BigInt::from(4));
    let (mut mu, mut norms) = gram_schmidt(&b);
    let mut k = 1;
    while k < n {
        for j in (0..k).rev() {
            let q = mu[k][j].round().to_integer();
            if q.is_zero() {
                continue;
            }
            let bj = b[j].clone();
            for (x, y) in b[k].iter_mut().zip(&bj) {
                *x -= &q * y;
            }
            let qr = BigRational::from_integer(q);
            for i in 0..j {
                let t = &qr * &mu[j][i];
                mu[k][i] -= t;
            }
            mu[k][j] -= &qr;
        }
        let lovasz = (&delta - &mu[k][k - 1] * &mu[k][k - 1]) * &norms[k - 1];
        if norms[k] >= lovasz {
            k += 1;
        } else {
            b.swap(k, k - 1);
            (mu, norms) = gram_schmidt(&b);
            k = (k - 1).max(1);
        }
    }
    b
}

/// Round the digit vector `digits` (residues mod `modulus`) to an integer
/// point of height at most `log_bound` (natural log of B), up to the gcd of
/// its entries. `None` if the shortest vector is zero or too tall.
pub fn round_to_point(digits: &[BigInt], modulus: &BigInt, log_bound: f64) -> Option<Vec<BigInt>> {
    let dim = digits.len();
    let mut gens = Vec::with_capacity(dim + 1);
    gens.push(digits.iter().map(|d| d.mod_floor(modulus)).collect::<Vec<_>>());
    for i in 0..dim {
        let mut row = vec![BigInt::zero(); dim];
        row[i] = modulus.clone();
        gens.push(row);
    }
    let basis = lll(integer_echelon(gens));
    let v = basis.into_iter().next()?;
    if v.iter().all(Zero::is_zero) {
        return None;
    }
    let g = v.iter().fold(BigInt::zero(), |acc, x| acc.gcd(x));
    let limit = log_bound + if g.is_one() { 0.0 } else { log_abs(&g) };
    if v.iter().filter(|x| !x.is_zero()).any(|x| log_abs(x) > limit) {
        return None;
    }
    Some(v)
}
