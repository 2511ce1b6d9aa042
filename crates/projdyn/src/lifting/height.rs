//! Height bound oracle.
//!
//! For a morphism f of degree d ≥ 2 on Pᴺ there is a constant C with
//! |ĥ(P) − h(P)| ≤ C for every rational point; preperiodic points have ĥ = 0,
//! hence height at most C. The constant combines an upper bound from the
//! coefficient size with a lower bound from an explicit Nullstellensatz
//! certificate x_kᴰ = Σ gᵢ fᵢ, D = (N+1)(d−1)+1.
//!
//! References
//! - B. Hutz, "Efficient determination of rational preperiodic points for
//!   endomorphisms of projective space", arXiv:1210.6246.

use nalgebra::DMatrix;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Zero};
use tracing::debug;

use crate::arith::linalg::solve_particular;
use crate::arith::poly::{monomials_of_degree, Monomial};
use crate::arith::{log_abs, Rationals, Ring};
use crate::error::{DynamicsError, Result};
use crate::space::{Endomorphism, SelfMap};

/// Height-difference constant `C` of a map, with `B = e^C`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightBound {
    constant: f64,
    dimension: usize,
}

fn ln_binomial(n: u64, k: u64) -> f64 {
    (0..k).map(|i| ((n - i) as f64).ln() - ((i + 1) as f64).ln()).sum()
}

impl HeightBound {
    pub fn compute(f: &Endomorphism) -> Result<Self> {
        let d = f.degree();
        if d < 2 {
            return Err(DynamicsError::InvalidInput {
                reason: format!("height bound needs degree at least 2, got {d}"),
            });
        }
        let n = f.dimension();
        let nvars = n + 1;
        let big_d = (n as u32 + 1) * (d - 1) + 1;
        let upper = f.global_height() + ln_binomial((n as u64) + d as u64, d as u64);

        // Macaulay system for x_k^D = Σ g_i f_i with deg g_i = D - d.
        let polys = f.polys_in(&Rationals);
        let row_monos = monomials_of_degree(nvars, big_d);
        let g_monos = monomials_of_degree(nvars, big_d - d);
        let cols = nvars * g_monos.len();
        let a = DMatrix::from_fn(row_monos.len(), cols, |r, c| {
            let (i, m) = (c / g_monos.len(), &g_monos[c % g_monos.len()]);
            let target = &row_monos[r];
            if m.iter().zip(target).all(|(x, y)| x <= y) {
                let rest: Monomial = target.iter().zip(m).map(|(y, x)| y - x).collect();
                polys[i].coeff(&rest).cloned().unwrap_or_else(BigRational::zero)
            } else {
                BigRational::zero()
            }
        });

        let mut gcd_res = BigInt::zero();
        let mut max_h = 0.0f64;
        for k in 0..nvars {
            let mut xk = vec![0u32; nvars];
            xk[k] = big_d;
            let rhs: Vec<BigRational> = row_monos
                .iter()
                .map(|m| if *m == xk { BigRational::one() } else { BigRational::zero() })
                .collect();
            let sol = solve_particular(&Rationals, &a, &rhs).ok_or_else(|| {
                DynamicsError::AlgebraSolver {
                    reason: format!("x{k}^{big_d} is not in the ideal of the forms"),
                }
            })?;
            let res = sol
                .iter()
                .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
            let scale = Rationals.from_int(&res);
            let h = sol
                .iter()
                .filter(|c| !c.is_zero())
                .map(|c| log_abs(&(c * &scale).to_integer()))
                .fold(0.0, f64::max);
            gcd_res = gcd_res.gcd(&res);
            max_h = max_h.max(h);
        }
        let lower = (log_abs(&gcd_res)
            - ((nvars as f64).ln()
                + ln_binomial((n as u64) + (big_d - d) as u64, (big_d - d) as u64))
            - max_h)
            .abs();
        let constant = upper.max(lower) / (d - 1) as f64;
        debug!(upper, lower, constant, "height difference bound");
        Ok(Self {
            constant,
            dimension: n,
        })
    }

    /// C, the natural log of the height bound.
    #[inline]
    pub fn log_bound(&self) -> f64 {
        self.constant
    }

    /// B = e^C (may be infinite in `f64` for very tall maps).
    #[inline]
    pub fn bound(&self) -> f64 {
        self.constant.exp()
    }

    /// p-adic precision L needed at prime `p`:
    /// ⌈log_p(2^{N/2+1}·√(N+1)·B²)⌉ + 1.
    pub fn precision_for(&self, p: u64) -> u32 {
        let n = self.dimension as f64;
        let log_target = (n / 2.0 + 1.0) * std::f64::consts::LN_2
            + 0.5 * (n + 1.0).ln()
            + 2.0 * self.constant;
        ((log_target / (p as f64).ln()).ceil() as u32).max(1) + 1
    }
}
