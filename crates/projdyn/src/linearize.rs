//! Local linearization: the multiplier of an n-th iterate at a point.
//!
//! Purpose
//! - Chain the Jacobians of the affine charts along P → f(P) → … → fⁿ(P).
//!   Each step dehomogenizes the source at the last unit coordinate of the
//!   current point and the target at the last unit coordinate of its image.
//!
//! Why this design
//! - Ring-generic, so the same code gives exact multipliers over ℚ, the
//!   multiplier mod p that drives the period closure rule, and the Newton
//!   matrix mod pᵏ used while lifting.
//! - Partial derivatives are computed once per map and reused for every call.
//!
//! References
//! - Code cross-refs: `reduction` (closure rule), `lifting::engine` (Hensel step),
//!   `api::multiplier` (exact, with the periodicity check).

use nalgebra::DMatrix;

use crate::arith::linalg::{identity, mat_mul};
use crate::arith::{Poly, Ring};
use crate::error::{DynamicsError, Result};

/// A map together with its formal partial derivatives, over one working ring.
#[derive(Clone, Debug)]
pub struct Linearizer<R: Ring> {
    ring: R,
    polys: Vec<Poly<R::Elem>>,
    // partials[a][b] = ∂F_a / ∂x_b
    partials: Vec<Vec<Poly<R::Elem>>>,
}

impl<R: Ring> Linearizer<R> {
    pub fn new(ring: R, polys: Vec<Poly<R::Elem>>) -> Self {
        let nvars = polys.first().map(|f| f.nvars()).unwrap_or(0);
        let partials = polys
            .iter()
            .map(|f| (0..nvars).map(|b| f.derivative(&ring, b)).collect())
            .collect();
        Self {
            ring,
            polys,
            partials,
        }
    }

    #[inline]
    pub fn ring(&self) -> &R {
        &self.ring
    }

    /// N for maps of Pᴺ.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.polys.len().saturating_sub(1)
    }

    fn last_unit(&self, x: &[R::Elem]) -> Result<usize> {
        x.iter()
            .rposition(|c| self.ring.is_unit(c))
            .ok_or_else(|| DynamicsError::InvalidInput {
                reason: "point has no unit coordinate".into(),
            })
    }

    /// `x` scaled so that its last unit coordinate is 1, with that index.
    pub fn dehomogenize(&self, x: &[R::Elem]) -> Result<(Vec<R::Elem>, usize)> {
        let i = self.last_unit(x)?;
        let inv = self
            .ring
            .inv(&x[i])
            .ok_or_else(|| DynamicsError::InvalidInput {
                reason: "pivot coordinate is not invertible".into(),
            })?;
        Ok((x.iter().map(|c| self.ring.mul(c, &inv)).collect(), i))
    }

    /// Homogeneous image, no normalization.
    pub fn evaluate(&self, x: &[R::Elem]) -> Vec<R::Elem> {
        self.polys.iter().map(|f| f.eval(&self.ring, x)).collect()
    }

    /// n-th iterate, dehomogenized at the last unit coordinate after every step.
    pub fn iterate(&self, x: &[R::Elem], n: usize) -> Result<Vec<R::Elem>> {
        let (mut q, _) = self.dehomogenize(x)?;
        for _ in 0..n {
            q = self.dehomogenize(&self.evaluate(&q))?.0;
        }
        Ok(q)
    }

    /// Jacobian of one step in the charts of `x` and of its image. Returns the
    /// matrix and the normalized image.
    fn step(&self, x: &[R::Elem]) -> Result<(DMatrix<R::Elem>, Vec<R::Elem>)> {
        let ring = &self.ring;
        let (q, i) = self.dehomogenize(x)?;
        let values = self.evaluate(&q);
        let j = self.last_unit(&values)?;
        let fj = values[j].clone();
        let fj_inv = ring.inv(&fj).ok_or_else(|| DynamicsError::InvalidInput {
            reason: "image pivot is not invertible".into(),
        })?;
        let fj_inv2 = ring.mul(&fj_inv, &fj_inv);

        let rows: Vec<usize> = (0..values.len()).filter(|&a| a != j).collect();
        let cols: Vec<usize> = (0..q.len()).filter(|&b| b != i).collect();
        let dfj: Vec<R::Elem> = cols
            .iter()
            .map(|&b| self.partials[j][b].eval(ring, &q))
            .collect();
        let jac = DMatrix::from_fn(rows.len(), cols.len(), |r, c| {
            let (a, b) = (rows[r], cols[c]);
            let dfa = self.partials[a][b].eval(ring, &q);
            // (∂_b F_a · F_j − F_a · ∂_b F_j) / F_j²
            let num = ring.sub(&ring.mul(&dfa, &fj), &ring.mul(&values[a], &dfj[c]));
            ring.mul(&num, &fj_inv2)
        });
        let image = values.iter().map(|v| ring.mul(v, &fj_inv)).collect();
        Ok((jac, image))
    }

    /// Multiplier of fⁿ at `x`: the product Jₙ···J₁ of the per-step Jacobians.
    pub fn multiplier(&self, x: &[R::Elem], n: usize) -> Result<DMatrix<R::Elem>> {
        let mut l = identity(&self.ring, self.dimension());
        let mut q = x.to_vec();
        for _ in 0..n {
            let (jac, image) = self.step(&q)?;
            l = mat_mul(&self.ring, &jac, &l);
            q = image;
        }
        Ok(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::{PrimeField, Rationals, ResidueRing};
    use crate::space::{parse_poly, Endomorphism};
    use num_bigint::BigInt;
    use num_rational::BigRational;

    fn q(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    fn linearizer(vars: &[&str], forms: &[&str]) -> Linearizer<Rationals> {
        let polys = forms.iter().map(|s| parse_poly(s, vars).unwrap()).collect();
        Linearizer::new(Rationals, polys)
    }

    #[test]
    fn diagonal_map_at_fixed_point() {
        // (x^2 : y^2 : 4z^2) fixes (4 : 4 : 1); each chart coordinate doubles.
        let lin = linearizer(&["x", "y", "z"], &["x^2", "y^2", "4*z^2"]);
        let m = lin.multiplier(&[q(4, 1), q(4, 1), q(1, 1)], 1).unwrap();
        assert_eq!(m, DMatrix::from_row_slice(2, 2, &[q(2, 1), q(0, 1), q(0, 1), q(2, 1)]));
    }

    #[test]
    fn one_dimensional_chain_over_four_steps() {
        // Sum over the orbit of (2 : 5) of the chart derivatives.
        let lin = linearizer(&["x", "y"], &["7*x^2 - 28*y^2", "24*x*y"]);
        let m = lin.multiplier(&[q(2, 1), q(5, 1)], 4).unwrap();
        assert_eq!(m[(0, 0)], q(231361, 20736));
    }

    #[test]
    fn multiplier_of_polynomial_cycle_matches_product_of_derivatives() {
        // z^2 - 29/16 has the 3-cycle 5/4 -> -1/4 -> -7/4; multiplier 2^3 * product.
        let f = Endomorphism::parse(&["x", "y"], &["x^2 - 29/16*y^2", "y^2"]).unwrap();
        let lin = Linearizer::new(Rationals, f.polys_in(&Rationals));
        let m = lin.multiplier(&[q(5, 4), q(1, 1)], 3).unwrap();
        assert_eq!(m[(0, 0)], q(8, 1) * q(5, 4) * q(-1, 4) * q(-7, 4));
    }

    #[test]
    fn reductions_agree_with_the_rational_multiplier() {
        let f = Endomorphism::parse(&["x", "y"], &["x^2 - 29/16*y^2", "y^2"]).unwrap();
        let exact = Linearizer::new(Rationals, f.polys_in(&Rationals))
            .multiplier(&[q(5, 4), q(1, 1)], 3)
            .unwrap()[(0, 0)]
            .clone();
        let field = PrimeField::new(7);
        let lin7 = Linearizer::new(field, f.polys_in(&field));
        let x7 = [field.from_rational(&q(5, 4)).unwrap(), 1];
        let m7 = lin7.multiplier(&x7, 3).unwrap();
        assert_eq!(Some(m7[(0, 0)]), field.from_rational(&exact));

        let ring = ResidueRing::new(7, 5);
        let lin = Linearizer::new(ring.clone(), f.polys_in(&ring));
        let x = [ring.from_rational(&q(5, 4)).unwrap(), ring.one()];
        let m = lin.multiplier(&x, 3).unwrap();
        assert_eq!(Some(m[(0, 0)].clone()), ring.from_rational(&exact));
    }

    #[test]
    fn iterate_normalizes_at_last_unit() {
        let lin = linearizer(&["x", "y"], &["x^2 - 29/16*y^2", "y^2"]);
        let out = lin.iterate(&[q(5, 1), q(4, 1)], 2).unwrap();
        assert_eq!(out, vec![q(-7, 4), q(1, 1)]);
        assert!(lin.iterate(&[q(0, 1), q(0, 1)], 1).is_err());
    }
}
