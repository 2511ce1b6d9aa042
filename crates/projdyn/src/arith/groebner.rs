//! Buchberger's algorithm over a field.
//!
//! Purpose
//! - Morphism test: the forms f₀..f_N have no common projective zero iff their
//!   ideal has a basis whose leading monomials contain a pure power of every
//!   variable (grevlex is fastest for this).
//! - Elimination: a reduced lex basis of a zero-dimensional ideal is triangular,
//!   so walking it from last to first solves the system one variable at a time.
//!
//! Pairs are processed smallest-lcm first; pairs with coprime leading monomials
//! are skipped (Buchberger's first criterion). A cap on processed pairs turns
//! runaway computations into an `AlgebraSolver` error.

use super::poly::{
    monomial_div, monomial_divides, monomial_lcm, monomials_coprime, Monomial, MonomialOrder, Poly,
};
use super::ring::Ring;
use crate::error::DynamicsError;

/// Work limits for one basis computation.
#[derive(Clone, Copy, Debug)]
pub struct GroebnerCfg {
    pub order: MonomialOrder,
    /// Maximum number of S-pairs reduced before giving up.
    pub max_pairs: usize,
}

impl Default for GroebnerCfg {
    fn default() -> Self {
        Self {
            order: MonomialOrder::GrevLex,
            max_pairs: 20_000,
        }
    }
}

impl GroebnerCfg {
    pub fn lex() -> Self {
        Self {
            order: MonomialOrder::Lex,
            ..Self::default()
        }
    }
}

fn leading_monomial<E: Clone + PartialEq + std::fmt::Debug>(
    p: &Poly<E>,
    order: MonomialOrder,
) -> Option<Monomial> {
    p.leading(order).map(|(m, _)| m.clone())
}

fn make_monic<R: Ring>(ring: &R, p: &Poly<R::Elem>, order: MonomialOrder) -> Poly<R::Elem> {
    match p.leading(order).and_then(|(_, c)| ring.inv(c)) {
        Some(inv) => p.scale(ring, &inv),
        None => p.clone(),
    }
}

/// Full reduction of `p` modulo `basis` (every term, not just the leading one).
pub fn reduce<R: Ring>(
    ring: &R,
    p: &Poly<R::Elem>,
    basis: &[Poly<R::Elem>],
    order: MonomialOrder,
) -> Poly<R::Elem> {
    let leads: Vec<Option<(Monomial, R::Elem)>> = basis
        .iter()
        .map(|g| g.leading(order).map(|(m, c)| (m.clone(), c.clone())))
        .collect();
    let mut rest = p.clone();
    let mut remainder = Poly::zero(p.nvars());
    while let Some((m, c)) = rest.leading(order).map(|(m, c)| (m.clone(), c.clone())) {
        let divisor = leads.iter().enumerate().find_map(|(i, l)| match l {
            Some((lm, lc)) if monomial_divides(lm, &m) => Some((i, lm, lc)),
            _ => None,
        });
        match divisor.and_then(|(i, lm, lc)| ring.div(&c, lc).map(|q| (i, lm, q))) {
            Some((i, lm, q)) => {
                let shift = monomial_div(&m, lm);
                rest = rest.sub(ring, &basis[i].mul_term(ring, &shift, &q));
            }
            None => {
                let term = Poly::monomial(ring, m, c);
                remainder = remainder.add(ring, &term);
                rest = rest.sub(ring, &term);
            }
        }
    }
    remainder
}

fn s_polynomial<R: Ring>(
    ring: &R,
    f: &Poly<R::Elem>,
    g: &Poly<R::Elem>,
    order: MonomialOrder,
) -> Poly<R::Elem> {
    let (Some((mf, cf)), Some((mg, cg))) = (f.leading(order), g.leading(order)) else {
        return Poly::zero(f.nvars());
    };
    let l = monomial_lcm(mf, mg);
    let (Some(a), Some(b)) = (ring.inv(cf), ring.inv(cg)) else {
        return Poly::zero(f.nvars());
    };
    let lhs = f.mul_term(ring, &monomial_div(&l, mf), &a);
    let rhs = g.mul_term(ring, &monomial_div(&l, mg), &b);
    lhs.sub(ring, &rhs)
}

/// Reduced Gröbner basis, monic, sorted by leading monomial in descending order.
///
/// The zero ideal yields an empty basis; the unit ideal yields `[1]`.
pub fn groebner_basis<R: Ring>(
    ring: &R,
    polys: &[Poly<R::Elem>],
    cfg: GroebnerCfg,
) -> Result<Vec<Poly<R::Elem>>, DynamicsError> {
    let order = cfg.order;
    let mut basis: Vec<Poly<R::Elem>> = polys
        .iter()
        .filter(|p| !p.is_zero())
        .map(|p| make_monic(ring, p, order))
        .collect();
    let mut pairs: Vec<(usize, usize)> = (0..basis.len())
        .flat_map(|j| (0..j).map(move |i| (i, j)))
        .collect();
    let mut processed = 0usize;

    while !pairs.is_empty() {
        // Normal selection strategy: smallest lcm of leading monomials first.
        let pick = pairs
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let la = pair_lcm(&basis, **a, order);
                let lb = pair_lcm(&basis, **b, order);
                order.cmp(&la, &lb)
            })
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let (i, j) = pairs.swap_remove(pick);
        let (Some(li), Some(lj)) = (
            leading_monomial(&basis[i], order),
            leading_monomial(&basis[j], order),
        ) else {
            continue;
        };
        if monomials_coprime(&li, &lj) {
            continue;
        }
        processed += 1;
        if processed > cfg.max_pairs {
            return Err(DynamicsError::AlgebraSolver {
                reason: format!("Gröbner basis exceeded {} S-pairs", cfg.max_pairs),
            });
        }
        let s = s_polynomial(ring, &basis[i], &basis[j], order);
        let r = reduce(ring, &s, &basis, order);
        if r.is_zero() {
            continue;
        }
        let r = make_monic(ring, &r, order);
        if r.as_constant().is_some() {
            return Ok(vec![Poly::one(ring, r.nvars())]);
        }
        let k = basis.len();
        basis.push(r);
        pairs.extend((0..k).map(|i| (i, k)));
    }

    Ok(interreduce(ring, basis, order))
}

fn pair_lcm<E: Clone + PartialEq + std::fmt::Debug>(
    basis: &[Poly<E>],
    (i, j): (usize, usize),
    order: MonomialOrder,
) -> Monomial {
    match (leading_monomial(&basis[i], order), leading_monomial(&basis[j], order)) {
        (Some(a), Some(b)) => monomial_lcm(&a, &b),
        _ => Vec::new(),
    }
}

/// Minimal then reduced basis.
fn interreduce<R: Ring>(
    ring: &R,
    basis: Vec<Poly<R::Elem>>,
    order: MonomialOrder,
) -> Vec<Poly<R::Elem>> {
    if basis.iter().any(|g| g.as_constant().is_some()) {
        let nvars = basis[0].nvars();
        return vec![Poly::one(ring, nvars)];
    }
    let mut minimal: Vec<Poly<R::Elem>> = Vec::new();
    for (idx, g) in basis.iter().enumerate() {
        let Some(lg) = leading_monomial(g, order) else {
            continue;
        };
        let redundant = basis.iter().enumerate().any(|(jdx, h)| {
            if jdx == idx {
                return false;
            }
            let Some(lh) = leading_monomial(h, order) else {
                return false;
            };
            // Equal leading monomials: keep the first occurrence only.
            monomial_divides(&lh, &lg) && (lh != lg || jdx < idx)
        });
        if !redundant {
            minimal.push(g.clone());
        }
    }
    let mut reduced = Vec::with_capacity(minimal.len());
    for idx in 0..minimal.len() {
        let others: Vec<Poly<R::Elem>> = minimal
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != idx)
            .map(|(_, g)| g.clone())
            .collect();
        let r = reduce(ring, &minimal[idx], &others, order);
        reduced.push(make_monic(ring, &r, order));
    }
    reduced.sort_by(|a, b| {
        let la = leading_monomial(a, order).unwrap_or_default();
        let lb = leading_monomial(b, order).unwrap_or_default();
        order.cmp(&lb, &la)
    });
    reduced
}

/// Whether the affine ideal with this basis has finitely many zeros in the
/// listed variables: every one of them must appear as a pure power among the
/// leading monomials. The unit ideal qualifies (no zeros at all).
pub fn is_zero_dimensional<E: Clone + PartialEq + std::fmt::Debug>(
    basis: &[Poly<E>],
    order: MonomialOrder,
    vars: &[usize],
) -> bool {
    let leads: Vec<Monomial> = basis
        .iter()
        .filter_map(|g| leading_monomial(g, order))
        .collect();
    if leads.iter().any(|m| m.iter().all(|e| *e == 0)) {
        return true;
    }
    vars.iter().all(|&v| {
        leads
            .iter()
            .any(|m| m[v] > 0 && m.iter().enumerate().all(|(i, e)| i == v || *e == 0))
    })
}
