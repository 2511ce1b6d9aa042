//! Rational first preimages by lex elimination, one affine chart at a time.

use std::collections::BTreeSet;

use num_rational::BigRational;
use num_traits::One;
use tracing::{trace, warn};

use crate::arith::{
    groebner_basis, is_zero_dimensional, rational_roots, GroebnerCfg, MonomialOrder, Poly,
    Rationals, Ring,
};
use crate::error::{DynamicsError, Result};
use crate::space::{Endomorphism, ProjectivePoint};

type Assignment = Vec<Option<BigRational>>;

/// fᵢ·Qⱼ − fⱼ·Qᵢ for i < j: vanishes exactly where f(x) ∝ Q or f(x) = 0.
fn preimage_system(polys: &[Poly<BigRational>], q: &ProjectivePoint) -> Vec<Poly<BigRational>> {
    let ring = Rationals;
    let qc = q.coords();
    let mut out = Vec::new();
    for i in 0..polys.len() {
        for j in i + 1..polys.len() {
            let e = polys[i]
                .scale(&ring, &qc[j])
                .sub(&ring, &polys[j].scale(&ring, &qc[i]));
            if !e.is_zero() {
                out.push(e);
            }
        }
    }
    out
}

/// Extend each partial assignment through one basis element.
fn extend(g: &Poly<BigRational>, partial: Vec<Assignment>) -> Result<Vec<Assignment>> {
    let ring = Rationals;
    let mut next = Vec::new();
    for a in partial {
        let h = g.substitute(&ring, &a);
        if h.is_zero() {
            next.push(a);
            continue;
        }
        if h.as_constant().is_some() {
            continue;
        }
        match h.variables().as_slice() {
            [v] => {
                let coeffs = h.as_univariate(&ring, *v).unwrap_or_default();
                for r in rational_roots(&coeffs)? {
                    let mut b = a.clone();
                    b[*v] = Some(r);
                    next.push(b);
                }
            }
            _ => next.push(a),
        }
    }
    Ok(next)
}

/// Solutions with x_`chart` = 1. Fails with `AlgebraSolver` when the chart
/// cannot be eliminated.
fn solve_chart(
    system: &[Poly<BigRational>],
    polys: &[Poly<BigRational>],
    chart: usize,
) -> Result<Vec<ProjectivePoint>> {
    let ring = Rationals;
    let nvars = polys.len();
    let mut fixed: Assignment = vec![None; nvars];
    fixed[chart] = Some(BigRational::one());

    let affine: Vec<Poly<BigRational>> = system
        .iter()
        .map(|e| e.substitute(&ring, &fixed))
        .filter(|e| !e.is_zero())
        .collect();
    let free: Vec<usize> = (0..nvars).filter(|&v| v != chart).collect();
    if affine.is_empty() {
        return Err(DynamicsError::AlgebraSolver {
            reason: format!("chart {chart}: empty system"),
        });
    }
    let basis = groebner_basis(&ring, &affine, GroebnerCfg::lex())?;
    if !is_zero_dimensional(&basis, MonomialOrder::Lex, &free) {
        return Err(DynamicsError::AlgebraSolver {
            reason: format!("chart {chart}: ideal is not zero-dimensional"),
        });
    }

    let mut partial = vec![fixed];
    for g in basis.iter().rev() {
        partial = extend(g, partial)?;
        if partial.is_empty() {
            break;
        }
    }

    let mut out = Vec::new();
    for a in partial {
        let Some(x) = a.into_iter().collect::<Option<Vec<BigRational>>>() else {
            continue;
        };
        if system.iter().any(|e| !ring.is_zero(&e.eval(&ring, &x))) {
            continue;
        }
        if polys.iter().all(|f| ring.is_zero(&f.eval(&ring, &x))) {
            continue;
        }
        out.push(ProjectivePoint::new(x)?.normalize());
    }
    Ok(out)
}

/// All rational points P with f(P) = Q, normalized and sorted.
///
/// A chart that cannot be eliminated is logged and contributes nothing.
pub fn rational_preimages(f: &Endomorphism, q: &ProjectivePoint) -> Result<Vec<ProjectivePoint>> {
    f.check_point(q)?;
    let polys = f.polys_in(&Rationals);
    let system = preimage_system(&polys, q);
    let mut found = BTreeSet::new();
    for chart in 0..polys.len() {
        match solve_chart(&system, &polys, chart) {
            Ok(points) => found.extend(points),
            Err(e @ DynamicsError::AlgebraSolver { .. }) => {
                warn!(%q, chart, error = %e, "skipping chart");
            }
            Err(e) => return Err(e),
        }
    }
    trace!(%q, count = found.len(), "rational preimages");
    Ok(found.into_iter().collect())
}
