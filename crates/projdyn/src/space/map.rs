//! Endomorphisms of Pᴺ over ℚ and their reductions mod p.

use std::collections::HashMap;
use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Zero};
use tracing::debug;

use super::parse::parse_poly;
use super::point::{FpPoint, ProjectivePoint};
use crate::arith::{
    groebner_basis, is_zero_dimensional, log_abs, GroebnerCfg, Integers, MonomialOrder, Poly,
    PrimeField, Ring,
};
use crate::error::{DynamicsError, Result};
use crate::graph::CycleGraph;

/// The interface shared by maps over ℚ and over 𝔽ₚ.
pub trait SelfMap {
    type Coeffs: Ring;

    fn coeff_ring(&self) -> &Self::Coeffs;
    fn polys(&self) -> &[Poly<<Self::Coeffs as Ring>::Elem>];
    fn degree(&self) -> u32;

    /// N for a map of Pᴺ.
    fn dimension(&self) -> usize {
        self.polys().len() - 1
    }

    /// Affine evaluation of the defining polynomials (no normalization).
    fn evaluate(
        &self,
        x: &[<Self::Coeffs as Ring>::Elem],
    ) -> Vec<<Self::Coeffs as Ring>::Elem> {
        let ring = self.coeff_ring();
        self.polys().iter().map(|f| f.eval(ring, x)).collect()
    }

    /// No common zero of the forms over the algebraic closure.
    fn is_morphism(&self) -> bool;

    fn reduce(&self, p: u64) -> Result<ReducedEndomorphism>;
}

/// Morphism test shared by both map kinds: the forms generate an ideal whose
/// only zero is the origin.
fn forms_define_morphism<R: Ring>(ring: &R, polys: &[Poly<R::Elem>]) -> Result<bool> {
    if polys.iter().any(|f| f.is_zero()) {
        return Ok(false);
    }
    let basis = groebner_basis(ring, polys, GroebnerCfg::default())?;
    let vars: Vec<usize> = (0..polys[0].nvars()).collect();
    Ok(is_zero_dimensional(&basis, MonomialOrder::GrevLex, &vars))
}

fn default_names(n: usize) -> Vec<String> {
    if n == 2 {
        return vec!["x".into(), "y".into()];
    }
    if n == 3 {
        return vec!["x".into(), "y".into(), "z".into()];
    }
    (0..n).map(|i| format!("x{i}")).collect()
}

/// An endomorphism f : Pᴺ → Pᴺ over ℚ.
///
/// Stored with integer coefficients whose overall content is 1; scaling all
/// forms by a common rational does not change the map.
#[derive(Clone, Debug)]
pub struct Endomorphism {
    polys: Vec<Poly<BigInt>>,
    degree: u32,
    names: Vec<String>,
}

impl Endomorphism {
    /// Build and validate: N+1 forms in N+1 variables, homogeneous of one
    /// common degree, with no common projective zero.
    pub fn new(polys: Vec<Poly<BigRational>>) -> Result<Self> {
        let nvars = polys.first().map(|f| f.nvars()).unwrap_or(0);
        if polys.len() < 2 {
            return Err(DynamicsError::NonEndomorphism {
                reason: "need at least two forms".into(),
            });
        }
        if polys.iter().any(|f| f.nvars() != nvars) || nvars != polys.len() {
            return Err(DynamicsError::NonEndomorphism {
                reason: format!(
                    "{} forms in {} variables: domain and codomain differ",
                    polys.len(),
                    nvars
                ),
            });
        }
        let mut degree = None;
        for (i, f) in polys.iter().enumerate() {
            let Some(d) = f.homogeneous_degree() else {
                return Err(DynamicsError::NonEndomorphism {
                    reason: format!("form {i} is zero or not homogeneous"),
                });
            };
            match degree {
                None => degree = Some(d),
                Some(d0) if d0 != d => {
                    return Err(DynamicsError::NonEndomorphism {
                        reason: format!("form {i} has degree {d}, expected {d0}"),
                    })
                }
                _ => {}
            }
        }
        let degree = degree.unwrap_or(0);

        // Clear denominators, then divide out the common content.
        let lcm = polys
            .iter()
            .flat_map(|f| f.terms().map(|(_, c)| c.denom().clone()))
            .fold(BigInt::one(), |acc, d| acc.lcm(&d));
        let scale = BigRational::from_integer(lcm);
        let ints: Vec<Poly<BigInt>> = polys
            .iter()
            .map(|f| f.convert(&Integers, |c| (c * &scale).to_integer()))
            .collect();
        let content = ints
            .iter()
            .flat_map(|f| f.terms().map(|(_, c)| c.clone()).collect::<Vec<_>>())
            .fold(BigInt::zero(), |acc, c| acc.gcd(&c));
        let ints = ints
            .into_iter()
            .map(|f| f.convert(&Integers, |c| c / &content))
            .collect();

        let map = Self {
            polys: ints,
            degree,
            names: default_names(nvars),
        };
        if !forms_define_morphism(&crate::arith::Rationals, &map.polys_in(&crate::arith::Rationals))? {
            return Err(DynamicsError::NonEndomorphism {
                reason: "the forms have a common zero".into(),
            });
        }
        debug!(n = map.dimension(), d = degree, "endomorphism");
        Ok(map)
    }

    /// Parse one form per coordinate, e.g. `vars = ["x", "y"]`,
    /// `forms = ["x^2 - 29/16*y^2", "y^2"]`.
    pub fn parse(vars: &[&str], forms: &[&str]) -> Result<Self> {
        let polys = forms
            .iter()
            .map(|s| parse_poly(s, vars))
            .collect::<Result<Vec<_>>>()?;
        let mut map = Self::new(polys)?;
        map.names = vars.iter().map(|s| s.to_string()).collect();
        Ok(map)
    }

    pub fn names(&self) -> Vec<&str> {
        self.names.iter().map(String::as_str).collect()
    }

    /// The forms with coefficients mapped into another ring (ℚ, 𝔽ₚ, ℤ/pᵏ).
    pub fn polys_in<R: Ring>(&self, ring: &R) -> Vec<Poly<R::Elem>> {
        self.polys
            .iter()
            .map(|f| f.convert(ring, |c| ring.from_int(c)))
            .collect()
    }

    /// Image of a point, normalized.
    pub fn apply(&self, p: &ProjectivePoint) -> Result<ProjectivePoint> {
        self.check_point(p)?;
        let image = self.evaluate(&p.integer_coords());
        Ok(ProjectivePoint::from_integers(&image)?.normalize())
    }

    pub fn nth_iterate(&self, p: &ProjectivePoint, n: usize) -> Result<ProjectivePoint> {
        let mut q = p.normalize();
        for _ in 0..n {
            q = self.apply(&q)?;
        }
        Ok(q)
    }

    /// `[P, f(P), …, fⁿ(P)]`.
    pub fn orbit(&self, p: &ProjectivePoint, n: usize) -> Result<Vec<ProjectivePoint>> {
        let mut out = Vec::with_capacity(n + 1);
        let mut q = p.normalize();
        out.push(q.clone());
        for _ in 0..n {
            q = self.apply(&q)?;
            out.push(q.clone());
        }
        Ok(out)
    }

    /// Logarithmic height of the map: log of the largest coefficient in
    /// absolute value, coefficients being coprime integers.
    pub fn global_height(&self) -> f64 {
        self.polys
            .iter()
            .flat_map(|f| f.terms().map(|(_, c)| log_abs(c)).collect::<Vec<_>>())
            .fold(0.0, f64::max)
    }

    pub fn check_point(&self, p: &ProjectivePoint) -> Result<()> {
        if p.dimension() != self.dimension() {
            return Err(DynamicsError::InvalidInput {
                reason: format!(
                    "point {p} lives in P^{} but the map acts on P^{}",
                    p.dimension(),
                    self.dimension()
                ),
            });
        }
        Ok(())
    }
}

impl SelfMap for Endomorphism {
    type Coeffs = Integers;

    fn coeff_ring(&self) -> &Integers {
        &Integers
    }

    fn polys(&self) -> &[Poly<BigInt>] {
        &self.polys
    }

    fn degree(&self) -> u32 {
        self.degree
    }

    fn is_morphism(&self) -> bool {
        // Validated at construction.
        true
    }

    /// Fails with `BadPrime` when the reduction is degenerate.
    fn reduce(&self, p: u64) -> Result<ReducedEndomorphism> {
        let field = PrimeField::new(p);
        let polys = self.polys_in(&field);
        let reduced = ReducedEndomorphism {
            field,
            polys,
            degree: self.degree,
            names: self.names.clone(),
        };
        if !reduced.is_morphism() {
            return Err(DynamicsError::BadPrime { prime: p });
        }
        Ok(reduced)
    }
}

impl fmt::Display for Endomorphism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names();
        let forms: Vec<String> = self.polys.iter().map(|g| g.display_with(&names)).collect();
        write!(f, "({})", forms.join(" : "))
    }
}

/// An endomorphism of Pᴺ over 𝔽ₚ with good reduction.
#[derive(Clone, Debug)]
pub struct ReducedEndomorphism {
    field: PrimeField,
    polys: Vec<Poly<u64>>,
    degree: u32,
    names: Vec<String>,
}

impl ReducedEndomorphism {
    #[inline]
    pub fn prime(&self) -> u64 {
        self.field.characteristic()
    }

    #[inline]
    pub fn field(&self) -> PrimeField {
        self.field
    }

    /// Image of a point. A morphism never sends a point to zero.
    pub fn apply(&self, x: &FpPoint) -> Result<FpPoint> {
        FpPoint::new(self.field, self.evaluate(x.coords())).ok_or(DynamicsError::BadPrime {
            prime: self.prime(),
        })
    }

    /// All of Pᴺ(𝔽ₚ).
    pub fn points(&self) -> Vec<FpPoint> {
        FpPoint::enumerate(self.field, self.dimension())
    }

    /// `(preperiod, period)` of `x`.
    pub fn orbit_structure(&self, x: &FpPoint) -> Result<(usize, usize)> {
        let mut seen: HashMap<FpPoint, usize> = HashMap::new();
        let mut q = x.clone();
        let mut i = 0usize;
        loop {
            if let Some(&first) = seen.get(&q) {
                return Ok((first, i - first));
            }
            seen.insert(q.clone(), i);
            q = self.apply(&q)?;
            i += 1;
        }
    }

    /// The functional graph of the map on Pᴺ(𝔽ₚ).
    pub fn cyclegraph(&self) -> Result<CycleGraph<FpPoint>> {
        let mut g = CycleGraph::new();
        for x in self.points() {
            let y = self.apply(&x)?;
            g.insert_edge(x, y);
        }
        Ok(g)
    }
}

impl SelfMap for ReducedEndomorphism {
    type Coeffs = PrimeField;

    fn coeff_ring(&self) -> &PrimeField {
        &self.field
    }

    fn polys(&self) -> &[Poly<u64>] {
        &self.polys
    }

    fn degree(&self) -> u32 {
        self.degree
    }

    fn is_morphism(&self) -> bool {
        match forms_define_morphism(&self.field, &self.polys) {
            Ok(ok) => ok,
            Err(e) => {
                debug!(p = self.prime(), error = %e, "morphism test did not finish");
                false
            }
        }
    }

    fn reduce(&self, p: u64) -> Result<ReducedEndomorphism> {
        if p == self.prime() {
            Ok(self.clone())
        } else {
            Err(DynamicsError::InvalidInput {
                reason: format!("cannot reduce a map over F_{} mod {p}", self.prime()),
            })
        }
    }
}

impl fmt::Display for ReducedEndomorphism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        let forms: Vec<String> = self.polys.iter().map(|g| g.display_with(&names)).collect();
        write!(f, "({}) over F_{}", forms.join(" : "), self.prime())
    }
}
