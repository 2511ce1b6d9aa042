//! Sparse multivariate polynomials over a `Ring`.
//!
//! Terms are kept in a `BTreeMap` keyed by exponent vectors with no zero
//! coefficients stored, so structural equality is polynomial equality. The
//! ring is passed to every arithmetic call; the polynomial itself only stores
//! element values.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use super::ring::Ring;

/// Exponent vector, one entry per variable.
pub type Monomial = Vec<u32>;

/// Monomial orders used by the Gröbner routine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonomialOrder {
    /// Lexicographic with `x0 > x1 > … > xN` (elimination order).
    Lex,
    /// Graded reverse lexicographic.
    GrevLex,
}

impl MonomialOrder {
    pub fn cmp(&self, a: &[u32], b: &[u32]) -> Ordering {
        match self {
            MonomialOrder::Lex => a.cmp(b),
            MonomialOrder::GrevLex => {
                let da: u32 = a.iter().sum();
                let db: u32 = b.iter().sum();
                da.cmp(&db).then_with(|| {
                    for i in (0..a.len()).rev() {
                        if a[i] != b[i] {
                            return b[i].cmp(&a[i]);
                        }
                    }
                    Ordering::Equal
                })
            }
        }
    }
}

#[inline]
pub fn monomial_divides(a: &[u32], b: &[u32]) -> bool {
    a.iter().zip(b).all(|(x, y)| x <= y)
}

#[inline]
pub fn monomial_lcm(a: &[u32], b: &[u32]) -> Monomial {
    a.iter().zip(b).map(|(x, y)| *x.max(y)).collect()
}

#[inline]
pub fn monomial_div(a: &[u32], b: &[u32]) -> Monomial {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

#[inline]
pub fn monomials_coprime(a: &[u32], b: &[u32]) -> bool {
    a.iter().zip(b).all(|(x, y)| *x == 0 || *y == 0)
}

/// All exponent vectors of total degree `deg` in `nvars` variables, in lex order
/// (descending).
pub fn monomials_of_degree(nvars: usize, deg: u32) -> Vec<Monomial> {
    fn rec(nvars: usize, deg: u32, prefix: &mut Monomial, out: &mut Vec<Monomial>) {
        if prefix.len() + 1 == nvars {
            prefix.push(deg);
            out.push(prefix.clone());
            prefix.pop();
            return;
        }
        for e in (0..=deg).rev() {
            prefix.push(e);
            rec(nvars, deg - e, prefix, out);
            prefix.pop();
        }
    }
    let mut out = Vec::new();
    if nvars == 0 {
        return out;
    }
    rec(nvars, deg, &mut Vec::with_capacity(nvars), &mut out);
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Poly<E> {
    nvars: usize,
    terms: BTreeMap<Monomial, E>,
}

impl<E: Clone + PartialEq + fmt::Debug> Poly<E> {
    pub fn zero(nvars: usize) -> Self {
        Self {
            nvars,
            terms: BTreeMap::new(),
        }
    }

    pub fn constant<R: Ring<Elem = E>>(ring: &R, nvars: usize, c: E) -> Self {
        Self::monomial(ring, vec![0; nvars], c)
    }

    pub fn one<R: Ring<Elem = E>>(ring: &R, nvars: usize) -> Self {
        Self::constant(ring, nvars, ring.one())
    }

    /// The variable `x_i`.
    pub fn var<R: Ring<Elem = E>>(ring: &R, nvars: usize, i: usize) -> Self {
        let mut m = vec![0; nvars];
        m[i] = 1;
        Self::monomial(ring, m, ring.one())
    }

    pub fn monomial<R: Ring<Elem = E>>(ring: &R, mono: Monomial, c: E) -> Self {
        let nvars = mono.len();
        let mut terms = BTreeMap::new();
        if !ring.is_zero(&c) {
            terms.insert(mono, c);
        }
        Self { nvars, terms }
    }

    /// Build from possibly repeated terms; like terms are summed, zeros dropped.
    pub fn from_terms<R, I>(ring: &R, nvars: usize, it: I) -> Self
    where
        R: Ring<Elem = E>,
        I: IntoIterator<Item = (Monomial, E)>,
    {
        let mut p = Self::zero(nvars);
        for (m, c) in it {
            debug_assert_eq!(m.len(), nvars, "monomial arity mismatch");
            p.add_term(ring, m, c);
        }
        p
    }

    fn add_term<R: Ring<Elem = E>>(&mut self, ring: &R, m: Monomial, c: E) {
        if ring.is_zero(&c) {
            return;
        }
        match self.terms.get_mut(&m) {
            Some(existing) => {
                let s = ring.add(existing, &c);
                if ring.is_zero(&s) {
                    self.terms.remove(&m);
                } else {
                    *existing = s;
                }
            }
            None => {
                self.terms.insert(m, c);
            }
        }
    }

    #[inline]
    pub fn nvars(&self) -> usize {
        self.nvars
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &E)> {
        self.terms.iter()
    }

    pub fn coeff(&self, m: &[u32]) -> Option<&E> {
        self.terms.get(m)
    }

    /// Nonzero constant (no variables), if that is what this is.
    pub fn as_constant(&self) -> Option<&E> {
        if self.terms.len() == 1 {
            let (m, c) = self.terms.iter().next()?;
            if m.iter().all(|e| *e == 0) {
                return Some(c);
            }
        }
        None
    }

    /// `Some(d)` when every term has total degree `d`.
    pub fn homogeneous_degree(&self) -> Option<u32> {
        let mut degs = self.terms.keys().map(|m| m.iter().sum::<u32>());
        let d = degs.next()?;
        degs.all(|e| e == d).then_some(d)
    }

    /// Indices of the variables that occur.
    pub fn variables(&self) -> Vec<usize> {
        (0..self.nvars)
            .filter(|&i| self.terms.keys().any(|m| m[i] > 0))
            .collect()
    }

    pub fn leading(&self, order: MonomialOrder) -> Option<(&Monomial, &E)> {
        self.terms.iter().max_by(|a, b| order.cmp(a.0, b.0))
    }

    pub fn add<R: Ring<Elem = E>>(&self, ring: &R, other: &Self) -> Self {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.add_term(ring, m.clone(), c.clone());
        }
        out
    }

    pub fn sub<R: Ring<Elem = E>>(&self, ring: &R, other: &Self) -> Self {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.add_term(ring, m.clone(), ring.neg(c));
        }
        out
    }

    pub fn neg<R: Ring<Elem = E>>(&self, ring: &R) -> Self {
        self.map(ring, |c| ring.neg(c))
    }

    pub fn scale<R: Ring<Elem = E>>(&self, ring: &R, s: &E) -> Self {
        self.map(ring, |c| ring.mul(c, s))
    }

    /// Multiply by `c · x^mono`.
    pub fn mul_term<R: Ring<Elem = E>>(&self, ring: &R, mono: &[u32], c: &E) -> Self {
        let it = self.terms.iter().map(|(m, a)| {
            let prod: Monomial = m.iter().zip(mono).map(|(x, y)| x + y).collect();
            (prod, ring.mul(a, c))
        });
        Self::from_terms(ring, self.nvars, it)
    }

    pub fn mul<R: Ring<Elem = E>>(&self, ring: &R, other: &Self) -> Self {
        let mut out = Self::zero(self.nvars);
        for (m, c) in &other.terms {
            for (m2, c2) in &self.terms {
                let prod: Monomial = m.iter().zip(m2).map(|(x, y)| x + y).collect();
                out.add_term(ring, prod, ring.mul(c, c2));
            }
        }
        out
    }

    pub fn pow<R: Ring<Elem = E>>(&self, ring: &R, e: u32) -> Self {
        let mut acc = Self::one(ring, self.nvars);
        for _ in 0..e {
            acc = acc.mul(ring, self);
        }
        acc
    }

    /// Coefficient-wise map within the same ring; zero images are dropped.
    pub fn map<R: Ring<Elem = E>>(&self, ring: &R, f: impl Fn(&E) -> E) -> Self {
        Self::from_terms(
            ring,
            self.nvars,
            self.terms.iter().map(|(m, c)| (m.clone(), f(c))),
        )
    }

    /// Change of coefficient ring (reduction mod p, ℤ → ℚ, …).
    pub fn convert<R2: Ring>(&self, ring2: &R2, f: impl Fn(&E) -> R2::Elem) -> Poly<R2::Elem> {
        Poly::from_terms(
            ring2,
            self.nvars,
            self.terms.iter().map(|(m, c)| (m.clone(), f(c))),
        )
    }

    pub fn eval<R: Ring<Elem = E>>(&self, ring: &R, x: &[E]) -> E {
        debug_assert_eq!(x.len(), self.nvars, "point arity mismatch");
        let mut acc = ring.zero();
        for (m, c) in &self.terms {
            let mut t = c.clone();
            for (xi, e) in x.iter().zip(m) {
                if *e > 0 {
                    t = ring.mul(&t, &ring.pow(xi, *e));
                }
            }
            acc = ring.add(&acc, &t);
        }
        acc
    }

    /// Partial derivative with respect to `x_var`.
    pub fn derivative<R: Ring<Elem = E>>(&self, ring: &R, var: usize) -> Self {
        let it = self.terms.iter().filter(|(m, _)| m[var] > 0).map(|(m, c)| {
            let mut m2 = m.clone();
            let e = m2[var];
            m2[var] -= 1;
            (m2, ring.mul(c, &ring.from_i64(e as i64)))
        });
        Self::from_terms(ring, self.nvars, it)
    }

    /// Substitute the assigned variables; unassigned ones stay symbolic.
    pub fn substitute<R: Ring<Elem = E>>(&self, ring: &R, values: &[Option<E>]) -> Self {
        let it = self.terms.iter().map(|(m, c)| {
            let mut coeff = c.clone();
            let mut rest = m.clone();
            for (i, v) in values.iter().enumerate() {
                if let Some(v) = v {
                    if rest[i] > 0 {
                        coeff = ring.mul(&coeff, &ring.pow(v, rest[i]));
                        rest[i] = 0;
                    }
                }
            }
            (rest, coeff)
        });
        Self::from_terms(ring, self.nvars, it)
    }

    /// Dense coefficients (low → high) when only `var` occurs.
    pub fn as_univariate<R: Ring<Elem = E>>(&self, ring: &R, var: usize) -> Option<Vec<E>> {
        if self
            .terms
            .keys()
            .any(|m| m.iter().enumerate().any(|(i, e)| i != var && *e > 0))
        {
            return None;
        }
        let deg = self.terms.keys().map(|m| m[var]).max().unwrap_or(0) as usize;
        let mut out = vec![ring.zero(); deg + 1];
        for (m, c) in &self.terms {
            out[m[var] as usize] = c.clone();
        }
        Some(out)
    }
}

impl<E: Clone + PartialEq + fmt::Debug + fmt::Display> Poly<E> {
    /// Human-readable form with the given variable names, e.g. `x^2 - 29*y^2`.
    pub fn display_with(&self, names: &[&str]) -> String {
        if self.terms.is_empty() {
            return "0".to_string();
        }
        let mut out = String::new();
        for (idx, (m, c)) in self
            .terms
            .iter()
            .rev()
            .enumerate()
        {
            let mut coeff = c.to_string();
            let negative = coeff.starts_with('-');
            if negative {
                coeff.remove(0);
            }
            if idx == 0 {
                if negative {
                    out.push('-');
                }
            } else {
                out.push_str(if negative { " - " } else { " + " });
            }
            let vars: Vec<String> = m
                .iter()
                .enumerate()
                .filter(|(_, e)| **e > 0)
                .map(|(i, e)| {
                    let name = names.get(i).map(|s| s.to_string()).unwrap_or(format!("x{i}"));
                    if *e == 1 {
                        name
                    } else {
                        format!("{name}^{e}")
                    }
                })
                .collect();
            if vars.is_empty() {
                out.push_str(&coeff);
            } else {
                if coeff != "1" {
                    out.push_str(&coeff);
                    out.push('*');
                }
                out.push_str(&vars.join("*"));
            }
        }
        out
    }
}
