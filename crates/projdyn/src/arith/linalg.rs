//! Exact dense linear algebra on `DMatrix` storage.
//!
//! nalgebra supplies the container and indexing; the arithmetic goes through a
//! `Ring` so the same routines serve ℚ, 𝔽ₚ and ℤ/pᵏ. Elimination always picks a
//! unit pivot, which is exact over a field and over the local ring ℤ/pᵏ
//! (a matrix there is invertible iff it is invertible mod p).

use nalgebra::DMatrix;

use super::ring::Ring;

pub fn identity<R: Ring>(ring: &R, n: usize) -> DMatrix<R::Elem> {
    DMatrix::from_fn(n, n, |i, j| if i == j { ring.one() } else { ring.zero() })
}

pub fn mat_mul<R: Ring>(ring: &R, a: &DMatrix<R::Elem>, b: &DMatrix<R::Elem>) -> DMatrix<R::Elem> {
    debug_assert_eq!(a.ncols(), b.nrows(), "inner dimensions differ");
    DMatrix::from_fn(a.nrows(), b.ncols(), |i, j| {
        (0..a.ncols()).fold(ring.zero(), |acc, k| {
            ring.add(&acc, &ring.mul(&a[(i, k)], &b[(k, j)]))
        })
    })
}

pub fn mat_sub<R: Ring>(ring: &R, a: &DMatrix<R::Elem>, b: &DMatrix<R::Elem>) -> DMatrix<R::Elem> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| ring.sub(&a[(i, j)], &b[(i, j)]))
}

pub fn mat_vec<R: Ring>(ring: &R, a: &DMatrix<R::Elem>, v: &[R::Elem]) -> Vec<R::Elem> {
    (0..a.nrows())
        .map(|i| {
            v.iter().enumerate().fold(ring.zero(), |acc, (k, x)| {
                ring.add(&acc, &ring.mul(&a[(i, k)], x))
            })
        })
        .collect()
}

fn find_unit_pivot<R: Ring>(ring: &R, m: &DMatrix<R::Elem>, col: usize, from: usize) -> Option<usize> {
    (from..m.nrows()).find(|&r| ring.is_unit(&m[(r, col)]))
}

/// Determinant by unit-pivot elimination.
///
/// Over a field this always succeeds. Over ℤ/pᵏ it returns `None` when some
/// column has nonzero entries but no unit, i.e. when the answer is a non-unit
/// that elimination cannot reach.
pub fn det<R: Ring>(ring: &R, m: &DMatrix<R::Elem>) -> Option<R::Elem> {
    let n = m.nrows();
    debug_assert_eq!(n, m.ncols(), "determinant of a non-square matrix");
    let mut a = m.clone();
    let mut acc = ring.one();
    for col in 0..n {
        let Some(piv) = find_unit_pivot(ring, &a, col, col) else {
            if (col..n).all(|r| ring.is_zero(&a[(r, col)])) {
                return Some(ring.zero());
            }
            return None;
        };
        if piv != col {
            a.swap_rows(piv, col);
            acc = ring.neg(&acc);
        }
        let pv = a[(col, col)].clone();
        acc = ring.mul(&acc, &pv);
        let inv = ring.inv(&pv)?;
        for r in col + 1..n {
            let factor = ring.mul(&a[(r, col)], &inv);
            if ring.is_zero(&factor) {
                continue;
            }
            for c in col..n {
                let v = ring.sub(&a[(r, c)], &ring.mul(&factor, &a[(col, c)]));
                a[(r, c)] = v;
            }
        }
    }
    Some(acc)
}

/// Gauss–Jordan inverse; `None` if the matrix is not invertible.
pub fn inverse<R: Ring>(ring: &R, m: &DMatrix<R::Elem>) -> Option<DMatrix<R::Elem>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }
    let mut a = m.clone();
    let mut inv = identity(ring, n);
    for col in 0..n {
        let piv = find_unit_pivot(ring, &a, col, col)?;
        a.swap_rows(piv, col);
        inv.swap_rows(piv, col);
        let s = ring.inv(&a[(col, col)])?;
        for c in 0..n {
            a[(col, c)] = ring.mul(&a[(col, c)], &s);
            inv[(col, c)] = ring.mul(&inv[(col, c)], &s);
        }
        for r in 0..n {
            if r == col || ring.is_zero(&a[(r, col)]) {
                continue;
            }
            let factor = a[(r, col)].clone();
            for c in 0..n {
                let va = ring.sub(&a[(r, c)], &ring.mul(&factor, &a[(col, c)]));
                let vi = ring.sub(&inv[(r, c)], &ring.mul(&factor, &inv[(col, c)]));
                a[(r, c)] = va;
                inv[(r, c)] = vi;
            }
        }
    }
    Some(inv)
}

/// Reduced row echelon form over a field; returns the pivot columns.
pub fn rref<R: Ring>(ring: &R, m: &mut DMatrix<R::Elem>) -> Vec<usize> {
    let (rows, cols) = m.shape();
    let mut pivots = Vec::new();
    let mut row = 0;
    for col in 0..cols {
        if row == rows {
            break;
        }
        let Some(piv) = find_unit_pivot(ring, m, col, row) else {
            continue;
        };
        m.swap_rows(piv, row);
        if let Some(s) = ring.inv(&m[(row, col)]) {
            for c in col..cols {
                m[(row, c)] = ring.mul(&m[(row, c)], &s);
            }
        }
        for r in 0..rows {
            if r == row || ring.is_zero(&m[(r, col)]) {
                continue;
            }
            let factor = m[(r, col)].clone();
            for c in col..cols {
                let v = ring.sub(&m[(r, c)], &ring.mul(&factor, &m[(row, c)]));
                m[(r, c)] = v;
            }
        }
        pivots.push(col);
        row += 1;
    }
    pivots
}

/// One solution of `A x = b` over a field, free unknowns set to zero.
pub fn solve_particular<R: Ring>(
    ring: &R,
    a: &DMatrix<R::Elem>,
    b: &[R::Elem],
) -> Option<Vec<R::Elem>> {
    let (rows, cols) = a.shape();
    let mut aug = DMatrix::from_fn(rows, cols + 1, |i, j| {
        if j < cols {
            a[(i, j)].clone()
        } else {
            b[i].clone()
        }
    });
    let pivots = rref(ring, &mut aug);
    if pivots.last() == Some(&cols) {
        return None;
    }
    let mut x = vec![ring.zero(); cols];
    for (r, &c) in pivots.iter().enumerate() {
        x[c] = aug[(r, cols)].clone();
    }
    Some(x)
}

/// Characteristic polynomial `det(x·I − M)` over a field, coefficients low → high.
///
/// Reduce to upper Hessenberg form by similarity, then run the three-term
/// recurrence on the leading principal minors.
pub fn charpoly<R: Ring>(ring: &R, m: &DMatrix<R::Elem>) -> Vec<R::Elem> {
    let n = m.nrows();
    let mut h = m.clone();
    for j in 0..n.saturating_sub(2) {
        let Some(i) = (j + 1..n).find(|&i| !ring.is_zero(&h[(i, j)])) else {
            continue;
        };
        if i != j + 1 {
            h.swap_rows(i, j + 1);
            h.swap_columns(i, j + 1);
        }
        let Some(pinv) = ring.inv(&h[(j + 1, j)]) else {
            continue;
        };
        for i in j + 2..n {
            let u = ring.mul(&h[(i, j)], &pinv);
            if ring.is_zero(&u) {
                continue;
            }
            for c in 0..n {
                let v = ring.sub(&h[(i, c)], &ring.mul(&u, &h[(j + 1, c)]));
                h[(i, c)] = v;
            }
            for r in 0..n {
                let v = ring.add(&h[(r, j + 1)], &ring.mul(&u, &h[(r, i)]));
                h[(r, j + 1)] = v;
            }
        }
    }

    let poly_sub = |a: &[R::Elem], b: &[R::Elem]| -> Vec<R::Elem> {
        let len = a.len().max(b.len());
        (0..len)
            .map(|k| {
                let x = a.get(k).cloned().unwrap_or_else(|| ring.zero());
                let y = b.get(k).cloned().unwrap_or_else(|| ring.zero());
                ring.sub(&x, &y)
            })
            .collect()
    };
    let scale = |a: &[R::Elem], s: &R::Elem| -> Vec<R::Elem> {
        a.iter().map(|c| ring.mul(c, s)).collect()
    };
    let shift = |a: &[R::Elem]| -> Vec<R::Elem> {
        std::iter::once(ring.zero()).chain(a.iter().cloned()).collect()
    };

    let mut p: Vec<Vec<R::Elem>> = vec![vec![ring.one()]];
    for k in 1..=n {
        let prev = &p[k - 1];
        let mut next = poly_sub(&shift(prev), &scale(prev, &h[(k - 1, k - 1)]));
        let mut t = ring.one();
        for i in 1..k {
            t = ring.mul(&t, &h[(k - i, k - i - 1)]);
            let coef = ring.mul(&t, &h[(k - i - 1, k - 1)]);
            next = poly_sub(&next, &scale(&p[k - i - 1], &coef));
        }
        p.push(next);
    }
    p.swap_remove(n)
}
