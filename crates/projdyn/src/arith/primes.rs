//! Primality and prime ranges for the small primes the pipeline touches.
//!
//! Reduction primes stay in the tens or hundreds, so trial division is enough.

/// Deterministic trial-division primality test.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut d = 5u64;
    while d.saturating_mul(d) <= n {
        if n % d == 0 || n % (d + 2) == 0 {
            return false;
        }
        d += 6;
    }
    true
}

/// Smallest prime `>= n`.
pub fn next_prime(n: u64) -> u64 {
    let mut m = n.max(2);
    while !is_prime(m) {
        m += 1;
    }
    m
}

/// All primes in the inclusive range `[lo, hi]`.
pub fn primes_in(lo: u64, hi: u64) -> Vec<u64> {
    (lo.max(2)..=hi).filter(|&q| is_prime(q)).collect()
}

/// Prime factorisation by trial division, as `(prime, exponent)` pairs.
pub fn factor_u64(mut n: u64) -> Vec<(u64, u32)> {
    let mut out = Vec::new();
    let mut d = 2u64;
    while d.saturating_mul(d) <= n {
        if n % d == 0 {
            let mut e = 0;
            while n % d == 0 {
                n /= d;
                e += 1;
            }
            out.push((d, e));
        }
        d += if d == 2 { 1 } else { 2 };
    }
    if n > 1 {
        out.push((n, 1));
    }
    out
}
