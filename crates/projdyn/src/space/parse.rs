//! Text forms for polynomials and points.
//!
//! Polynomials: `x^2 - 29/16*y^2`, `(x + y)^2`, `3*x*y`. Multiplication is
//! explicit; `/` divides by a nonzero constant only.
//! Points: `(5/3 : 1)`, `5/3:1`, or `5/3, 1`.

use std::iter::Peekable;
use std::str::Chars;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;

use super::point::ProjectivePoint;
use crate::arith::{Poly, Rationals};
use crate::error::{DynamicsError, Result};

struct Parser<'a> {
    input: &'a str,
    chars: Peekable<Chars<'a>>,
    vars: &'a [&'a str],
}

impl<'a> Parser<'a> {
    fn err(&self, reason: impl Into<String>) -> DynamicsError {
        DynamicsError::Parse {
            input: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn skip_ws(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.peek().copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<Poly<BigRational>> {
        let r = Rationals;
        let mut acc = self.term()?;
        loop {
            if self.eat('+') {
                acc = acc.add(&r, &self.term()?);
            } else if self.eat('-') {
                acc = acc.sub(&r, &self.term()?);
            } else {
                return Ok(acc);
            }
        }
    }

    fn term(&mut self) -> Result<Poly<BigRational>> {
        let r = Rationals;
        let mut acc = self.unary()?;
        loop {
            if self.eat('*') {
                acc = acc.mul(&r, &self.unary()?);
            } else if self.eat('/') {
                let den = self.unary()?;
                let c = den
                    .as_constant()
                    .cloned()
                    .ok_or_else(|| self.err("division by a non-constant"))?;
                acc = acc.scale(&r, &c.recip());
            } else {
                return Ok(acc);
            }
        }
    }

    fn unary(&mut self) -> Result<Poly<BigRational>> {
        if self.eat('-') {
            return Ok(self.unary()?.neg(&Rationals));
        }
        if self.eat('+') {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Result<Poly<BigRational>> {
        let base = self.atom()?;
        if self.eat('^') {
            let e = self.integer()?;
            let e: u32 = e
                .try_into()
                .map_err(|_| self.err("exponent out of range"))?;
            return Ok(base.pow(&Rationals, e));
        }
        Ok(base)
    }

    fn integer(&mut self) -> Result<BigInt> {
        self.skip_ws();
        let mut digits = String::new();
        while let Some(c) = self.chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(c);
            self.chars.next();
        }
        digits
            .parse::<BigInt>()
            .map_err(|_| self.err("expected an integer"))
    }

    fn atom(&mut self) -> Result<Poly<BigRational>> {
        let r = Rationals;
        let nvars = self.vars.len();
        match self.peek() {
            Some('(') => {
                self.chars.next();
                let inner = self.expr()?;
                if !self.eat(')') {
                    return Err(self.err("missing ')'"));
                }
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() => {
                let n = self.integer()?;
                Ok(Poly::constant(&r, nvars, BigRational::from_integer(n)))
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(c) = self
                    .chars
                    .peek()
                    .copied()
                    .filter(|c| c.is_alphanumeric() || *c == '_')
                {
                    name.push(c);
                    self.chars.next();
                }
                let idx = self
                    .vars
                    .iter()
                    .position(|v| *v == name)
                    .ok_or_else(|| self.err(format!("unknown variable `{name}`")))?;
                Ok(Poly::var(&r, nvars, idx))
            }
            Some(c) => Err(self.err(format!("unexpected `{c}`"))),
            None => Err(self.err("unexpected end of input")),
        }
    }
}

/// Parse a polynomial over ℚ in the named variables.
pub fn parse_poly(input: &str, vars: &[&str]) -> Result<Poly<BigRational>> {
    let mut parser = Parser {
        input,
        chars: input.chars().peekable(),
        vars,
    };
    let poly = parser.expr()?;
    if let Some(c) = parser.peek() {
        return Err(parser.err(format!("trailing `{c}`")));
    }
    Ok(poly)
}

/// Parse a rational like `-5/3` or `7`.
pub fn parse_rational(input: &str) -> Result<BigRational> {
    let err = |reason: &str| DynamicsError::Parse {
        input: input.to_string(),
        reason: reason.to_string(),
    };
    let s = input.trim();
    let (num, den) = match s.split_once('/') {
        Some((n, d)) => (n.trim(), d.trim()),
        None => (s, "1"),
    };
    let num: BigInt = num.parse().map_err(|_| err("bad numerator"))?;
    let den: BigInt = den.parse().map_err(|_| err("bad denominator"))?;
    if den.is_zero() {
        return Err(err("zero denominator"));
    }
    Ok(BigRational::new(num, den))
}

/// Parse a projective point; coordinates separated by `:` or `,`.
pub fn parse_point(input: &str) -> Result<ProjectivePoint> {
    let s = input.trim();
    let s = s.strip_prefix('(').unwrap_or(s);
    let s = s.strip_suffix(')').unwrap_or(s);
    let coords = s
        .split([':', ','])
        .map(parse_rational)
        .collect::<Result<Vec<_>>>()?;
    if coords.len() < 2 {
        return Err(DynamicsError::Parse {
            input: input.to_string(),
            reason: "a projective point needs at least two coordinates".into(),
        });
    }
    ProjectivePoint::new(coords)
}
