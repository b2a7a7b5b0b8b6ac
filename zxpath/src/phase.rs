// zxpath - ZX-diagram rewriting with traced paths
// Copyright (C) 2021 - Aleks Kissinger
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Phases encoded as a rational number of half-turns.

use std::fmt::{self, Display};
use std::ops::Neg;

use num::{Integer, One, Rational64, Zero};

/// A phase, expressed in half-turns and encoded as a rational number.
///
/// The phase is always normalized to be in the range (-1,1], so `Phase::pi()`
/// is the phase π and `Phase::new((1, 2))` is π/2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Phase {
    r: Rational64,
}

impl Phase {
    /// Creates a new phase.
    ///
    /// Normalizes the phase to be in the range (-1,1].
    pub fn new(r: impl Into<Rational64>) -> Self {
        let r = r.into();
        let (n, d) = widen(r);
        // never larger than `r` itself, so always fits
        Phase {
            r: wrap(n, d).unwrap_or(r),
        }
    }

    pub fn zero() -> Self {
        Phase::default()
    }

    /// The phase π.
    pub fn pi() -> Self {
        Phase::new(1)
    }

    /// The phase π/2.
    pub fn half() -> Self {
        Phase::new((1, 2))
    }

    /// The phase -π/2.
    pub fn minus_half() -> Self {
        Phase::new((-1, 2))
    }

    /// Returns the phase as a rational number.
    pub fn to_rational(&self) -> Rational64 {
        self.r
    }

    pub fn is_zero(&self) -> bool {
        self.r.is_zero()
    }

    pub fn is_pi(&self) -> bool {
        self.r.is_one()
    }

    /// Adds two phases, or returns `None` when the denominator of the sum
    /// does not fit in an `i64`. Adding a multiple of π never fails.
    pub fn checked_add(self, other: Phase) -> Option<Phase> {
        let (a, b) = widen(self.r);
        let (c, d) = widen(other.r);
        let den = b / b.gcd(&d) * d;
        wrap(a * (den / b) + c * (den / d), den).map(|r| Phase { r })
    }
}

fn widen(r: Rational64) -> (i128, i128) {
    (i128::from(*r.numer()), i128::from(*r.denom()))
}

/// Reduces `n/d` (with `d > 0`) into the range (-1,1], failing if the reduced
/// fraction does not fit in an `i64`.
fn wrap(n: i128, d: i128) -> Option<Rational64> {
    let mut n = n.rem_euclid(2 * d);
    if n > d {
        n -= 2 * d;
    }
    let g = n.gcd(&d);
    let numer = i64::try_from(n / g).ok()?;
    let denom = i64::try_from(d / g).ok()?;
    Some(Rational64::new_raw(numer, denom))
}

/// Formats `coeff * name` the way phases are written in the editor, e.g.
/// `π`, `-π/2`, `3α/4`. An empty `name` formats a bare number.
pub(crate) fn fmt_coefficient(coeff: Rational64, name: &str) -> String {
    if name.is_empty() {
        return coeff.to_string();
    }
    let numer = *coeff.numer();
    let denom = *coeff.denom();
    let mut s = String::new();
    if numer < 0 {
        s.push('-');
    }
    if numer.abs() != 1 {
        s.push_str(&numer.abs().to_string());
    }
    s.push_str(name);
    if denom != 1 {
        s.push('/');
        s.push_str(&denom.to_string());
    }
    s
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.r.is_zero() {
            write!(f, "0")
        } else {
            write!(f, "{}", fmt_coefficient(self.r, "π"))
        }
    }
}

impl Neg for Phase {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Rational64::new(3, 1), Rational64::one())]
    #[case(Rational64::new(-1, 1), Rational64::one())]
    #[case(Rational64::new(3, 2), Rational64::new(-1, 2))]
    #[case(Rational64::new(-5, 4), Rational64::new(3, 4))]
    #[case(Rational64::new(4, 1), Rational64::zero())]
    #[case::huge(
        Rational64::new(i64::MAX, 5_000_000_000_000_000_000),
        Rational64::new(-776_627_963_145_224_193, 5_000_000_000_000_000_000)
    )]
    #[case::min(Rational64::new(i64::MIN, 1), Rational64::zero())]
    fn normalize(#[case] input: Rational64, #[case] expected: Rational64) {
        assert_eq!(Phase::new(input).to_rational(), expected);
    }

    #[rstest]
    #[case::zero(Phase::zero(), "0")]
    #[case::pi(Phase::pi(), "π")]
    #[case::half(Phase::half(), "π/2")]
    #[case::minus_half(Phase::minus_half(), "-π/2")]
    #[case::three_quarters(Phase::new((3, 4)), "3π/4")]
    fn display(#[case] phase: Phase, #[case] expected: &str) {
        assert_eq!(phase.to_string(), expected);
    }

    #[test]
    fn arithmetic() {
        let p = Phase::half().checked_add(Phase::half()).unwrap();
        assert!(p.is_pi());
        assert_eq!(p.checked_add(Phase::pi()), Some(Phase::zero()));
        assert_eq!(
            Phase::half().checked_add(-Phase::pi()),
            Some(Phase::minus_half())
        );
        assert_eq!(-Phase::minus_half(), Phase::half());
    }

    #[test]
    fn sums_out_of_range() {
        let a = Phase::new((1, i64::MAX));
        let b = Phase::new((1, i64::MAX - 1));
        assert_eq!(a.checked_add(b), None);

        // a multiple of π keeps the denominator
        let c = Phase::new((i64::MAX - 1, i64::MAX));
        assert_eq!(
            c.checked_add(Phase::pi()),
            Some(Phase::new((-1, i64::MAX)))
        );
        assert_eq!(c.checked_add(-c), Some(Phase::zero()));
    }
}
