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

//! Symbolic spider angles.
//!
//! An [`Angle`] is a linear expression `c₀·π + c₁ + Σ cᵢ·xᵢ` with rational
//! coefficients over named symbols `xᵢ`. The π part is kept as a [`Phase`],
//! so it is always normalized to (-π, π]. Angles are written and read in the
//! same pretty form the editor shows, e.g. `0`, `π`, `-π/2`, `3π/4` or
//! `2α-π/2`.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;
use std::sync::LazyLock;

use num::{CheckedAdd, CheckedDiv, CheckedMul, One, Rational64, Zero};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::phase::{fmt_coefficient, Phase};

/// Errors produced when parsing an angle expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AngleError {
    #[error("angle has invalid characters: {0:?}")]
    InvalidCharacters(String),
    #[error("unexpected {0:?} in angle expression")]
    UnexpectedToken(String),
    #[error("angle expression ended unexpectedly")]
    UnexpectedEnd,
    #[error("number {0:?} is out of range")]
    NumberOutOfRange(String),
    #[error("angle expression is not linear")]
    NonLinear,
    #[error("angle expression divides by a non-constant")]
    NonConstantDivisor,
    #[error("angle expression divides by zero")]
    DivisionByZero,
    #[error("angle coefficients are out of range")]
    Overflow,
}

/// Coarse classification of an angle, as used by rewrite preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleClass {
    Zero,
    Pi,
    HalfPi,
    NegHalfPi,
    Other,
}

/// A linear angle expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Angle {
    pi: Phase,
    constant: Rational64,
    symbols: BTreeMap<String, Rational64>,
}

impl Angle {
    pub fn zero() -> Self {
        Angle::default()
    }

    pub fn pi() -> Self {
        Angle::from(Phase::pi())
    }

    pub fn half_pi() -> Self {
        Angle::from(Phase::half())
    }

    pub fn neg_half_pi() -> Self {
        Angle::from(Phase::minus_half())
    }

    /// An angle consisting of a single free symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        let mut symbols = BTreeMap::new();
        symbols.insert(name.into(), Rational64::one());
        Angle {
            symbols,
            ..Angle::default()
        }
    }

    /// The π part of the angle.
    pub fn pi_part(&self) -> Phase {
        self.pi
    }

    /// Returns `true` if the angle is a plain multiple of π.
    pub fn is_phase(&self) -> bool {
        self.constant.is_zero() && self.symbols.is_empty()
    }

    pub fn class(&self) -> AngleClass {
        if !self.is_phase() {
            return AngleClass::Other;
        }
        let r = self.pi.to_rational();
        if r.is_zero() {
            AngleClass::Zero
        } else if r.is_one() {
            AngleClass::Pi
        } else if r == Rational64::new(1, 2) {
            AngleClass::HalfPi
        } else if r == Rational64::new(-1, 2) {
            AngleClass::NegHalfPi
        } else {
            AngleClass::Other
        }
    }

    pub fn is_zero(&self) -> bool {
        self.class() == AngleClass::Zero
    }

    pub fn is_pi(&self) -> bool {
        self.class() == AngleClass::Pi
    }

    pub fn is_zero_or_pi(&self) -> bool {
        matches!(self.class(), AngleClass::Zero | AngleClass::Pi)
    }

    /// Returns `true` for ±π/2.
    pub fn is_half_pi(&self) -> bool {
        matches!(self.class(), AngleClass::HalfPi | AngleClass::NegHalfPi)
    }

    /// Adds two angles, or returns `None` if a coefficient of the sum does
    /// not fit.
    pub fn checked_add(&self, rhs: &Angle) -> Option<Angle> {
        let mut sum = self.clone();
        sum.pi = self.pi.checked_add(rhs.pi)?;
        sum.constant = add_coefficients(&self.constant, &rhs.constant)?;
        for (name, c) in &rhs.symbols {
            let entry = sum
                .symbols
                .entry(name.clone())
                .or_insert_with(Rational64::zero);
            *entry = add_coefficients(&*entry, c)?;
        }
        sum.symbols.retain(|_, c| !c.is_zero());
        Some(sum)
    }

    pub fn checked_sub(&self, rhs: &Angle) -> Option<Angle> {
        self.checked_add(&-rhs.clone())
    }
}

// Coefficients never hold `i64::MIN`, so negating one cannot overflow.
fn in_range(r: Rational64) -> Option<Rational64> {
    (*r.numer() != i64::MIN).then_some(r)
}

fn add_coefficients(a: &Rational64, b: &Rational64) -> Option<Rational64> {
    a.checked_add(b).and_then(in_range)
}

fn mul_coefficients(a: &Rational64, b: &Rational64) -> Option<Rational64> {
    a.checked_mul(b).and_then(in_range)
}

fn div_coefficients(a: &Rational64, b: &Rational64) -> Option<Rational64> {
    a.checked_div(b).and_then(in_range)
}

impl From<Phase> for Angle {
    fn from(pi: Phase) -> Self {
        Angle {
            pi,
            ..Angle::default()
        }
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut terms: Vec<String> = self
            .symbols
            .iter()
            .map(|(name, c)| fmt_coefficient(*c, name))
            .collect();
        if !self.constant.is_zero() {
            terms.push(fmt_coefficient(self.constant, ""));
        }
        if !self.pi.is_zero() {
            terms.push(self.pi.to_string());
        }
        if terms.is_empty() {
            return write!(f, "0");
        }
        for (i, t) in terms.iter().enumerate() {
            if i > 0 && !t.starts_with('-') {
                write!(f, "+")?;
            }
            write!(f, "{t}")?;
        }
        Ok(())
    }
}

impl Neg for Angle {
    type Output = Angle;

    fn neg(mut self) -> Angle {
        self.pi = -self.pi;
        self.constant = -self.constant;
        for c in self.symbols.values_mut() {
            *c = -*c;
        }
        self
    }
}

impl FromStr for Angle {
    type Err = AngleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = substitute_escapes(s);
        if let Some(m) = INVALID_CHARS.find(&s) {
            return Err(AngleError::InvalidCharacters(m.as_str().to_string()));
        }
        let tokens = tokenize(&s)?;
        if tokens.is_empty() {
            return Ok(Angle::zero());
        }
        let mut parser = Parser { tokens, pos: 0 };
        let linear = parser.expr()?;
        match parser.peek() {
            None => Ok(linear.into()),
            Some(t) => Err(AngleError::UnexpectedToken(t.to_string())),
        }
    }
}

impl TryFrom<String> for Angle {
    type Error = AngleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Angle> for String {
    fn from(a: Angle) -> String {
        a.to_string()
    }
}

static ESCAPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\?([a-zA-Z]+)").unwrap());

static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r##"[!"#$%',:;<=>?@\[\\\]`{|}~]"##).unwrap());

/// LaTeX names accepted for symbols, with or without a leading backslash.
const MATH_ALPHA: &[(&str, &str)] = &[
    ("Delta", "Δ"),
    ("Gamma", "Γ"),
    ("Lambda", "Λ"),
    ("Omega", "Ω"),
    ("Phi", "Φ"),
    ("Pi", "Π"),
    ("Psi", "Ψ"),
    ("Sigma", "Σ"),
    ("Theta", "Θ"),
    ("Upsilon", "Υ"),
    ("Xi", "Ξ"),
    ("aleph", "ℵ"),
    ("alpha", "α"),
    ("beta", "β"),
    ("chi", "χ"),
    ("delta", "δ"),
    ("ell", "ℓ"),
    ("epsilon", "ϵ"),
    ("eta", "η"),
    ("gamma", "γ"),
    ("hbar", "ℏ"),
    ("iota", "ι"),
    ("kappa", "κ"),
    ("lambda", "λ"),
    ("mu", "μ"),
    ("nu", "ν"),
    ("omega", "ω"),
    ("phi", "ϕ"),
    ("pi", "π"),
    ("psi", "ψ"),
    ("rho", "ρ"),
    ("sigma", "σ"),
    ("tau", "τ"),
    ("theta", "θ"),
    ("upsilon", "υ"),
    ("varepsilon", "ε"),
    ("varphi", "φ"),
    ("varpi", "ϖ"),
    ("varrho", "ϱ"),
    ("varsigma", "ς"),
    ("vartheta", "ϑ"),
    ("xi", "ξ"),
    ("zeta", "ζ"),
];

fn substitute_escapes(s: &str) -> String {
    ESCAPE
        .replace_all(s, |caps: &regex::Captures| {
            MATH_ALPHA
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map_or_else(|| caps[0].to_string(), |(_, sym)| sym.to_string())
        })
        .into_owned()
}

fn is_pi_char(c: char) -> bool {
    matches!(c, 'π' | '𝝅' | '𝝿' | '𝞹')
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Rational64),
    Pi,
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Num(r) => write!(f, "{r}"),
            Token::Pi => write!(f, "π"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn parse_number(text: &str) -> Result<Rational64, AngleError> {
    let out_of_range = || AngleError::NumberOutOfRange(text.to_string());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));
    let mut numer: i64 = 0;
    let mut denom: i64 = 1;
    for c in int_part.chars().chain(frac_part.chars()) {
        let d = c.to_digit(10).ok_or_else(out_of_range)? as i64;
        numer = numer
            .checked_mul(10)
            .and_then(|n| n.checked_add(d))
            .ok_or_else(out_of_range)?;
    }
    for _ in frac_part.chars() {
        denom = denom.checked_mul(10).ok_or_else(out_of_range)?;
    }
    Ok(Rational64::new(numer, denom))
}

fn tokenize(s: &str) -> Result<Vec<Token>, AngleError> {
    let chars: Vec<char> = s.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            _ if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' | '−' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' | '·' | '×' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            _ if is_pi_char(c) => {
                tokens.push(Token::Pi);
                i += 1;
            }
            _ if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(parse_number(&text)?));
            }
            _ if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_')
                    && !is_pi_char(chars[i])
                {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                if name == "pi" {
                    tokens.push(Token::Pi);
                } else {
                    tokens.push(Token::Ident(name));
                }
            }
            _ => return Err(AngleError::InvalidCharacters(c.to_string())),
        }
    }
    Ok(tokens)
}

/// An angle expression under construction. Unlike [`Angle`], the π
/// coefficient is not wrapped until parsing finishes, so that e.g. `3π/2`
/// reads as `-π/2` rather than `π/2`.
#[derive(Debug, Clone, Default)]
struct Linear {
    pi: Rational64,
    constant: Rational64,
    symbols: BTreeMap<String, Rational64>,
}

impl Linear {
    fn constant(r: Rational64) -> Self {
        Linear {
            constant: r,
            ..Linear::default()
        }
    }

    /// Applies `f` to every coefficient, dropping symbols that vanish.
    fn map(
        mut self,
        f: impl Fn(&Rational64) -> Option<Rational64>,
    ) -> Result<Self, AngleError> {
        self.pi = f(&self.pi).ok_or(AngleError::Overflow)?;
        self.constant = f(&self.constant).ok_or(AngleError::Overflow)?;
        for c in self.symbols.values_mut() {
            *c = f(&*c).ok_or(AngleError::Overflow)?;
        }
        self.symbols.retain(|_, c| !c.is_zero());
        Ok(self)
    }

    fn scale(self, k: Rational64) -> Result<Self, AngleError> {
        self.map(|c| mul_coefficients(c, &k))
    }

    fn divide(self, k: Rational64) -> Result<Self, AngleError> {
        if k.is_zero() {
            return Err(AngleError::DivisionByZero);
        }
        self.map(|c| div_coefficients(c, &k))
    }

    fn negate(mut self) -> Self {
        self.pi = -self.pi;
        self.constant = -self.constant;
        for c in self.symbols.values_mut() {
            *c = -*c;
        }
        self
    }

    fn as_constant(&self) -> Option<Rational64> {
        if self.pi.is_zero() && self.symbols.is_empty() {
            Some(self.constant)
        } else {
            None
        }
    }

    fn add(mut self, rhs: Linear) -> Result<Self, AngleError> {
        let sum = |a: &Rational64, b: &Rational64| {
            add_coefficients(a, b).ok_or(AngleError::Overflow)
        };
        self.pi = sum(&self.pi, &rhs.pi)?;
        self.constant = sum(&self.constant, &rhs.constant)?;
        for (name, c) in rhs.symbols {
            let entry = self
                .symbols
                .entry(name)
                .or_insert_with(Rational64::zero);
            *entry = sum(&*entry, &c)?;
        }
        self.symbols.retain(|_, c| !c.is_zero());
        Ok(self)
    }

    /// Multiplies two linear expressions, at least one of which must be a
    /// plain number.
    fn mul(self, rhs: Linear) -> Result<Self, AngleError> {
        if let Some(k) = self.as_constant() {
            rhs.scale(k)
        } else if let Some(k) = rhs.as_constant() {
            self.scale(k)
        } else {
            Err(AngleError::NonLinear)
        }
    }
}

impl From<Linear> for Angle {
    fn from(l: Linear) -> Self {
        Angle {
            pi: Phase::new(l.pi),
            constant: l.constant,
            symbols: l.symbols,
        }
    }
}

/// Recursive descent parser over the grammar
///
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := factor (('*' | '/')? factor)*
/// factor := ('+' | '-') factor | NUM | π | IDENT | '(' expr ')'
/// ```
///
/// where juxtaposition of two factors is multiplication.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expr(&mut self) -> Result<Linear, AngleError> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    acc = acc.add(self.term()?)?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    acc = acc.add(self.term()?.negate())?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Result<Linear, AngleError> {
        let mut acc = self.factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    acc = acc.mul(self.factor()?)?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let k = self
                        .factor()?
                        .as_constant()
                        .ok_or(AngleError::NonConstantDivisor)?;
                    acc = acc.divide(k)?;
                }
                Some(Token::Num(_) | Token::Pi | Token::Ident(_) | Token::LParen) => {
                    acc = acc.mul(self.factor()?)?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn factor(&mut self) -> Result<Linear, AngleError> {
        match self.next() {
            Some(Token::Plus) => self.factor(),
            Some(Token::Minus) => Ok(self.factor()?.negate()),
            Some(Token::Num(r)) => Ok(Linear::constant(r)),
            Some(Token::Pi) => Ok(Linear {
                pi: Rational64::one(),
                ..Linear::default()
            }),
            Some(Token::Ident(name)) => {
                let mut l = Linear::default();
                l.symbols.insert(name, Rational64::one());
                Ok(l)
            }
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(t) => Err(AngleError::UnexpectedToken(t.to_string())),
                    None => Err(AngleError::UnexpectedEnd),
                }
            }
            Some(t) => Err(AngleError::UnexpectedToken(t.to_string())),
            None => Err(AngleError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn angle(s: &str) -> Angle {
        s.parse().unwrap()
    }

    #[rstest]
    #[case::empty("", "0")]
    #[case::zero("0", "0")]
    #[case::pi("π", "π")]
    #[case::pi_ascii("pi", "π")]
    #[case::half("π/2", "π/2")]
    #[case::neg_half("-π/2", "-π/2")]
    #[case::wrap("3π/2", "-π/2")]
    #[case::wrap_neg("-π", "π")]
    #[case::implicit("3π/4", "3π/4")]
    #[case::explicit_mul("3*pi/4", "3π/4")]
    #[case::dot("2·π/3", "2π/3")]
    #[case::decimal("0.25π", "π/4")]
    #[case::escape("\\alpha", "α")]
    #[case::bare_escape("alpha + pi/2", "α+π/2")]
    #[case::symbolic("2α - π/2", "2α-π/2")]
    #[case::cancel("α - α", "0")]
    #[case::parens("(α + π)/2", "α/2+π/2")]
    #[case::constant("1/2", "1/2")]
    fn parse_and_print(#[case] input: &str, #[case] expected: &str) {
        let a = angle(input);
        assert_eq!(a.to_string(), expected);
        assert_eq!(angle(&a.to_string()), a);
    }

    #[rstest]
    #[case::invalid_char("π#2")]
    #[case::brackets("[π]")]
    #[case::nonlinear("α·β")]
    #[case::pi_squared("π·π")]
    #[case::div_symbol("π/α")]
    #[case::div_zero("π/0")]
    #[case::dangling("π+")]
    #[case::unbalanced("(π")]
    fn parse_errors(#[case] input: &str) {
        assert!(input.parse::<Angle>().is_err());
    }

    #[test]
    fn invalid_characters_reported() {
        assert_eq!(
            "π;".parse::<Angle>(),
            Err(AngleError::InvalidCharacters(";".to_string()))
        );
    }

    #[rstest]
    #[case("0", AngleClass::Zero)]
    #[case("π", AngleClass::Pi)]
    #[case("π/2", AngleClass::HalfPi)]
    #[case("-π/2", AngleClass::NegHalfPi)]
    #[case("π/4", AngleClass::Other)]
    #[case("α", AngleClass::Other)]
    #[case("1", AngleClass::Other)]
    fn classify(#[case] input: &str, #[case] class: AngleClass) {
        assert_eq!(angle(input).class(), class);
    }

    #[test]
    fn arithmetic() {
        let sum = |a: Angle, b: Angle| a.checked_add(&b).unwrap();
        assert_eq!(sum(Angle::half_pi(), Angle::half_pi()), Angle::pi());
        assert_eq!(sum(Angle::pi(), Angle::pi()), Angle::zero());
        assert_eq!(
            Angle::zero().checked_sub(&Angle::half_pi()),
            Some(Angle::neg_half_pi())
        );
        assert_eq!(sum(angle("α+π/4"), angle("π/4-α")).to_string(), "π/2");
        assert_eq!(-angle("2α-1/3"), angle("1/3-2α"));
    }

    #[rstest]
    #[case::max_numerator("9223372036854775807")]
    #[case::max_over_max("9223372036854775807/9223372036854775807")]
    #[case::huge_pi("9223372036854775807π/5000000000000000000")]
    #[case::negated_max("-9223372036854775807α")]
    #[case::tiny_pi("π/9223372036854775807")]
    fn parses_at_the_limits(#[case] input: &str) {
        let a = angle(input);
        assert_eq!(angle(&a.to_string()), a);
    }

    #[rstest]
    #[case::numeral("92233720368547758080")]
    #[case::decimal("0.00000000000000000001")]
    #[case::pi_lcm("π/4611686018427387904+π/4611686018427387903")]
    #[case::constant_lcm("1/4611686018427387904+1/4611686018427387903")]
    #[case::symbol_lcm("α/4611686018427387904+α/4611686018427387903")]
    #[case::product("9223372036854775807·2")]
    #[case::min("-9223372036854775807-1")]
    #[case::quotient("(3/2)/(1/9223372036854775807)")]
    fn out_of_range_is_an_error(#[case] input: &str) {
        assert!(matches!(
            input.parse::<Angle>(),
            Err(AngleError::NumberOutOfRange(_) | AngleError::Overflow)
        ));
    }

    #[test]
    fn checked_sums_out_of_range() {
        let a = angle("α/4611686018427387904");
        let b = angle("α/4611686018427387903");
        assert_eq!(a.checked_add(&b), None);
        assert_eq!(a.checked_sub(&b), None);
        let c = angle("9223372036854775807");
        assert_eq!(c.checked_add(&c), None);
        let d = angle("π/9223372036854775807");
        assert_eq!(d.checked_add(&angle("π/9223372036854775806")), None);
        // adding π only moves the π part
        assert!(d.checked_add(&Angle::pi()).is_some());
    }

    #[test]
    fn serde_string() {
        let a = angle("α-π/2");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"α-π/2\"");
        let back: Angle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        assert!(serde_json::from_str::<Angle>("\"π;\"").is_err());
    }
}
