//! Brazilian individual taxpayer number (CPF).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Cpf`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CpfError {
    #[error("CPF must have 11 digits (got {0})")]
    Length(usize),
    #[error("CPF may only contain digits, dots and a dash")]
    InvalidCharacter,
    #[error("CPF cannot be a single repeated digit")]
    Repeated,
    #[error("CPF check digits do not match")]
    CheckDigits,
}

/// A CPF with valid check digits, stored as its 11 bare digits.
///
/// Accepts both `123.456.789-09` and `12345678909`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cpf(String);

impl Cpf {
    const LEN: usize = 11;

    /// Parse and validate a CPF.
    ///
    /// # Errors
    ///
    /// Returns a [`CpfError`] if the input is not a well-formed CPF.
    pub fn parse(s: &str) -> Result<Self, CpfError> {
        let mut digits = Vec::with_capacity(Self::LEN);
        for c in s.trim().chars() {
            match c {
                '0'..='9' => digits.push(c as u8 - b'0'),
                '.' | '-' => {}
                _ => return Err(CpfError::InvalidCharacter),
            }
        }

        if digits.len() != Self::LEN {
            return Err(CpfError::Length(digits.len()));
        }
        if digits.windows(2).all(|w| w.first() == w.get(1)) {
            return Err(CpfError::Repeated);
        }

        let (body, checks) = digits.split_at(9);
        let first = check_digit(body);
        let mut extended = body.to_vec();
        extended.push(first);
        let second = check_digit(&extended);
        if checks != [first, second] {
            return Err(CpfError::CheckDigits);
        }

        Ok(Self(digits.iter().map(|d| char::from(b'0' + d)).collect()))
    }

    /// The 11 digits without punctuation.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }
}

/// Mod-11 check digit over weights `len+1 ..= 2`.
fn check_digit(digits: &[u8]) -> u8 {
    let weight_start = digits.len() + 1;
    let sum: usize = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| usize::from(d) * (weight_start - i))
        .sum();
    let rest = sum % 11;
    if rest < 2 {
        0
    } else {
        #[allow(clippy::cast_possible_truncation)] // 11 - rest is in 2..=9
        let digit = (11 - rest) as u8;
        digit
    }
}

/// Formats as `123.456.789-09`.
impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.0;
        write!(
            f,
            "{}.{}.{}-{}",
            d.get(0..3).unwrap_or_default(),
            d.get(3..6).unwrap_or_default(),
            d.get(6..9).unwrap_or_default(),
            d.get(9..11).unwrap_or_default()
        )
    }
}

impl TryFrom<String> for Cpf {
    type Error = CpfError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cpf> for String {
    fn from(cpf: Cpf) -> Self {
        cpf.0
    }
}
