//! Municipality codes used as the join key across every table.
//!
//! Codes are five-digit JIS administrative identifiers. Upstream tables
//! frequently drop the leading zero of Hokkaido codes (`1101` for `01101`)
//! or store the code as an integer, so parsing left-pads short codes.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of digits in a JIS municipality code.
pub const CODE_WIDTH: usize = 5;

/// A validated five-digit municipality code.
///
/// # Examples
/// ```
/// use urbanity_core::MunicipalityCode;
///
/// let code = MunicipalityCode::parse("1101").expect("valid code");
/// assert_eq!(code.as_str(), "01101");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MunicipalityCode(String);

/// Errors returned by [`MunicipalityCode::parse`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MunicipalityCodeError {
    /// The code was empty after trimming whitespace.
    #[error("municipality code is empty")]
    Empty,
    /// The code contained characters other than ASCII digits.
    #[error("municipality code {raw:?} contains non-digit characters")]
    NonDigit {
        /// Raw input as supplied.
        raw: String,
    },
    /// The code had more than five digits.
    #[error("municipality code {raw:?} is longer than five digits")]
    TooLong {
        /// Raw input as supplied.
        raw: String,
    },
}

impl MunicipalityCode {
    /// Parse and normalise a code from its textual form.
    ///
    /// Surrounding whitespace is ignored and codes shorter than five digits
    /// are left-padded with zeros.
    ///
    /// # Errors
    /// Returns [`MunicipalityCodeError`] when the input is empty, contains
    /// non-digit characters, or is longer than five digits.
    pub fn parse(raw: &str) -> Result<Self, MunicipalityCodeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MunicipalityCodeError::Empty);
        }
        if !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(MunicipalityCodeError::NonDigit {
                raw: raw.to_owned(),
            });
        }
        if trimmed.len() > CODE_WIDTH {
            return Err(MunicipalityCodeError::TooLong {
                raw: raw.to_owned(),
            });
        }
        Ok(Self(format!("{trimmed:0>CODE_WIDTH$}")))
    }

    /// Build a code from an integer representation such as `13101`.
    ///
    /// # Errors
    /// Returns [`MunicipalityCodeError::TooLong`] when the number has more
    /// than five digits.
    pub fn from_integer(value: u64) -> Result<Self, MunicipalityCodeError> {
        Self::parse(&value.to_string())
    }

    /// Borrow the normalised five-digit representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MunicipalityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for MunicipalityCode {
    type Err = MunicipalityCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MunicipalityCode {
    type Error = MunicipalityCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MunicipalityCode> for String {
    fn from(code: MunicipalityCode) -> Self {
        code.0
    }
}
