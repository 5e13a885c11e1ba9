//! Native asset amount representation.
//!
//! Amounts are stored as base units (the smallest indivisible unit of the
//! asset) and parsed from decimal text exactly. Floating point never touches
//! a monetary value.

use crate::error::{Result, TokenError};
use crate::{BASE_UNITS_PER_COIN, NATIVE_DECIMALS, NATIVE_SYMBOL};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of the native asset.
///
/// Serialized as a decimal string of base units so JSON consumers never
/// round it through a double.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Amount {
    units: u128,
}

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self { units: 0 };

    /// Maximum representable amount.
    pub const MAX: Self = Self { units: u128::MAX };

    /// Create an amount from base units.
    #[must_use]
    pub const fn from_base_units(units: u128) -> Self {
        Self { units }
    }

    /// Create an amount of whole coins.
    ///
    /// # Errors
    ///
    /// Returns error if the result does not fit in base units.
    pub fn coins(coins: u64) -> Result<Self> {
        u128::from(coins)
            .checked_mul(BASE_UNITS_PER_COIN)
            .map(Self::from_base_units)
            .ok_or_else(|| TokenError::invalid_amount("amount too large"))
    }

    /// Parse a decimal literal such as `"0.01"` or `"12"`.
    ///
    /// # Errors
    ///
    /// Returns error if the text is empty, negative, malformed, carries more
    /// fractional digits than the asset has, or overflows.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TokenError::invalid_amount("amount cannot be empty"));
        }
        if trimmed.starts_with('-') {
            return Err(TokenError::invalid_amount("amount must be non-negative"));
        }

        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(TokenError::invalid_amount(format!("malformed amount: {text}")));
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) {
            return Err(TokenError::invalid_amount(format!("malformed amount: {text}")));
        }
        if fraction.len() > NATIVE_DECIMALS as usize {
            return Err(TokenError::invalid_amount(format!(
                "at most {NATIVE_DECIMALS} fractional digits allowed"
            )));
        }

        let overflow = || TokenError::invalid_amount(format!("amount too large: {text}"));
        let whole_units = if whole.is_empty() {
            0
        } else {
            whole.parse::<u128>().map_err(|_| overflow())?
        };
        let fraction_units = if fraction.is_empty() {
            0
        } else {
            let scale = 10u128.pow(NATIVE_DECIMALS - fraction.len() as u32);
            fraction.parse::<u128>().map_err(|_| overflow())? * scale
        };

        whole_units
            .checked_mul(BASE_UNITS_PER_COIN)
            .and_then(|units| units.checked_add(fraction_units))
            .map(Self::from_base_units)
            .ok_or_else(overflow)
    }

    /// Get the amount in base units.
    #[must_use]
    pub const fn base_units(&self) -> u128 {
        self.units
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.units == 0
    }

    /// Render as a decimal string without the asset symbol.
    #[must_use]
    pub fn to_decimal_string(&self) -> String {
        let whole = self.units / BASE_UNITS_PER_COIN;
        let fraction = self.units % BASE_UNITS_PER_COIN;
        if fraction == 0 {
            return whole.to_string();
        }
        let digits = format!("{fraction:0width$}", width = NATIVE_DECIMALS as usize);
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(&self, other: Self) -> Option<Self> {
        match self.units.checked_add(other.units) {
            Some(units) => Some(Self { units }),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(&self, other: Self) -> Option<Self> {
        match self.units.checked_sub(other.units) {
            Some(units) => Some(Self { units }),
            None => None,
        }
    }

    /// Checked multiplication by a whole count (e.g. elapsed minutes).
    #[must_use]
    pub const fn checked_mul(&self, count: u64) -> Option<Self> {
        match self.units.checked_mul(count as u128) {
            Some(units) => Some(Self { units }),
            None => None,
        }
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(&self, other: Self) -> Self {
        Self {
            units: self.units.saturating_add(other.units),
        }
    }

    /// Saturating subtraction.
    #[must_use]
    pub const fn saturating_sub(&self, other: Self) -> Self {
        Self {
            units: self.units.saturating_sub(other.units),
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {NATIVE_SYMBOL}", self.to_decimal_string())
    }
}

impl From<u128> for Amount {
    fn from(units: u128) -> Self {
        Self::from_base_units(units)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.units.to_string()
    }
}

impl TryFrom<String> for Amount {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self> {
        value
            .parse::<u128>()
            .map(Self::from_base_units)
            .map_err(|e| TokenError::invalid_amount(format!("invalid base units {value:?}: {e}")))
    }
}
