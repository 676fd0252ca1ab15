//! Money Conversion Module
//!
//! Unified conversion between the internal minor-unit representation and the
//! client-facing decimal representation. All conversions MUST go through this
//! module.
//!
//! ## Internal Representation
//! - Balances and amounts are stored as `i64` minor units (cents)
//! - The scale factor is `10^MINOR_UNIT_DECIMALS`
//! - Floating point never touches a balance
//!
//! ## Usage
//! ```rust
//! use ledger_transfer::money::{MinorUnits, parse_amount};
//!
//! let amount = parse_amount("40.5").unwrap();
//! assert_eq!(amount, MinorUnits::new(4050));
//! assert_eq!(amount.to_string(), "40.50");
//! ```

use std::fmt;

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;

/// Number of fractional digits carried by every amount (cents).
pub const MINOR_UNIT_DECIMALS: u32 = 2;

const SCALE: i64 = 10i64.pow(MINOR_UNIT_DECIMALS);

// ============================================================================
// Error Types
// ============================================================================

/// Money conversion errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount must be positive")]
    NotPositive,

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// MinorUnits
// ============================================================================

/// An exact amount of money in minor units.
///
/// Displays with exactly [`MINOR_UNIT_DECIMALS`] fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnits(i64);

impl MinorUnits {
    pub const ZERO: MinorUnits = MinorUnits(0);

    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Build from whole major units (e.g. dollars). Returns `None` on overflow.
    pub fn from_major(major: i64) -> Option<Self> {
        major.checked_mul(SCALE).map(Self)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: MinorUnits) -> Option<MinorUnits> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: MinorUnits) -> Option<MinorUnits> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Convert to a `Decimal` with [`MINOR_UNIT_DECIMALS`] scale
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_DECIMALS)
    }

    /// Convert an exact decimal into minor units.
    ///
    /// Rejects non-positive values and anything with sub-cent precision.
    /// Trailing zeros do not count as precision (`40.000` is fine).
    pub fn try_from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        if value <= Decimal::ZERO {
            return Err(MoneyError::NotPositive);
        }

        let normalized = value.normalize();
        if normalized.scale() > MINOR_UNIT_DECIMALS {
            return Err(MoneyError::PrecisionOverflow {
                provided: normalized.scale(),
                max: MINOR_UNIT_DECIMALS,
            });
        }

        let scaled = normalized
            .checked_mul(Decimal::from(SCALE))
            .ok_or(MoneyError::Overflow)?;
        scaled.to_i64().map(Self).ok_or(MoneyError::Overflow)
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.prec$}",
            self.to_decimal(),
            prec = MINOR_UNIT_DECIMALS as usize
        )
    }
}

// ============================================================================
// Parse: Client → Internal
// ============================================================================

/// Parse a client decimal string (e.g. `"40.00"`, `"7"`) into minor units.
///
/// The format is strict: no sign, no exponent, no `.5` or `5.`.
pub fn parse_amount(amount_str: &str) -> Result<MinorUnits, MoneyError> {
    let s = amount_str.trim();
    if s.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    if s.starts_with('-') {
        return Err(MoneyError::NotPositive);
    }
    if s.starts_with('+') {
        return Err(MoneyError::InvalidFormat("+ prefix not allowed".into()));
    }
    if s.starts_with('.') {
        return Err(MoneyError::InvalidFormat(
            "missing leading zero (e.g., use 0.5 instead of .5)".into(),
        ));
    }
    if s.ends_with('.') {
        return Err(MoneyError::InvalidFormat(
            "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
        ));
    }
    if !s.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(MoneyError::InvalidFormat("only digits and '.' are allowed".into()));
    }

    let value = Decimal::from_str_exact(s).map_err(|e| {
        if matches!(e, rust_decimal::Error::ExceedsMaximumPossibleValue) {
            MoneyError::Overflow
        } else {
            MoneyError::InvalidFormat(e.to_string())
        }
    })?;

    MinorUnits::try_from_decimal(value)
}

/// Parse an account balance (seed data). Same format as [`parse_amount`]
/// but zero is allowed.
pub fn parse_balance(balance_str: &str) -> Result<MinorUnits, MoneyError> {
    match parse_amount(balance_str) {
        Err(MoneyError::NotPositive) if !balance_str.trim().starts_with('-') => {
            Ok(MinorUnits::ZERO)
        }
        other => other,
    }
}

/// Parse a JSON amount, number or string, from its raw text.
///
/// Numbers are read from the exact digits the client sent, never through `f64`.
pub fn parse_json_amount(raw: &RawValue) -> Result<MinorUnits, MoneyError> {
    let text = raw.get().trim();
    if text.starts_with('"') {
        let s: String = serde_json::from_str(text)
            .map_err(|_| MoneyError::InvalidFormat("invalid string literal".into()))?;
        return parse_amount(&s);
    }
    if text.contains(['e', 'E']) {
        return Err(MoneyError::InvalidFormat(
            "scientific notation not allowed".into(),
        ));
    }
    if text.starts_with('-') {
        return Err(MoneyError::NotPositive);
    }
    parse_amount(text)
}
