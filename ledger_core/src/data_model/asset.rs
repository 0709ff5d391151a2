//! Asset definitions and the fixed-point quantities balances are kept in.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::DomainId;

/// An asset identifier, `"<name>#<domain>"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId {
    /// The asset's name, unique within its domain.
    pub name: String,
    /// The domain this asset was defined in.
    pub domain: DomainId,
}

impl AssetId {
    /// Builds an asset id from its parts.
    #[must_use]
    pub fn new(name: impl Into<String>, domain: DomainId) -> Self {
        Self {
            name: name.into(),
            domain,
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.domain)
    }
}

/// A registered asset definition: just an identity and a precision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDefinition {
    /// This asset's identity.
    pub id: AssetId,
    /// Number of decimal digits after the point every balance in this
    /// asset is quoted with.
    pub precision: u8,
}

impl AssetDefinition {
    /// Creates an asset definition with the given precision.
    #[must_use]
    pub fn new(id: AssetId, precision: u8) -> Self {
        Self { id, precision }
    }
}

/// A non-negative fixed-point quantity, exact to its asset's precision.
///
/// Represented as `mantissa / 10^precision`; see `SPEC_FULL.md §9` for why
/// this is a small hand-rolled type rather than a compile-time-generic
/// fixed-point crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity {
    mantissa: u128,
    precision: u8,
}

/// Errors raised by [`Quantity`] arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, displaydoc::Display)]
pub enum QuantityError {
    /// precision mismatch: expected {expected}, got {got}
    PrecisionMismatch { expected: u8, got: u8 },
    /// arithmetic would overflow u128
    Overflow,
    /// arithmetic would produce a negative balance
    Underflow,
}

impl Quantity {
    /// Zero at the given precision.
    #[must_use]
    pub fn zero(precision: u8) -> Self {
        Self {
            mantissa: 0,
            precision,
        }
    }

    /// Builds a quantity from its raw mantissa and precision, with no
    /// further validation (callers enforce sign and precision checks at
    /// the command boundary).
    #[must_use]
    pub fn from_parts(mantissa: u128, precision: u8) -> Self {
        Self { mantissa, precision }
    }

    /// The scale this quantity is quoted at.
    #[must_use]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// The raw integer mantissa (value * 10^precision).
    #[must_use]
    pub fn mantissa(&self) -> u128 {
        self.mantissa
    }

    /// `true` if this quantity is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    fn check_precision(&self, other: &Self) -> Result<(), QuantityError> {
        if self.precision != other.precision {
            return Err(QuantityError::PrecisionMismatch {
                expected: self.precision,
                got: other.precision,
            });
        }
        Ok(())
    }

    /// Adds `other` to `self`, checking precision and overflow.
    ///
    /// # Errors
    /// [`QuantityError::PrecisionMismatch`] or [`QuantityError::Overflow`].
    pub fn checked_add(&self, other: &Self) -> Result<Self, QuantityError> {
        self.check_precision(other)?;
        let mantissa = self
            .mantissa
            .checked_add(other.mantissa)
            .ok_or(QuantityError::Overflow)?;
        Ok(Self {
            mantissa,
            precision: self.precision,
        })
    }

    /// Subtracts `other` from `self`, checking precision and underflow.
    ///
    /// # Errors
    /// [`QuantityError::PrecisionMismatch`] or [`QuantityError::Underflow`].
    pub fn checked_sub(&self, other: &Self) -> Result<Self, QuantityError> {
        self.check_precision(other)?;
        let mantissa = self
            .mantissa
            .checked_sub(other.mantissa)
            .ok_or(QuantityError::Underflow)?;
        Ok(Self {
            mantissa,
            precision: self.precision,
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.precision == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let scale = 10_u128.pow(u32::from(self.precision));
        write!(f, "{}.{:0width$}", self.mantissa / scale, self.mantissa % scale, width = self.precision as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_sub_roundtrip() {
        let a = Quantity::from_parts(15000, 2);
        let b = Quantity::from_parts(10000, 2);
        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.mantissa(), 25000);
        let diff = sum.checked_sub(&b).unwrap();
        assert_eq!(diff, a);
    }

    #[test]
    fn precision_mismatch_rejected() {
        let a = Quantity::from_parts(100, 2);
        let b = Quantity::from_parts(100, 3);
        assert!(matches!(
            a.checked_add(&b),
            Err(QuantityError::PrecisionMismatch { .. })
        ));
    }

    #[test]
    fn underflow_rejected() {
        let a = Quantity::from_parts(50, 2);
        let b = Quantity::from_parts(100, 2);
        assert!(matches!(a.checked_sub(&b), Err(QuantityError::Underflow)));
    }

    #[test]
    fn display_formats_with_precision() {
        assert_eq!(Quantity::from_parts(15000, 2).to_string(), "150.00");
        assert_eq!(Quantity::from_parts(5, 0).to_string(), "5");
    }
}
