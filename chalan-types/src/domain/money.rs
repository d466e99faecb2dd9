//! Monetary amounts in minor currency units.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// A monetary amount stored in the smallest currency unit (paise)
/// to avoid floating-point precision issues.
///
/// The service is single-currency; multi-currency handling is a
/// non-goal of this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Creates a new Amount. Negative values are rejected.
    pub fn new(minor: i64) -> Result<Self, DomainError> {
        if minor < 0 {
            return Err(DomainError::NegativeAmount);
        }
        Ok(Self(minor))
    }

    /// The zero amount.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in smallest currency unit.
    pub fn minor(&self) -> i64 {
        self.0
    }

    /// Saturating addition; amounts are non-negative by construction.
    pub fn checked_add(&self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    /// Subtraction that rejects results below zero.
    pub fn checked_sub(&self, other: Amount) -> Result<Amount, DomainError> {
        if self.0 < other.0 {
            return Err(DomainError::Overpayment {
                remaining: self.0,
                requested: other.0,
            });
        }
        Ok(Amount(self.0 - other.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let major = self.0 / 100;
        let minor = (self.0 % 100).abs();
        write!(f, "{}.{:02}", major, minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_creation() {
        let amount = Amount::new(50000).unwrap();
        assert_eq!(amount.minor(), 50000);
    }

    #[test]
    fn test_negative_amount_fails() {
        let result = Amount::new(-100);
        assert!(matches!(result, Err(DomainError::NegativeAmount)));
    }

    #[test]
    fn test_amount_addition() {
        let a = Amount::new(100).unwrap();
        let b = Amount::new(50).unwrap();
        assert_eq!(a.checked_add(b).minor(), 150);
    }

    #[test]
    fn test_subtraction_below_zero_fails() {
        let a = Amount::new(100).unwrap();
        let b = Amount::new(200).unwrap();
        let result = a.checked_sub(b);
        assert!(matches!(result, Err(DomainError::Overpayment { .. })));
    }

    #[test]
    fn test_amount_display() {
        let amount = Amount::new(50050).unwrap();
        assert_eq!(format!("{}", amount), "500.50");
    }
}
