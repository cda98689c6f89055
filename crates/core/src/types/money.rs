//! Philippine peso amounts using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Currency sign printed in front of every amount.
pub const PESO_SIGN: char = '₱';

/// Errors produced when building a [`Peso`] amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// The input was blank.
    #[error("amount is required")]
    Empty,
    /// The input was not a decimal number.
    #[error("'{0}' is not a valid amount")]
    Invalid(String),
    /// The amount was below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount was above [`Peso::MAX`].
    #[error("amount is too large")]
    TooLarge,
}


/// A non-negative peso amount.
///
/// Prices and debts are both `Peso`. The value is kept at full precision;
/// rounding to centavos happens only when displayed.
///
/// ```
/// use tindahan_core::Peso;
///
/// let price: Peso = "120".parse().unwrap();
/// assert_eq!((price * 2).to_string(), "₱240.00");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Peso(Decimal);

impl Peso {
    /// Zero pesos.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest single price or debt accepted: one trillion pesos.
    pub const MAX: Self = Self(Decimal::from_parts(3_567_587_328, 232, 0, false, 0));

    /// Create an amount, rejecting negative values and values above [`Self::MAX`].
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if `amount` is below zero, or
    /// [`MoneyError::TooLarge`] if it exceeds [`Self::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        if amount > Self::MAX.0 {
            return Err(MoneyError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// Create an amount from whole centavos.
    #[must_use]
    pub fn from_centavos(centavos: u32) -> Self {
        Self(Decimal::new(i64::from(centavos), 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount rounded to centavos, without the currency sign.
    ///
    /// Used in form inputs where the sign would break `type="number"` fields.
    #[must_use]
    pub fn plain(&self) -> String {
        format!("{:.2}", self.rounded())
    }

    fn rounded(self) -> Decimal {
        self.0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl fmt::Display for Peso {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PESO_SIGN}{:.2}", self.rounded())
    }
}

impl FromStr for Peso {
    type Err = MoneyError;

    /// Parse user input such as `120`, `12.50`, `₱1,250.00`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .trim()
            .trim_start_matches(PESO_SIGN)
            .chars()
            .filter(|c| *c != ',')
            .collect();
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Err(MoneyError::Empty);
        }
        let amount =
            Decimal::from_str(cleaned).map_err(|_| MoneyError::Invalid(s.trim().to_string()))?;
        Self::new(amount)
    }
}

impl TryFrom<Decimal> for Peso {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Peso> for Decimal {
    fn from(value: Peso) -> Self {
        value.0
    }
}

// Totals saturate at `Decimal::MAX` instead of panicking on overflow.
impl Add for Peso {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl Mul<u32> for Peso {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(
            self.0
                .checked_mul(Decimal::from(rhs))
                .unwrap_or(Decimal::MAX),
        )
    }
}

impl Sum for Peso {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Peso {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Peso::from_centavos(12_000).to_string(), "₱120.00");
        assert_eq!("0.5".parse::<Peso>().unwrap().to_string(), "₱0.50");
        assert_eq!("10.005".parse::<Peso>().unwrap().to_string(), "₱10.01");
    }

    #[test]
    fn test_parse_accepts_sign_and_grouping() {
        let amount: Peso = "₱1,250.75".parse().unwrap();
        assert_eq!(amount.plain(), "1250.75");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!("".parse::<Peso>(), Err(MoneyError::Empty));
        assert_eq!(" ₱ ".parse::<Peso>(), Err(MoneyError::Empty));
        assert_eq!("-5".parse::<Peso>(), Err(MoneyError::Negative));
        assert!(matches!("abc".parse::<Peso>(), Err(MoneyError::Invalid(_))));
    }

    #[test]
    fn test_arithmetic() {
        let price: Peso = "12.25".parse().unwrap();
        assert_eq!(price * 4, Peso::from_centavos(4_900));
        let total: Peso = [price, price].iter().sum();
        assert_eq!(total.plain(), "24.50");
    }

    #[test]
    fn test_amounts_are_capped() {
        assert_eq!(Peso::MAX.plain(), "1000000000000.00");
        assert!("1000000000000".parse::<Peso>().is_ok());
        assert_eq!(
            "1000000000000.01".parse::<Peso>(),
            Err(MoneyError::TooLarge)
        );
        assert_eq!(
            "79228162514264337593543950335".parse::<Peso>(),
            Err(MoneyError::TooLarge)
        );
        assert!(serde_json::from_str::<Peso>("\"79228162514264337593543950335\"").is_err());
    }

    #[test]
    fn test_overflowing_totals_saturate() {
        let huge = Peso(Decimal::MAX);
        assert_eq!((huge * 2).amount(), Decimal::MAX);
        assert_eq!((huge + Peso::MAX).amount(), Decimal::MAX);
        let total: Peso = [huge, huge, Peso::MAX].iter().sum();
        assert_eq!(total.amount(), Decimal::MAX);

        let most = Peso::MAX * u32::MAX;
        assert!(most > Peso::MAX);
        let lines: Peso = [most, most].iter().sum();
        assert_eq!(lines, most * 2);
    }

    #[test]
    fn test_deserialize_from_number_or_string() {
        let from_number: Peso = serde_json::from_str("120").unwrap();
        let from_string: Peso = serde_json::from_str("\"120.00\"").unwrap();
        assert_eq!(from_number, from_string);
        assert!(serde_json::from_str::<Peso>("-1").is_err());
    }
}
