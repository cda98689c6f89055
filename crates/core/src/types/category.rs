//! Fixed product categories.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A category string that is not one of the fixed [`Category`] values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct CategoryError(pub String);

/// Product category.
///
/// Serialized as its display name (e.g. `"Canned Goods"`), which is also
/// what the backend stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Category {
    Biscuits,
    CannedGoods,
    Cigarettes,
    CoffeeAndSugar,
    Condiments,
    Drinks,
    Juice,
    Liquor,
    Rice,
    Snacks,
    SoapAndDowny,
    Shampoo,
    #[default]
    Others,
}

impl Category {
    /// Every category in display order.
    pub const ALL: [Self; 13] = [
        Self::Biscuits,
        Self::CannedGoods,
        Self::Cigarettes,
        Self::CoffeeAndSugar,
        Self::Condiments,
        Self::Drinks,
        Self::Juice,
        Self::Liquor,
        Self::Rice,
        Self::Snacks,
        Self::SoapAndDowny,
        Self::Shampoo,
        Self::Others,
    ];

    /// Human-readable name, also used as the stored value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Biscuits => "Biscuits",
            Self::CannedGoods => "Canned Goods",
            Self::Cigarettes => "Cigarettes",
            Self::CoffeeAndSugar => "Coffee and Sugar",
            Self::Condiments => "Condiments",
            Self::Drinks => "Drinks",
            Self::Juice => "Juice",
            Self::Liquor => "Liquor",
            Self::Rice => "Rice",
            Self::Snacks => "Snacks",
            Self::SoapAndDowny => "Soap and Downy",
            Self::Shampoo => "Shampoo",
            Self::Others => "Others",
        }
    }

    /// Lenient conversion for rows written by older clients.
    ///
    /// Unknown names fall back to [`Category::Others`].
    #[must_use]
    pub fn from_stored(s: &str) -> Self {
        s.parse().unwrap_or(Self::Others)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    /// Strict, case-insensitive parse used for form input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CategoryError(wanted.to_string()))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_stored(&raw))
    }
}
