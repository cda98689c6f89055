//! Status enums for store records.

use serde::{Deserialize, Serialize};

/// Liability (debt) status.
///
/// `Pending -> Paid` is the only transition; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LiabilityStatus {
    #[default]
    Pending,
    Paid,
}

impl LiabilityStatus {
    /// Whether the debt still counts toward the outstanding balance.
    #[must_use]
    pub const fn is_outstanding(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Display name, identical to the stored value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
        }
    }
}

impl std::fmt::Display for LiabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for LiabilityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            _ => Err(format!("invalid liability status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_values() {
        assert_eq!(
            serde_json::to_string(&LiabilityStatus::Paid).unwrap(),
            "\"Paid\""
        );
        assert_eq!("pending".parse::<LiabilityStatus>().unwrap(), LiabilityStatus::Pending);
        assert!("reopened".parse::<LiabilityStatus>().is_err());
    }
}
