//! Liability (debt) records and the add/edit liability form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::serde_lenient;
use crate::types::{LiabilityId, LiabilityStatus, MoneyError, Peso, UserId};

/// Money owed to the store by a named person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liability {
    #[serde(alias = "_id", deserialize_with = "serde_lenient::id")]
    pub id: LiabilityId,
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Free-text name; also the grouping key.
    #[serde(alias = "debtorName", alias = "debtor", alias = "name")]
    pub debtor_name: String,
    pub amount: Peso,
    #[serde(default, deserialize_with = "serde_lenient::blank_as_none")]
    pub description: Option<String>,
    #[serde(default, alias = "dueDate", deserialize_with = "serde_lenient::date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: LiabilityStatus,
    #[serde(default, alias = "paidDate", deserialize_with = "serde_lenient::date")]
    pub paid_date: Option<NaiveDate>,
}

impl Liability {
    /// Mark the debt as paid on `today`.
    ///
    /// Calling this on an already paid liability keeps it paid and moves the
    /// paid date to `today`.
    pub fn mark_paid(&mut self, today: NaiveDate) {
        self.status = LiabilityStatus::Paid;
        self.paid_date = Some(today);
    }

    /// Whether the debt is still owed.
    #[must_use]
    pub const fn is_outstanding(&self) -> bool {
        self.status.is_outstanding()
    }

    /// Pending and past its due date.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_outstanding() && self.due_date.is_some_and(|due| due < today)
    }
}

/// Validated liability fields, ready to insert or patch.
///
/// Status and paid date are deliberately absent: editing a debt never
/// changes whether it has been paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiabilityDraft {
    pub debtor_name: String,
    pub amount: Peso,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Problems with a submitted liability form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiabilityFormError {
    #[error("debtor name is required")]
    MissingDebtor,
    #[error("invalid amount: {0}")]
    Amount(#[from] MoneyError),
    #[error("invalid due date: {0}")]
    DueDate(String),
}

impl LiabilityFormError {
    /// Short code carried in redirect query strings.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingDebtor => "missing_debtor",
            Self::Amount(_) => "invalid_amount",
            Self::DueDate(_) => "invalid_due_date",
        }
    }
}

impl LiabilityDraft {
    /// Validate raw form values.
    ///
    /// # Errors
    ///
    /// Returns a [`LiabilityFormError`] for a blank debtor, a bad amount, or a
    /// due date that is not `YYYY-MM-DD`.
    pub fn from_form(
        debtor_name: &str,
        amount: &str,
        description: Option<&str>,
        due_date: Option<&str>,
    ) -> Result<Self, LiabilityFormError> {
        let debtor_name = debtor_name.trim();
        if debtor_name.is_empty() {
            return Err(LiabilityFormError::MissingDebtor);
        }
        let amount = amount.parse::<Peso>()?;
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);
        let due_date = match due_date.map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| LiabilityFormError::DueDate(raw.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            debtor_name: debtor_name.to_string(),
            amount,
            description,
            due_date,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pending(amount: &str) -> Liability {
        Liability {
            id: LiabilityId::new(1),
            user_id: None,
            debtor_name: "Juan".to_string(),
            amount: amount.parse().unwrap(),
            description: None,
            due_date: None,
            status: LiabilityStatus::Pending,
            paid_date: None,
        }
    }

    #[test]
    fn test_mark_paid_is_one_way_and_restamps() {
        let mut debt = pending("100");
        debt.mark_paid(day(2025, 3, 1));
        assert_eq!(debt.status, LiabilityStatus::Paid);
        assert_eq!(debt.paid_date, Some(day(2025, 3, 1)));

        debt.mark_paid(day(2025, 3, 9));
        assert_eq!(debt.status, LiabilityStatus::Paid);
        assert_eq!(debt.paid_date, Some(day(2025, 3, 9)));
    }

    #[test]
    fn test_overdue_only_when_pending() {
        let mut debt = pending("50");
        debt.due_date = Some(day(2025, 1, 10));
        assert!(debt.is_overdue(day(2025, 1, 11)));
        assert!(!debt.is_overdue(day(2025, 1, 10)));
        debt.mark_paid(day(2025, 1, 12));
        assert!(!debt.is_overdue(day(2025, 2, 1)));
    }

    #[test]
    fn test_row_with_timestamp_paid_date() {
        let debt: Liability = serde_json::from_value(serde_json::json!({
            "id": 3,
            "debtorName": "Maria",
            "amount": "75.25",
            "status": "Paid",
            "paid_date": "2025-02-14T08:30:00+00:00",
            "due_date": null
        }))
        .unwrap();
        assert_eq!(debt.debtor_name, "Maria");
        assert_eq!(debt.paid_date, Some(day(2025, 2, 14)));
        assert_eq!(debt.due_date, None);
    }

    #[test]
    fn test_oversized_amount_is_invalid() {
        let err = LiabilityDraft::from_form("Pedro", "79228162514264337593543950335", None, None)
            .unwrap_err();
        assert_eq!(err, LiabilityFormError::Amount(MoneyError::TooLarge));
        assert_eq!(err.code(), "invalid_amount");
    }

    #[test]
    fn test_form_validation() {
        let draft =
            LiabilityDraft::from_form(" Pedro ", "120.50", None, Some("2025-06-30")).unwrap();
        assert_eq!(draft.debtor_name, "Pedro");
        assert_eq!(draft.due_date, Some(day(2025, 6, 30)));

        assert_eq!(
            LiabilityDraft::from_form("  ", "1", None, None),
            Err(LiabilityFormError::MissingDebtor)
        );
        assert_eq!(
            LiabilityDraft::from_form("Pedro", "-3", None, None)
                .unwrap_err()
                .code(),
            "invalid_amount"
        );
        assert_eq!(
            LiabilityDraft::from_form("Pedro", "3", None, Some("30/06/2025"))
                .unwrap_err()
                .code(),
            "invalid_due_date"
        );
    }
}
