//! Liability repository.

use chrono::NaiveDate;
use serde_json::{Value, json};

use tindahan_core::liability::{Liability, LiabilityDraft};
use tindahan_core::{LiabilityId, LiabilityStatus, UserId};

use super::products::not_found;
use super::{RepositoryError, decode, decode_all};
use crate::backend::{AccessToken, Backend, Table};
use crate::models::CurrentUser;

const TABLE: Table = Table::Liabilities;

/// Repository for one user's liabilities.
pub struct LiabilityRepository<'a> {
    backend: &'a dyn Backend,
    token: &'a AccessToken,
    owner: UserId,
}

impl<'a> LiabilityRepository<'a> {
    /// Create a repository acting as `user`.
    #[must_use]
    pub const fn new(backend: &'a dyn Backend, user: &'a CurrentUser) -> Self {
        Self {
            backend,
            token: &user.access_token,
            owner: user.id,
        }
    }

    /// Every liability the user recorded, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the backend call fails.
    pub async fn list(&self) -> Result<Vec<Liability>, RepositoryError> {
        let rows = self
            .backend
            .list_by_owner(self.token, TABLE, self.owner)
            .await?;
        Ok(decode_all(TABLE, rows))
    }

    /// One liability by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backend call or decoding fails.
    pub async fn get(&self, id: LiabilityId) -> Result<Option<Liability>, RepositoryError> {
        self.backend
            .get(self.token, TABLE, self.owner, id.as_i64())
            .await?
            .map(|row| decode(TABLE, row))
            .transpose()
    }

    /// Create a liability, or overwrite the form fields of `editing`.
    ///
    /// New liabilities start out `Pending`. Editing never touches the status
    /// or paid date.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if `editing` names a liability the
    /// user cannot see, or another `RepositoryError` if the call fails.
    pub async fn save(
        &self,
        draft: &LiabilityDraft,
        editing: Option<LiabilityId>,
    ) -> Result<Liability, RepositoryError> {
        let mut row = serde_json::to_value(draft)?;
        let stored = match editing {
            Some(id) => self
                .backend
                .update(self.token, TABLE, self.owner, id.as_i64(), row)
                .await
                .map_err(not_found)?,
            None => {
                if let Value::Object(fields) = &mut row {
                    fields.insert("user_id".to_string(), json!(self.owner));
                    fields.insert("status".to_string(), json!(LiabilityStatus::Pending));
                    fields.insert("paid_date".to_string(), Value::Null);
                }
                self.backend.insert(self.token, TABLE, row).await?
            }
        };
        decode(TABLE, stored)
    }

    /// Mark a liability paid as of `today`.
    ///
    /// Marking an already paid liability again moves its paid date.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such liability is visible.
    pub async fn mark_paid(
        &self,
        id: LiabilityId,
        today: NaiveDate,
    ) -> Result<Liability, RepositoryError> {
        let mut liability = self.get(id).await?.ok_or(RepositoryError::NotFound)?;
        liability.mark_paid(today);
        let patch = json!({
            "status": liability.status,
            "paid_date": liability.paid_date,
        });
        let stored = self
            .backend
            .update(self.token, TABLE, self.owner, id.as_i64(), patch)
            .await
            .map_err(not_found)?;
        decode(TABLE, stored)
    }

    /// Delete a liability.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the backend call fails.
    pub async fn delete(&self, id: LiabilityId) -> Result<(), RepositoryError> {
        self.backend
            .delete(self.token, TABLE, self.owner, id.as_i64())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use tindahan_core::auth::Credentials;

    async fn user(backend: &MemoryBackend) -> CurrentUser {
        backend.create_user("lola@example.com", "pw", None).await;
        let token = backend
            .sign_in(&Credentials::from_login("lola@example.com", "pw").unwrap())
            .await
            .unwrap();
        let auth = backend.current_user(&token).await.unwrap();
        CurrentUser::from_auth(auth, token).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[tokio::test]
    async fn test_new_liability_is_pending() {
        let backend = MemoryBackend::new();
        let lola = user(&backend).await;
        let repo = LiabilityRepository::new(&backend, &lola);

        let draft = LiabilityDraft::from_form("Juan", "100", None, Some("2025-05-30")).unwrap();
        let saved = repo.save(&draft, None).await.unwrap();
        assert_eq!(saved.status, LiabilityStatus::Pending);
        assert_eq!(saved.due_date, Some(day(30)));
        assert_eq!(saved.paid_date, None);
    }

    #[tokio::test]
    async fn test_edit_keeps_paid_status() {
        let backend = MemoryBackend::new();
        let lola = user(&backend).await;
        let repo = LiabilityRepository::new(&backend, &lola);

        let draft = LiabilityDraft::from_form("Juan", "100", None, None).unwrap();
        let saved = repo.save(&draft, None).await.unwrap();
        repo.mark_paid(saved.id, day(2)).await.unwrap();

        let edit = LiabilityDraft::from_form("Juan dela Cruz", "120", Some("softdrinks"), None)
            .unwrap();
        let edited = repo.save(&edit, Some(saved.id)).await.unwrap();
        assert_eq!(edited.debtor_name, "Juan dela Cruz");
        assert_eq!(edited.status, LiabilityStatus::Paid);
        assert_eq!(edited.paid_date, Some(day(2)));
    }

    #[tokio::test]
    async fn test_mark_paid_twice_restamps() {
        let backend = MemoryBackend::new();
        let lola = user(&backend).await;
        let repo = LiabilityRepository::new(&backend, &lola);

        let draft = LiabilityDraft::from_form("Maria", "50", None, None).unwrap();
        let saved = repo.save(&draft, None).await.unwrap();

        let first = repo.mark_paid(saved.id, day(1)).await.unwrap();
        assert_eq!(first.status, LiabilityStatus::Paid);
        let second = repo.mark_paid(saved.id, day(9)).await.unwrap();
        assert_eq!(second.status, LiabilityStatus::Paid);
        assert_eq!(second.paid_date, Some(day(9)));
    }

    #[tokio::test]
    async fn test_missing_liability() {
        let backend = MemoryBackend::new();
        let lola = user(&backend).await;
        let repo = LiabilityRepository::new(&backend, &lola);

        assert!(matches!(
            repo.mark_paid(LiabilityId::new(404), day(1)).await,
            Err(RepositoryError::NotFound)
        ));
        let draft = LiabilityDraft::from_form("Maria", "50", None, None).unwrap();
        assert!(matches!(
            repo.save(&draft, Some(LiabilityId::new(404))).await,
            Err(RepositoryError::NotFound)
        ));
    }
}
