//! Product repository.

use chrono::Utc;
use serde_json::{Value, json};

use tindahan_core::product::{Product, ProductDraft};
use tindahan_core::{ProductId, UserId};

use super::{RepositoryError, decode, decode_all, image_file_name};
use crate::backend::{AccessToken, Backend, Table, Upload};
use crate::models::CurrentUser;

const TABLE: Table = Table::Products;

/// Repository for one user's catalog.
pub struct ProductRepository<'a> {
    backend: &'a dyn Backend,
    token: &'a AccessToken,
    owner: UserId,
}

impl<'a> ProductRepository<'a> {
    /// Create a repository acting as `user`.
    #[must_use]
    pub const fn new(backend: &'a dyn Backend, user: &'a CurrentUser) -> Self {
        Self {
            backend,
            token: &user.access_token,
            owner: user.id,
        }
    }

    /// Every product the user owns, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the backend call fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = self
            .backend
            .list_by_owner(self.token, TABLE, self.owner)
            .await?;
        Ok(decode_all(TABLE, rows))
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the backend call fails, or
    /// `RepositoryError::DataCorruption` if the row does not decode.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.backend
            .get(self.token, TABLE, self.owner, id.as_i64())
            .await?
            .map(|row| decode(TABLE, row))
            .transpose()
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if encoding, the backend call or decoding fails.
    pub async fn create(
        &self,
        draft: &ProductDraft,
        image_url: Option<String>,
    ) -> Result<Product, RepositoryError> {
        let mut row = serde_json::to_value(draft)?;
        if let Value::Object(fields) = &mut row {
            fields.insert("user_id".to_string(), json!(self.owner));
            fields.insert("image_url".to_string(), json!(image_url));
        }
        let stored = self.backend.insert(self.token, TABLE, row).await?;
        decode(TABLE, stored)
    }

    /// Overwrite a product's fields. The image is only replaced when a new one
    /// was uploaded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product is visible, or
    /// another `RepositoryError` if the call fails.
    pub async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
        image_url: Option<String>,
    ) -> Result<Product, RepositoryError> {
        let mut patch = serde_json::to_value(draft)?;
        if let (Value::Object(fields), Some(url)) = (&mut patch, image_url) {
            fields.insert("image_url".to_string(), json!(url));
        }
        let stored = self
            .backend
            .update(self.token, TABLE, self.owner, id.as_i64(), patch)
            .await
            .map_err(not_found)?;
        decode(TABLE, stored)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the backend call fails.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        self.backend
            .delete(self.token, TABLE, self.owner, id.as_i64())
            .await?;
        Ok(())
    }

    /// Upload a product image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the upload fails.
    pub async fn upload_image(
        &self,
        original_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, RepositoryError> {
        let upload = Upload {
            file_name: image_file_name(self.owner, original_name, Utc::now()),
            content_type: content_type.to_string(),
            bytes,
        };
        tracing::debug!(file_name = %upload.file_name, size = upload.bytes.len(), "Uploading product image");
        Ok(self.backend.upload_image(self.token, upload).await?)
    }
}

/// Surface a missing row as `RepositoryError::NotFound`.
pub(super) fn not_found(error: crate::backend::BackendError) -> RepositoryError {
    match error {
        crate::backend::BackendError::NotFound(_) => RepositoryError::NotFound,
        other => RepositoryError::Backend(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use tindahan_core::auth::Credentials;
    use tindahan_core::types::Category;

    async fn user(backend: &MemoryBackend, email: &str) -> CurrentUser {
        backend.create_user(email, "pw", None).await;
        let token = backend
            .sign_in(&Credentials::from_login(email, "pw").unwrap())
            .await
            .unwrap();
        let auth = backend.current_user(&token).await.unwrap();
        CurrentUser::from_auth(auth, token).unwrap()
    }

    fn draft(name: &str, price: &str) -> ProductDraft {
        ProductDraft::from_form(name, "Canned Goods", price, None).unwrap()
    }

    #[tokio::test]
    async fn test_create_list_update_delete() {
        let backend = MemoryBackend::new();
        let lola = user(&backend, "lola@example.com").await;
        let repo = ProductRepository::new(&backend, &lola);

        let tuna = repo
            .create(&draft("Tuna", "120"), Some("https://img/tuna.png".to_string()))
            .await
            .unwrap();
        repo.create(&draft("Beef Loaf", "35"), None).await.unwrap();
        assert_eq!(tuna.user_id, Some(lola.id));
        assert_eq!(tuna.category, Category::CannedGoods);

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Beef Loaf", "Tuna"]);

        let updated = repo.update(tuna.id, &draft("Tuna Flakes", "125"), None).await.unwrap();
        assert_eq!(updated.name, "Tuna Flakes");
        assert_eq!(updated.image_url.as_deref(), Some("https://img/tuna.png"));

        repo.delete(tuna.id).await.unwrap();
        assert!(repo.get(tuna.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_users_rows_are_invisible() {
        let backend = MemoryBackend::new();
        let lola = user(&backend, "lola@example.com").await;
        let other = user(&backend, "other@example.com").await;

        let tuna = ProductRepository::new(&backend, &lola)
            .create(&draft("Tuna", "120"), None)
            .await
            .unwrap();

        let repo = ProductRepository::new(&backend, &other);
        assert!(repo.list().await.unwrap().is_empty());
        assert!(matches!(
            repo.update(tuna.id, &draft("Stolen", "1"), None).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_upload_image_names_object_by_owner() {
        let backend = MemoryBackend::new();
        let lola = user(&backend, "lola@example.com").await;
        let repo = ProductRepository::new(&backend, &lola);

        let url = repo
            .upload_image("photo.JPG", "image/jpeg", vec![0xff, 0xd8])
            .await
            .unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let names = backend.object_names().await;
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with(&format!("{}-", lola.id)));
        assert!(names[0].ends_with(".jpg"));
    }
}
