//! In-process backend for tests and local development.
//!
//! Behaves like the hosted project as far as the store can tell: rows are
//! scoped to the token's user, ids are assigned on insert, sign-ups are
//! confirmed immediately and uploaded images come back as `data:` URLs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use uuid::Uuid;

use tindahan_core::UserId;
use tindahan_core::auth::{Credentials, Registration};

use super::{AccessToken, AuthUser, Backend, BackendError, Row, Table, Upload};

#[derive(Debug, Clone)]
struct MemoryUser {
    id: UserId,
    email: String,
    password: String,
    store_name: Option<String>,
}

/// Tables, users and objects held in memory.
///
/// Issued access tokens are only forgotten on `sign_out`, so the token map
/// grows with every login. Meant for tests and local development.
pub struct MemoryBackend {
    tables: Mutex<HashMap<Table, Vec<Row>>>,
    next_id: AtomicI64,
    users: Mutex<Vec<MemoryUser>>,
    sessions: Mutex<HashMap<String, UserId>>,
    verifications: Mutex<HashMap<String, UserId>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    sign_up_calls: AtomicUsize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            users: Mutex::new(Vec::new()),
            sessions: Mutex::new(HashMap::new()),
            verifications: Mutex::new(HashMap::new()),
            objects: Mutex::new(HashMap::new()),
            sign_up_calls: AtomicUsize::new(0),
        }
    }
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a confirmed account directly.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        store_name: Option<&str>,
    ) -> UserId {
        let user = MemoryUser {
            id: UserId::generate(),
            email: email.to_lowercase(),
            password: password.to_string(),
            store_name: store_name.map(String::from),
        };
        let id = user.id;
        self.users.lock().await.push(user);
        id
    }

    /// Number of times `sign_up` reached the backend.
    #[must_use]
    pub fn sign_up_calls(&self) -> usize {
        self.sign_up_calls.load(Ordering::Relaxed)
    }

    /// The confirmation token that would have been emailed to `email`.
    pub async fn verification_token(&self, email: &str) -> Option<String> {
        let user_id = self.user_by_email(email).await?.id;
        self.verifications
            .lock()
            .await
            .iter()
            .find(|(_, id)| **id == user_id)
            .map(|(hash, _)| hash.clone())
    }

    /// Names of every stored object.
    pub async fn object_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.objects.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    async fn user_by_email(&self, email: &str) -> Option<MemoryUser> {
        let email = email.to_lowercase();
        self.users
            .lock()
            .await
            .iter()
            .find(|user| user.email == email)
            .cloned()
    }

    async fn issue_token(&self, user: UserId) -> AccessToken {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.lock().await.insert(token.clone(), user);
        AccessToken::new(token)
    }

    async fn owner_of(&self, token: &AccessToken) -> Result<UserId, BackendError> {
        self.sessions
            .lock()
            .await
            .get(token.as_str())
            .copied()
            .ok_or_else(|| BackendError::Unauthorized("invalid JWT".to_string()))
    }
}

fn row_id(row: &Row) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

fn row_owner(row: &Row) -> Option<String> {
    row.get("user_id").and_then(Value::as_str).map(String::from)
}

fn owned_by(row: &Row, owner: UserId) -> bool {
    row_owner(row).is_some_and(|id| id == owner.to_string())
}

fn order_key(table: Table, row: &Row) -> (String, i64) {
    let id = row_id(row).unwrap_or_default();
    match table {
        Table::Products => (
            row.get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            id,
        ),
        Table::Liabilities => (String::new(), id),
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn list_by_owner(
        &self,
        token: &AccessToken,
        table: Table,
        owner: UserId,
    ) -> Result<Vec<Row>, BackendError> {
        if self.owner_of(token).await? != owner {
            return Ok(Vec::new());
        }
        let tables = self.tables.lock().await;
        let mut rows: Vec<Row> = tables
            .get(&table)
            .map(|rows| rows.iter().filter(|row| owned_by(row, owner)).cloned().collect())
            .unwrap_or_default();
        rows.sort_by_key(|row| order_key(table, row));
        Ok(rows)
    }

    async fn get(
        &self,
        token: &AccessToken,
        table: Table,
        owner: UserId,
        id: i64,
    ) -> Result<Option<Row>, BackendError> {
        if self.owner_of(token).await? != owner {
            return Ok(None);
        }
        let tables = self.tables.lock().await;
        Ok(tables.get(&table).and_then(|rows| {
            rows.iter()
                .find(|row| row_id(row) == Some(id) && owned_by(row, owner))
                .cloned()
        }))
    }

    async fn insert(&self, token: &AccessToken, table: Table, row: Row) -> Result<Row, BackendError> {
        let owner = self.owner_of(token).await?;
        let Value::Object(mut fields) = row else {
            return Err(BackendError::Status {
                status: 400,
                message: "row must be a JSON object".to_string(),
            });
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        fields.insert("id".to_string(), json!(id));
        let claimed = fields
            .entry("user_id")
            .or_insert_with(|| json!(owner.to_string()));
        if claimed.as_str() != Some(owner.to_string().as_str()) {
            return Err(BackendError::Unauthorized(
                "new row violates row-level security policy".to_string(),
            ));
        }
        let stored = Value::Object(fields);
        self.tables
            .lock()
            .await
            .entry(table)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        token: &AccessToken,
        table: Table,
        owner: UserId,
        id: i64,
        patch: Row,
    ) -> Result<Row, BackendError> {
        let caller = self.owner_of(token).await?;
        let mut tables = self.tables.lock().await;
        let row = tables
            .get_mut(&table)
            .filter(|_| caller == owner)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|row| row_id(row) == Some(id) && owned_by(row, owner))
            })
            .ok_or_else(|| BackendError::NotFound(format!("{table} {id}")))?;
        if let (Value::Object(target), Value::Object(changes)) = (&mut *row, patch) {
            for (key, value) in changes {
                if key != "id" && key != "user_id" {
                    target.insert(key, value);
                }
            }
        }
        Ok(row.clone())
    }

    async fn delete(
        &self,
        token: &AccessToken,
        table: Table,
        owner: UserId,
        id: i64,
    ) -> Result<(), BackendError> {
        if self.owner_of(token).await? != owner {
            return Ok(());
        }
        if let Some(rows) = self.tables.lock().await.get_mut(&table) {
            rows.retain(|row| !(row_id(row) == Some(id) && owned_by(row, owner)));
        }
        Ok(())
    }

    async fn current_user(&self, token: &AccessToken) -> Result<AuthUser, BackendError> {
        let id = self.owner_of(token).await?;
        let users = self.users.lock().await;
        let user = users
            .iter()
            .find(|user| user.id == id)
            .ok_or_else(|| BackendError::Unauthorized("user not found".to_string()))?;
        Ok(AuthUser {
            id: user.id,
            email: user.email.clone(),
            store_name: user.store_name.clone(),
        })
    }

    async fn sign_up(
        &self,
        registration: &Registration,
        _redirect_to: &str,
    ) -> Result<Option<AccessToken>, BackendError> {
        self.sign_up_calls.fetch_add(1, Ordering::Relaxed);
        let email = registration.credentials.email.as_str();
        if self.user_by_email(email).await.is_some() {
            return Err(BackendError::Status {
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        let id = self
            .create_user(
                email,
                &registration.credentials.password,
                registration.store_name.as_deref(),
            )
            .await;
        self.verifications
            .lock()
            .await
            .insert(Uuid::new_v4().simple().to_string(), id);
        Ok(None)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AccessToken, BackendError> {
        match self.user_by_email(credentials.email.as_str()).await {
            Some(user) if user.password == credentials.password => {
                Ok(self.issue_token(user.id).await)
            }
            _ => Err(BackendError::Unauthorized(
                "Invalid login credentials".to_string(),
            )),
        }
    }

    async fn verify_email(
        &self,
        token_hash: &str,
        kind: &str,
    ) -> Result<AccessToken, BackendError> {
        let user = if matches!(kind, "email" | "signup") {
            self.verifications.lock().await.remove(token_hash)
        } else {
            None
        };
        match user {
            Some(user) => Ok(self.issue_token(user).await),
            None => Err(BackendError::Unauthorized(
                "Email link is invalid or has expired".to_string(),
            )),
        }
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), BackendError> {
        self.sessions.lock().await.remove(token.as_str());
        Ok(())
    }

    async fn upload_image(
        &self,
        token: &AccessToken,
        upload: Upload,
    ) -> Result<String, BackendError> {
        self.owner_of(token).await?;
        let url = format!(
            "data:{};base64,{}",
            upload.content_type,
            STANDARD.encode(&upload.bytes)
        );
        self.objects
            .lock()
            .await
            .insert(upload.file_name, upload.bytes);
        Ok(url)
    }

    async fn health(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn signed_in(backend: &MemoryBackend, email: &str) -> (UserId, AccessToken) {
        let id = backend.create_user(email, "pw", None).await;
        let token = backend
            .sign_in(&Credentials::from_login(email, "pw").unwrap())
            .await
            .unwrap();
        (id, token)
    }

    #[tokio::test]
    async fn test_rows_are_scoped_to_owner() {
        let backend = MemoryBackend::new();
        let (lola, lola_token) = signed_in(&backend, "lola@example.com").await;
        let (other, other_token) = signed_in(&backend, "other@example.com").await;

        let row = backend
            .insert(&lola_token, Table::Products, json!({"name": "Tuna", "price": "120"}))
            .await
            .unwrap();
        let id = row_id(&row).unwrap();
        assert_eq!(row_owner(&row), Some(lola.to_string()));

        // Another user, filtering on their own id.
        assert!(
            backend
                .get(&other_token, Table::Products, other, id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(matches!(
            backend
                .update(&other_token, Table::Products, other, id, json!({"name": "X"}))
                .await,
            Err(BackendError::NotFound(_))
        ));
        backend
            .delete(&other_token, Table::Products, other, id)
            .await
            .unwrap();

        // Another user, claiming to be the owner.
        assert!(
            backend
                .get(&other_token, Table::Products, lola, id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(matches!(
            backend
                .update(&other_token, Table::Products, lola, id, json!({"name": "X"}))
                .await,
            Err(BackendError::NotFound(_))
        ));
        backend
            .delete(&other_token, Table::Products, lola, id)
            .await
            .unwrap();

        let rows = backend
            .list_by_owner(&lola_token, Table::Products, lola)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Tuna");

        backend
            .delete(&lola_token, Table::Products, lola, id)
            .await
            .unwrap();
        assert!(
            backend
                .get(&lola_token, Table::Products, lola, id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_products_list_in_name_order() {
        let backend = MemoryBackend::new();
        let (lola, token) = signed_in(&backend, "lola@example.com").await;
        for name in ["Royal", "Coke", "Piattos"] {
            backend
                .insert(&token, Table::Products, json!({"name": name, "price": "1"}))
                .await
                .unwrap();
        }
        let names: Vec<String> = backend
            .list_by_owner(&token, Table::Products, lola)
            .await
            .unwrap()
            .iter()
            .map(|row| row["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["Coke", "Piattos", "Royal"]);
    }

    #[tokio::test]
    async fn test_update_merges_fields_and_keeps_id() {
        let backend = MemoryBackend::new();
        let (lola, token) = signed_in(&backend, "lola@example.com").await;
        let row = backend
            .insert(
                &token,
                Table::Liabilities,
                json!({"debtor_name": "Juan", "amount": "100", "status": "Pending"}),
            )
            .await
            .unwrap();
        let id = row_id(&row).unwrap();
        let updated = backend
            .update(&token, Table::Liabilities, lola, id, json!({"id": 99, "amount": "150"}))
            .await
            .unwrap();
        assert_eq!(row_id(&updated), Some(id));
        assert_eq!(updated["amount"], "150");
        assert_eq!(updated["status"], "Pending");
    }

    #[tokio::test]
    async fn test_sign_up_then_verify() {
        let backend = MemoryBackend::new();
        let registration =
            Registration::from_form("new@example.com", "pw", "pw", Some("Sari-sari")).unwrap();
        assert!(backend.sign_up(&registration, "/").await.unwrap().is_none());
        assert_eq!(backend.sign_up_calls(), 1);

        let hash = backend.verification_token("new@example.com").await.unwrap();
        assert!(backend.verify_email(&hash, "recovery").await.is_err());
        let token = backend.verify_email(&hash, "email").await.unwrap();
        let user = backend.current_user(&token).await.unwrap();
        assert_eq!(user.store_name.as_deref(), Some("Sari-sari"));
        assert!(backend.verify_email(&hash, "email").await.is_err());

        assert!(backend.sign_up(&registration, "/").await.is_err());
    }

    #[tokio::test]
    async fn test_sign_out_revokes_token() {
        let backend = MemoryBackend::new();
        let (_, token) = signed_in(&backend, "lola@example.com").await;
        backend.sign_out(&token).await.unwrap();
        assert!(matches!(
            backend.current_user(&token).await,
            Err(BackendError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_returns_data_url() {
        let backend = MemoryBackend::new();
        let (_, token) = signed_in(&backend, "lola@example.com").await;
        let url = backend
            .upload_image(
                &token,
                Upload {
                    file_name: "u-1.png".to_string(),
                    content_type: "image/png".to_string(),
                    bytes: vec![1, 2, 3],
                },
            )
            .await
            .unwrap();
        assert_eq!(url, "data:image/png;base64,AQID");
        assert_eq!(backend.object_names().await, ["u-1.png"]);
    }
}
