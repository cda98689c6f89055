//! The hosted backend the store talks to: table storage, identity and
//! object storage.
//!
//! Handlers never talk HTTP themselves. They go through the [`Backend`] trait,
//! which has two implementations:
//!
//! - [`SupabaseBackend`] - REST client for a hosted Supabase project
//! - [`MemoryBackend`] - in-process tables for tests and local development
//!
//! Rows cross this boundary as raw JSON and are normalized into
//! `tindahan_core` records by the repositories in [`crate::db`].

mod memory;
mod supabase;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tindahan_core::UserId;
use tindahan_core::auth::{Credentials, Registration};

pub use memory::MemoryBackend;
pub use supabase::SupabaseBackend;

/// An untyped table row.
pub type Row = serde_json::Value;

/// Errors returned by a backend call.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not what we expected.
    #[error("unexpected response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint could not be built from the configured project URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Missing, expired or rejected credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// No row with that id is visible to the caller.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Tables the store reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Products,
    Liabilities,
}

impl Table {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Liabilities => "liabilities",
        }
    }

    /// Column the listing is sorted by.
    #[must_use]
    pub const fn order_column(self) -> &'static str {
        match self {
            Self::Products => "name",
            Self::Liabilities => "id",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An identity-provider user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub store_name: Option<String>,
}

/// Bearer token issued by the identity provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Object name within the bucket.
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Everything the store needs from its hosted backend.
///
/// Every data call carries the caller's access token and filters on the
/// owning user id; the backend enforces row ownership on its side as well.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Short name for logs.
    fn backend_tag(&self) -> &'static str;

    /// Rows of `table` owned by `owner`, in the table's natural order.
    async fn list_by_owner(
        &self,
        token: &AccessToken,
        table: Table,
        owner: UserId,
    ) -> Result<Vec<Row>, BackendError>;

    /// One row by id, if it exists and belongs to `owner`.
    async fn get(
        &self,
        token: &AccessToken,
        table: Table,
        owner: UserId,
        id: i64,
    ) -> Result<Option<Row>, BackendError>;

    /// Insert a row and return it as stored (with its new id).
    async fn insert(&self, token: &AccessToken, table: Table, row: Row) -> Result<Row, BackendError>;

    /// Merge `patch` into `owner`'s row with `id` and return the updated row.
    async fn update(
        &self,
        token: &AccessToken,
        table: Table,
        owner: UserId,
        id: i64,
        patch: Row,
    ) -> Result<Row, BackendError>;

    /// Delete `owner`'s row with `id`. Deleting a missing row is not an error.
    async fn delete(
        &self,
        token: &AccessToken,
        table: Table,
        owner: UserId,
        id: i64,
    ) -> Result<(), BackendError>;

    /// The user the token belongs to.
    async fn current_user(&self, token: &AccessToken) -> Result<AuthUser, BackendError>;

    /// Create an account. Returns a token when the provider signs the user in
    /// right away, `None` when an email confirmation is pending.
    async fn sign_up(
        &self,
        registration: &Registration,
        redirect_to: &str,
    ) -> Result<Option<AccessToken>, BackendError>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<AccessToken, BackendError>;

    /// Exchange the token from a confirmation email for a session.
    async fn verify_email(&self, token_hash: &str, kind: &str)
    -> Result<AccessToken, BackendError>;

    async fn sign_out(&self, token: &AccessToken) -> Result<(), BackendError>;

    /// Store an image and return its public URL.
    async fn upload_image(
        &self,
        token: &AccessToken,
        upload: Upload,
    ) -> Result<String, BackendError>;

    /// Readiness check.
    async fn health(&self) -> Result<(), BackendError>;
}
