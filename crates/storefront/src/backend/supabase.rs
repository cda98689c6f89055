//! REST client for a hosted Supabase project.
//!
//! - Tables: PostgREST under `/rest/v1`
//! - Identity: GoTrue under `/auth/v1`
//! - Images: Storage under `/storage/v1`
//!
//! Every request carries the project's anon key in the `apikey` header. Data
//! calls also send the signed-in user's token so row-level security applies.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use tindahan_core::UserId;
use tindahan_core::auth::{Credentials, Registration};

use super::{AccessToken, AuthUser, Backend, BackendError, Row, Table, Upload};
use crate::config::SupabaseConfig;

/// Longest slice of an error body kept for logs and messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Client for the Supabase REST surface.
#[derive(Clone)]
pub struct SupabaseBackend {
    inner: Arc<SupabaseBackendInner>,
}

struct SupabaseBackendInner {
    client: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
    bucket: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: AccessToken,
}

#[derive(Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<AccessToken>,
}

#[derive(Deserialize)]
struct GoTrueUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    store_name: Option<String>,
}

impl SupabaseBackend {
    /// Create a client for the configured project.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            inner: Arc::new(SupabaseBackendInner {
                client: reqwest::Client::new(),
                base_url: config.url.as_str().trim_end_matches('/').to_string(),
                anon_key: config.anon_key.clone(),
                bucket: config.image_bucket.clone(),
            }),
        }
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, BackendError> {
        let raw = format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'));
        let url = if params.is_empty() {
            Url::parse(&raw)?
        } else {
            Url::parse_with_params(&raw, params)?
        };
        Ok(url)
    }

    fn table_endpoint(&self, table: Table, params: &[(&str, &str)]) -> Result<Url, BackendError> {
        self.endpoint(&format!("rest/v1/{}", table.name()), params)
    }

    /// Endpoint addressing one row, filtered by both id and owner.
    fn row_endpoint(
        &self,
        table: Table,
        owner: UserId,
        id: i64,
        select: bool,
    ) -> Result<Url, BackendError> {
        let id = format!("eq.{id}");
        let owner = format!("eq.{owner}");
        let mut params = vec![("id", id.as_str()), ("user_id", owner.as_str())];
        if select {
            params.insert(0, ("select", "*"));
        }
        self.table_endpoint(table, &params)
    }

    /// Public URL of an object in the image bucket.
    #[must_use]
    pub fn public_url(&self, file_name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.inner.base_url,
            self.inner.bucket,
            urlencoding::encode(file_name)
        )
    }

    /// Build a request with the project key, authorized as `token` when given
    /// and as the anonymous role otherwise.
    fn request(&self, method: Method, url: Url, token: Option<&AccessToken>) -> RequestBuilder {
        let anon = self.inner.anon_key.expose_secret();
        let bearer = token.map_or(anon, AccessToken::as_str);
        self.inner
            .client
            .request(method, url)
            .header("apikey", anon)
            .bearer_auth(bearer)
    }

    /// Send a request and decode the JSON body. An empty body decodes to
    /// `null`.
    async fn send(&self, request: RequestBuilder) -> Result<serde_json::Value, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::warn!(
                status = %status,
                body = %body.chars().take(ERROR_BODY_LIMIT).collect::<String>(),
                "Supabase returned non-success status"
            );
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    BackendError::Unauthorized(message)
                }
                StatusCode::NOT_FOUND => BackendError::NotFound(message),
                _ => BackendError::Status {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(ERROR_BODY_LIMIT).collect::<String>(),
                "Failed to parse Supabase response"
            );
            BackendError::Parse(e)
        })
    }

    async fn send_rows(&self, request: RequestBuilder) -> Result<Vec<Row>, BackendError> {
        let value = self.send(request).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Pull a human message out of a Supabase error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(String::from))
        })
        .unwrap_or_else(|| body.chars().take(ERROR_BODY_LIMIT).collect())
}

/// First row of a `return=representation` response.
fn first_row(rows: Vec<Row>, table: Table, id: Option<i64>) -> Result<Row, BackendError> {
    rows.into_iter().next().ok_or_else(|| {
        BackendError::NotFound(id.map_or_else(
            || format!("{table}: no row returned"),
            |id| format!("{table} {id}"),
        ))
    })
}

#[async_trait]
impl Backend for SupabaseBackend {
    fn backend_tag(&self) -> &'static str {
        "supabase"
    }

    async fn list_by_owner(
        &self,
        token: &AccessToken,
        table: Table,
        owner: UserId,
    ) -> Result<Vec<Row>, BackendError> {
        let owner = format!("eq.{owner}");
        let order = format!("{}.asc", table.order_column());
        let url = self.table_endpoint(
            table,
            &[("select", "*"), ("user_id", &owner), ("order", &order)],
        )?;
        self.send_rows(self.request(Method::GET, url, Some(token)))
            .await
    }

    async fn get(
        &self,
        token: &AccessToken,
        table: Table,
        owner: UserId,
        id: i64,
    ) -> Result<Option<Row>, BackendError> {
        let url = self.row_endpoint(table, owner, id, true)?;
        let rows = self
            .send_rows(self.request(Method::GET, url, Some(token)))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, token: &AccessToken, table: Table, row: Row) -> Result<Row, BackendError> {
        let url = self.table_endpoint(table, &[])?;
        let request = self
            .request(Method::POST, url, Some(token))
            .header("Prefer", "return=representation")
            .json(&row);
        first_row(self.send_rows(request).await?, table, None)
    }

    async fn update(
        &self,
        token: &AccessToken,
        table: Table,
        owner: UserId,
        id: i64,
        patch: Row,
    ) -> Result<Row, BackendError> {
        let url = self.row_endpoint(table, owner, id, false)?;
        let request = self
            .request(Method::PATCH, url, Some(token))
            .header("Prefer", "return=representation")
            .json(&patch);
        first_row(self.send_rows(request).await?, table, Some(id))
    }

    async fn delete(
        &self,
        token: &AccessToken,
        table: Table,
        owner: UserId,
        id: i64,
    ) -> Result<(), BackendError> {
        let url = self.row_endpoint(table, owner, id, false)?;
        self.send(self.request(Method::DELETE, url, Some(token)))
            .await?;
        Ok(())
    }

    async fn current_user(&self, token: &AccessToken) -> Result<AuthUser, BackendError> {
        let url = self.endpoint("auth/v1/user", &[])?;
        let value = self.send(self.request(Method::GET, url, Some(token))).await?;
        let user: GoTrueUser = serde_json::from_value(value)?;
        Ok(AuthUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
            store_name: user.user_metadata.store_name,
        })
    }

    async fn sign_up(
        &self,
        registration: &Registration,
        redirect_to: &str,
    ) -> Result<Option<AccessToken>, BackendError> {
        let url = self.endpoint("auth/v1/signup", &[("redirect_to", redirect_to)])?;
        let body = json!({
            "email": registration.credentials.email.as_str(),
            "password": registration.credentials.password,
            "data": { "store_name": registration.store_name },
        });
        let value = self
            .send(self.request(Method::POST, url, None).json(&body))
            .await?;
        let response: SignUpResponse = serde_json::from_value(value)?;
        Ok(response.access_token)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AccessToken, BackendError> {
        let url = self.endpoint("auth/v1/token", &[("grant_type", "password")])?;
        let body = json!({
            "email": credentials.email.as_str(),
            "password": credentials.password,
        });
        let value = self
            .send(self.request(Method::POST, url, None).json(&body))
            .await
            .map_err(|e| match e {
                // GoTrue answers bad credentials with 400 invalid_grant
                BackendError::Status {
                    status: 400,
                    message,
                } => BackendError::Unauthorized(message),
                other => other,
            })?;
        let response: TokenResponse = serde_json::from_value(value)?;
        Ok(response.access_token)
    }

    async fn verify_email(
        &self,
        token_hash: &str,
        kind: &str,
    ) -> Result<AccessToken, BackendError> {
        let url = self.endpoint("auth/v1/verify", &[])?;
        let body = json!({ "type": kind, "token_hash": token_hash });
        let value = self
            .send(self.request(Method::POST, url, None).json(&body))
            .await?;
        let response: TokenResponse = serde_json::from_value(value)?;
        Ok(response.access_token)
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/logout", &[])?;
        self.send(self.request(Method::POST, url, Some(token)))
            .await?;
        Ok(())
    }

    async fn upload_image(
        &self,
        token: &AccessToken,
        upload: Upload,
    ) -> Result<String, BackendError> {
        let path = format!(
            "storage/v1/object/{}/{}",
            self.inner.bucket,
            urlencoding::encode(&upload.file_name)
        );
        let url = self.endpoint(&path, &[])?;
        let request = self
            .request(Method::POST, url, Some(token))
            .header("Content-Type", upload.content_type)
            .header("x-upsert", "false")
            .body(upload.bytes);
        self.send(request).await?;
        Ok(self.public_url(&upload.file_name))
    }

    async fn health(&self) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/health", &[])?;
        self.send(self.request(Method::GET, url, None)).await?;
        Ok(())
    }
}
