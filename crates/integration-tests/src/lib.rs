//! End-to-end tests for the Tindahan ni Lola storefront.
//!
//! Each test spawns the real router on an ephemeral port, backed by a fresh
//! [`MemoryBackend`], and drives it with a cookie-holding HTTP client the way
//! a browser would. Redirects are not followed so tests can assert on the
//! `Location` of every post/redirect/get hop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tindahan-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::sync::Arc;

use reqwest::{Client, Response, redirect::Policy};
use tokio::net::TcpListener;

use tindahan_storefront::backend::MemoryBackend;
use tindahan_storefront::config::StorefrontConfig;
use tindahan_storefront::state::AppState;

/// Password used by [`TestApp::sign_in`].
pub const TEST_PASSWORD: &str = "sari-sari-123";

/// A running storefront and a client bound to it.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub backend: Arc<MemoryBackend>,
}

impl TestApp {
    /// Serve the storefront on `127.0.0.1` with an empty in-memory backend.
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let base_url = format!("http://{addr}");

        let backend = Arc::new(MemoryBackend::new());
        let config = StorefrontConfig::for_memory(&base_url);
        let state = AppState::new(config, backend.clone());
        let app = tindahan_storefront::app(state);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server failed");
        });

        Self {
            base_url,
            client: new_client(),
            backend,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn get_text(&self, path: &str) -> String {
        let resp = self.get(path).await;
        assert!(resp.status().is_success(), "GET {path}: {}", resp.status());
        resp.text().await.expect("Failed to read body")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Create a confirmed account and sign this client in as it.
    pub async fn sign_in(&self, email: &str, store_name: Option<&str>) {
        self.backend
            .create_user(email, TEST_PASSWORD, store_name)
            .await;
        let resp = self
            .post_form(
                "/auth/login",
                &[("email", email), ("password", TEST_PASSWORD)],
            )
            .await;
        assert_eq!(location(&resp), "/products", "login did not land on products");
    }

    /// A second, cookie-less client against the same server.
    #[must_use]
    pub fn fresh_client(&self) -> Client {
        new_client()
    }
}

fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// The `Location` header of a redirect response.
#[must_use]
pub fn location(resp: &Response) -> String {
    assert!(
        resp.status().is_redirection(),
        "expected a redirect, got {}",
        resp.status()
    );
    resp.headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Ids linked as `{prefix}/{id}/edit` in a page, in page order.
#[must_use]
pub fn edit_ids(html: &str, prefix: &str) -> Vec<i64> {
    let marker = format!("{prefix}/");
    html.match_indices(&marker)
        .filter_map(|(at, _)| {
            let rest = html.get(at + marker.len()..)?;
            let (id, tail) = rest.split_once('/')?;
            if tail.starts_with("edit\"") {
                id.parse().ok()
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_ids() {
        let html = r#"<a href="/products/3/edit">Edit</a>
            <form action="/products/3/delete"></form>
            <a href="/products/12/edit">Edit</a>"#;
        assert_eq!(edit_ids(html, "/products"), [3, 12]);
        assert!(edit_ids(html, "/liabilities").is_empty());
    }
}
