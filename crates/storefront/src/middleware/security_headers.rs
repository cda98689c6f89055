//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. Start locked down and
//! loosen only when specific functionality requires it.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::CspNonce;
use crate::config::StorefrontConfig;

/// Per-deployment inputs to the header set.
#[derive(Debug, Clone, Default)]
pub struct SecurityHeaders {
    /// Extra origin product images are served from (the storage host).
    pub image_origin: Option<String>,
    /// Ask browsers to upgrade `http:` subresources (HTTPS deployments only).
    pub upgrade_insecure: bool,
}

impl SecurityHeaders {
    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self {
            image_origin: config.image_origin(),
            upgrade_insecure: config.is_secure(),
        }
    }

    /// Build the `Content-Security-Policy` value.
    ///
    /// ```text
    /// default-src 'none';
    /// script-src 'self' 'nonce-…';
    /// style-src 'self';
    /// font-src 'self';
    /// img-src 'self' data: <storage origin>;
    /// connect-src 'self';
    /// frame-src 'none';
    /// object-src 'none';
    /// base-uri 'self';
    /// form-action 'self';
    /// frame-ancestors 'none'
    /// ```
    #[must_use]
    pub fn content_security_policy(&self, nonce: Option<&str>) -> String {
        let script_src = match nonce.filter(|n| !n.is_empty()) {
            Some(nonce) => format!("script-src 'self' 'nonce-{nonce}'"),
            None => "script-src 'self'".to_string(),
        };
        let img_src = match &self.image_origin {
            Some(origin) => format!("img-src 'self' data: {origin}"),
            None => "img-src 'self' data:".to_string(),
        };
        let mut directives = vec![
            "default-src 'none'".to_string(),
            script_src,
            "style-src 'self'".to_string(),
            "font-src 'self'".to_string(),
            img_src,
            "connect-src 'self'".to_string(),
            "frame-src 'none'".to_string(),
            "object-src 'none'".to_string(),
            "base-uri 'self'".to_string(),
            "form-action 'self'".to_string(),
            "frame-ancestors 'none'".to_string(),
        ];
        if self.upgrade_insecure {
            directives.push("upgrade-insecure-requests".to_string());
        }
        directives.join("; ")
    }
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: no-referrer` - Zero referrer leakage
/// - `Content-Security-Policy` - See [`SecurityHeaders::content_security_policy`]
/// - `Permissions-Policy` - Deny sensitive features
/// - `Cache-Control: no-store, max-age=0` - Pages carry per-user data
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
/// - `Cross-Origin-Embedder-Policy: credentialless` - Isolation that still
///   loads storage images without CORP headers
pub async fn security_headers_middleware(
    State(policy): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let nonce = request.extensions().get::<CspNonce>().cloned();
    let is_static = request.uri().path().starts_with("/static/");
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    let csp = policy.content_security_policy(nonce.as_ref().map(CspNonce::value));
    match HeaderValue::from_str(&csp) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid Content-Security-Policy value");
            headers.insert(
                CONTENT_SECURITY_POLICY,
                HeaderValue::from_static("default-src 'none'"),
            );
        }
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             payment=(), \
             usb=()",
        ),
    );

    if !is_static {
        headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store, max-age=0"),
        );
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("credentialless"),
    );

    response
}
