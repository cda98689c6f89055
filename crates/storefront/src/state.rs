//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::Backend;
use crate::config::StorefrontConfig;
use crate::middleware::SecurityHeaders;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the hosted backend.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: Arc<dyn Backend>,
    security: SecurityHeaders,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `backend` - Table, identity and storage collaborator
    #[must_use]
    pub fn new(config: StorefrontConfig, backend: Arc<dyn Backend>) -> Self {
        let security = SecurityHeaders::from_config(&config);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                security,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend.
    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        self.inner.backend.as_ref()
    }

    /// Security header settings derived from the configuration.
    #[must_use]
    pub fn security_headers(&self) -> &SecurityHeaders {
        &self.inner.security
    }
}
