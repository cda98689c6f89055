//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required (unless `TINDAHAN_BACKEND=memory`)
//! - `SUPABASE_URL` - Supabase project URL (e.g., <https://abcd.supabase.co>)
//! - `SUPABASE_ANON_KEY` - Project anon API key
//!
//! ## Optional
//! - `TINDAHAN_HOST` - Bind address (default: 127.0.0.1)
//! - `TINDAHAN_PORT` - Listen port (default: 3000)
//! - `TINDAHAN_BASE_URL` - Public URL (default: `http://{host}:{port}`)
//! - `TINDAHAN_BACKEND` - `supabase` (default) or `memory`
//! - `TINDAHAN_IMAGE_BUCKET` - Storage bucket for product images (default: product-images)
//! - `TINDAHAN_LOG_JSON` - Emit JSON logs when set to `1`/`true`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default storage bucket for product images.
pub const DEFAULT_IMAGE_BUCKET: &str = "product-images";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which [`crate::backend::Backend`] implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Supabase,
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(Self::Supabase),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown backend '{other}' (expected supabase or memory)")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Backend selection
    pub backend: BackendKind,
    /// Hosted project settings; `None` when running against memory
    pub supabase: Option<SupabaseConfig>,
    /// Emit logs as JSON
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., production, staging)
    pub sentry_environment: Option<String>,
}

/// Hosted Supabase project configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL
    pub url: Url,
    /// Anon API key
    pub anon_key: SecretString,
    /// Storage bucket for product images
    pub image_bucket: String,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("image_bucket", &self.image_bucket)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("TINDAHAN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("TINDAHAN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("TINDAHAN_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("TINDAHAN_PORT".to_string(), e.to_string()))?;
        let base_url = get_optional_env("TINDAHAN_BASE_URL")
            .map_or_else(|| format!("http://{host}:{port}"), |url| {
                url.trim_end_matches('/').to_string()
            });
        let backend = get_env_or_default("TINDAHAN_BACKEND", "supabase")
            .parse::<BackendKind>()
            .map_err(|e| ConfigError::InvalidEnvVar("TINDAHAN_BACKEND".to_string(), e))?;

        let supabase = match backend {
            BackendKind::Supabase => Some(SupabaseConfig::from_env()?),
            BackendKind::Memory => None,
        };

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            supabase,
            log_json: get_optional_env("TINDAHAN_LOG_JSON").is_some_and(|v| is_truthy(&v)),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for running against the in-memory backend.
    #[must_use]
    pub fn for_memory(base_url: &str) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: base_url.trim_end_matches('/').to_string(),
            backend: BackendKind::Memory,
            supabase: None,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Where confirmation emails send the user back to.
    #[must_use]
    pub fn email_redirect_url(&self) -> String {
        format!("{}/auth/callback", self.base_url)
    }

    /// Origin images may be loaded from, for the content security policy.
    #[must_use]
    pub fn image_origin(&self) -> Option<String> {
        self.supabase
            .as_ref()
            .map(|supabase| supabase.url.origin().ascii_serialization())
    }
}

impl SupabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("SUPABASE_URL")?;
        let url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e.to_string()))?;
        Ok(Self {
            url,
            anon_key: get_validated_secret("SUPABASE_ANON_KEY")?,
            image_bucket: get_env_or_default("TINDAHAN_IMAGE_BUCKET", DEFAULT_IMAGE_BUCKET),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API keys (JWTs) have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from the project settings."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-anon-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength(
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJyb2xlIjoiYW5vbiJ9.Zk3vQ8",
            "TEST_VAR",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("Memory".parse::<BackendKind>(), Ok(BackendKind::Memory));
        assert_eq!("supabase".parse::<BackendKind>(), Ok(BackendKind::Supabase));
        assert!("postgres".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_memory_config_urls() {
        let config = StorefrontConfig::for_memory("https://tindahan.example/");
        assert!(config.is_secure());
        assert_eq!(
            config.email_redirect_url(),
            "https://tindahan.example/auth/callback"
        );
        assert_eq!(config.image_origin(), None);
        assert_eq!(config.socket_addr().ip().to_string(), "127.0.0.1");
    }

    #[test]
    fn test_supabase_config_debug_redacts_key() {
        let config = SupabaseConfig {
            url: Url::parse("https://abcd.supabase.co").unwrap(),
            anon_key: SecretString::from("super_secret_anon_key"),
            image_bucket: DEFAULT_IMAGE_BUCKET.to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("abcd.supabase.co"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_anon_key"));

        let mut full = StorefrontConfig::for_memory("http://localhost:3000");
        full.supabase = Some(config);
        assert_eq!(
            full.image_origin().as_deref(),
            Some("https://abcd.supabase.co")
        );
    }
}
