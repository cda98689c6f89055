//! Login and registration form validation.
//!
//! Everything here runs before the identity provider is contacted; a form
//! that fails validation never produces a network call. Password strength is
//! left to the provider.

use core::fmt;

use crate::types::{Email, EmailError};

/// Longest store name accepted at registration.
pub const MAX_STORE_NAME_LENGTH: usize = 80;

/// Problems with a submitted login or registration form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFormError {
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error("password is required")]
    MissingPassword,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("store name must be at most {MAX_STORE_NAME_LENGTH} characters")]
    StoreNameTooLong,
}

impl AuthFormError {
    /// Short code carried in redirect query strings.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Email(_) => "invalid_email",
            Self::MissingPassword => "missing_password",
            Self::PasswordMismatch => "password_mismatch",
            Self::StoreNameTooLong => "store_name_too_long",
        }
    }
}

/// Email and password for signing in.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: Email,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Validate a login form.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFormError`] for a malformed email or an empty password.
    pub fn from_login(email: &str, password: &str) -> Result<Self, AuthFormError> {
        let email = Email::parse(email)?;
        if password.is_empty() {
            return Err(AuthFormError::MissingPassword);
        }
        Ok(Self {
            email,
            password: password.to_string(),
        })
    }
}

/// A validated sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub credentials: Credentials,
    pub store_name: Option<String>,
}

impl Registration {
    /// Validate a registration form.
    ///
    /// The password and its confirmation must match exactly.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFormError::PasswordMismatch`] when `password != confirm`,
    /// and the login errors of [`Credentials::from_login`] otherwise.
    pub fn from_form(
        email: &str,
        password: &str,
        confirm: &str,
        store_name: Option<&str>,
    ) -> Result<Self, AuthFormError> {
        if password != confirm {
            return Err(AuthFormError::PasswordMismatch);
        }
        let credentials = Credentials::from_login(email, password)?;
        let store_name = store_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from);
        if store_name
            .as_ref()
            .is_some_and(|name| name.chars().count() > MAX_STORE_NAME_LENGTH)
        {
            return Err(AuthFormError::StoreNameTooLong);
        }
        Ok(Self {
            credentials,
            store_name,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_confirmation_is_rejected_first() {
        assert_eq!(
            Registration::from_form("not-an-email", "hunter22", "hunter23", None),
            Err(AuthFormError::PasswordMismatch)
        );
    }

    #[test]
    fn test_valid_registration() {
        let reg = Registration::from_form(
            "Lola@Example.com",
            "s3cret-pass",
            "s3cret-pass",
            Some("  Tindahan ni Lola "),
        )
        .unwrap();
        assert_eq!(reg.credentials.email.as_str(), "lola@example.com");
        assert_eq!(reg.store_name.as_deref(), Some("Tindahan ni Lola"));
    }

    #[test]
    fn test_login_requires_password() {
        assert_eq!(
            Credentials::from_login("lola@example.com", "")
                .unwrap_err()
                .code(),
            "missing_password"
        );
        assert_eq!(
            Credentials::from_login("lola", "x").unwrap_err().code(),
            "invalid_email"
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::from_login("lola@example.com", "topsecret").unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("lola@example.com"));
        assert!(!debug.contains("topsecret"));
    }

    #[test]
    fn test_store_name_length() {
        let long = "x".repeat(MAX_STORE_NAME_LENGTH + 1);
        assert_eq!(
            Registration::from_form("a@b.c", "p", "p", Some(&long)),
            Err(AuthFormError::StoreNameTooLong)
        );
    }
}
