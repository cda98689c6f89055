//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use tindahan_core::{Email, UserId};

use crate::backend::{AccessToken, AuthUser};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in store owner
/// and to authorize backend calls on their behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity-provider user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Store name given at registration.
    pub store_name: Option<String>,
    /// Bearer token for backend calls. Redacted in `Debug`.
    pub access_token: AccessToken,
}

impl CurrentUser {
    /// Build the session identity from a freshly issued token and the
    /// provider's view of the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider reported an unusable email address.
    pub fn from_auth(
        user: AuthUser,
        access_token: AccessToken,
    ) -> Result<Self, tindahan_core::EmailError> {
        Ok(Self {
            id: user.id,
            email: Email::parse(&user.email)?,
            store_name: user.store_name.filter(|name| !name.trim().is_empty()),
            access_token,
        })
    }

    /// Name shown in the header.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.store_name.as_deref().unwrap_or_else(|| self.email.as_str())
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the visitor's cart.
    pub const CART: &str = "cart";

    /// Key for the receipt captured at the last checkout.
    pub const LAST_RECEIPT: &str = "last_receipt";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_token() {
        let user = CurrentUser::from_auth(
            AuthUser {
                id: UserId::generate(),
                email: "Lola@Example.com".to_string(),
                store_name: Some("  ".to_string()),
            },
            AccessToken::new("eyJ-very-secret"),
        )
        .unwrap();

        assert_eq!(user.display_name(), "lola@example.com");
        let debug = format!("{user:?}");
        assert!(!debug.contains("eyJ-very-secret"));
    }

    #[test]
    fn test_session_round_trip_keeps_token() {
        let user = CurrentUser::from_auth(
            AuthUser {
                id: UserId::generate(),
                email: "lola@example.com".to_string(),
                store_name: Some("Tindahan ni Lola".to_string()),
            },
            AccessToken::new("abc"),
        )
        .unwrap();
        let json = serde_json::to_value(&user).unwrap();
        let back: CurrentUser = serde_json::from_value(json).unwrap();
        assert_eq!(back.access_token.as_str(), "abc");
        assert_eq!(back.display_name(), "Tindahan ni Lola");
    }
}
