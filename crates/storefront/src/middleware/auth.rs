//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in store owner in route handlers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a signed-in user.
///
/// If nobody is logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Why a [`RequireAuth`] extraction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Nobody is signed in; send them to the login page.
    RedirectToLogin,
    /// The router was built without the session layer.
    SessionLayerMissing,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::SessionLayerMissing => {
                tracing::error!("Session layer missing from the router");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// The signed-in user stored in `session`, if any.
///
/// An unreadable session counts as signed out.
async fn session_user(session: &Session) -> Option<CurrentUser> {
    match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable session user");
            None
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::SessionLayerMissing)?;

        session_user(session)
            .await
            .map(Self)
            .ok_or(AuthRejection::RedirectToLogin)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

/// Helper to set the current user in the session.
///
/// The session id is rotated first so a pre-login cookie cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use tindahan_core::{Email, UserId};

    use super::*;
    use crate::backend::AccessToken;
    use crate::middleware::session::MokaSessionStore;

    fn parts_with(session: Option<Session>) -> Parts {
        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        if let Some(session) = session {
            parts.extensions.insert(session);
        }
        parts
    }

    fn empty_session() -> Session {
        Session::new(None, Arc::new(MokaSessionStore::new(10)), None)
    }

    fn lola() -> CurrentUser {
        CurrentUser {
            id: UserId::generate(),
            email: Email::parse("lola@example.com").unwrap(),
            store_name: Some("Tindahan".to_string()),
            access_token: AccessToken::new("token"),
        }
    }

    #[tokio::test]
    async fn test_missing_session_layer_is_a_server_error() {
        let mut parts = parts_with(None);
        let rejection = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(rejection, AuthRejection::SessionLayerMissing);
        assert_eq!(
            rejection.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let OptionalAuth(user) = OptionalAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_signed_out_redirects_to_login() {
        let mut parts = parts_with(Some(empty_session()));
        let rejection = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(rejection, AuthRejection::RedirectToLogin);
        let response = rejection.into_response();
        assert_eq!(response.headers()["location"], "/auth/login");
    }

    #[tokio::test]
    async fn test_signed_in_user_is_extracted() {
        let session = empty_session();
        let user = lola();
        set_current_user(&session, &user).await.unwrap();

        let mut parts = parts_with(Some(session));
        let RequireAuth(found) = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .ok()
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.display_name(), "Tindahan");
    }
}
