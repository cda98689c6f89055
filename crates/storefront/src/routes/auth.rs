//! Authentication route handlers.
//!
//! Handles login, registration, the email confirmation callback and logout.
//! Credentials are checked by the identity provider behind
//! [`crate::backend::Backend`]; only form validation happens here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use tindahan_core::auth::{Credentials, Registration};

use super::{Flash, MessageQuery, redirect_error, redirect_success};
use crate::backend::{AccessToken, BackendError};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Where a signed-in user lands.
const HOME_PATH: &str = "/products";
const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub store_name: Option<String>,
}

/// Query parameters on the emailed confirmation link.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub token_hash: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub flash: Flash,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub flash: Flash,
}

// =============================================================================
// Session
// =============================================================================

/// Resolve the token's user and store them in the session.
///
/// Returns the redirect error code on failure.
async fn start_session(
    state: &AppState,
    session: &Session,
    token: AccessToken,
) -> Result<(), &'static str> {
    let auth_user = state.backend().current_user(&token).await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to fetch user after sign-in");
        "session"
    })?;
    let user = CurrentUser::from_auth(auth_user, token).map_err(|e| {
        tracing::warn!(error = %e, "Identity provider returned an unusable email");
        "session"
    })?;

    set_current_user(session, &user).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to set session");
        "session"
    })?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "User signed in");
    Ok(())
}

/// Redirect code for a failed provider call.
fn provider_error_code(error: &BackendError, rejected: &'static str) -> &'static str {
    match error {
        BackendError::Unauthorized(_) => rejected,
        BackendError::Status { status, message }
            if *status == 422 || message.to_lowercase().contains("already") =>
        {
            "email_taken"
        }
        BackendError::Status { status, .. } if *status < 500 => rejected,
        _ => "unavailable",
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(user))]
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }
    LoginTemplate {
        flash: Flash::from(&query),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let credentials = match Credentials::from_login(&form.email, &form.password) {
        Ok(credentials) => credentials,
        Err(e) => return redirect_error(LOGIN_PATH, e.code()).into_response(),
    };

    let token = match state.backend().sign_in(&credentials).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            return redirect_error(LOGIN_PATH, provider_error_code(&e, "credentials"))
                .into_response();
        }
    };

    match start_session(&state, &session, token).await {
        Ok(()) => Redirect::to(HOME_PATH).into_response(),
        Err(code) => redirect_error(LOGIN_PATH, code).into_response(),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(user))]
pub async fn register_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }
    RegisterTemplate {
        flash: Flash::from(&query),
    }
    .into_response()
}

/// Handle registration form submission.
///
/// The form is validated before the identity provider is contacted; a
/// mismatched confirmation never reaches it. When the provider asks for email
/// confirmation the user is sent back to login with a notice.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let registration = match Registration::from_form(
        &form.email,
        &form.password,
        &form.password_confirm,
        form.store_name.as_deref(),
    ) {
        Ok(registration) => registration,
        Err(e) => return redirect_error(REGISTER_PATH, e.code()).into_response(),
    };

    let redirect_to = state.config().email_redirect_url();
    match state.backend().sign_up(&registration, &redirect_to).await {
        Ok(None) => {
            tracing::info!("Registration pending email confirmation");
            redirect_success(LOGIN_PATH, "check_email").into_response()
        }
        Ok(Some(token)) => match start_session(&state, &session, token).await {
            Ok(()) => Redirect::to(HOME_PATH).into_response(),
            Err(code) => redirect_error(LOGIN_PATH, code).into_response(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            redirect_error(REGISTER_PATH, provider_error_code(&e, "signup_failed"))
                .into_response()
        }
    }
}

/// Handle the link from the confirmation email.
#[instrument(skip(state, session, query))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(token_hash) = query.token_hash.filter(|hash| !hash.is_empty()) else {
        return redirect_error(LOGIN_PATH, "invalid_link").into_response();
    };
    let kind = query.kind.as_deref().unwrap_or("email");

    let token = match state.backend().verify_email(&token_hash, kind).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(error = %e, "Email confirmation failed");
            return redirect_error(LOGIN_PATH, "invalid_link").into_response();
        }
    };

    match start_session(&state, &session, token).await {
        Ok(()) => Redirect::to(HOME_PATH).into_response(),
        Err(code) => redirect_error(LOGIN_PATH, code).into_response(),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// The provider sign-out is best effort; the local session is always flushed.
#[instrument(skip(state, session, user))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Response {
    if let Some(user) = user {
        if let Err(e) = state.backend().sign_out(&user.access_token).await {
            tracing::warn!(error = %e, "Provider sign-out failed");
        }
    }

    if let Err(e) = session.flush().await {
        tracing::error!(error = %e, "Failed to flush session");
    }
    clear_sentry_user();

    redirect_success(LOGIN_PATH, "logged_out").into_response()
}
