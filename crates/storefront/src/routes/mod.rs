//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Landing page
//! GET  /health                    - Health check
//! GET  /health/ready              - Readiness check
//!
//! # Auth
//! GET  /auth/login                - Login page
//! POST /auth/login                - Login action
//! GET  /auth/register             - Register page
//! POST /auth/register             - Register action
//! GET  /auth/callback             - Email confirmation link
//! POST /auth/logout               - Logout action
//!
//! # Products (requires auth)
//! GET  /products                  - Catalog (?q, ?category, ?sort)
//! GET  /products/new              - Add form
//! POST /products                  - Create (multipart)
//! GET  /products/{id}/edit        - Edit form
//! POST /products/{id}             - Update (multipart)
//! POST /products/{id}/delete      - Delete
//!
//! # Cart (requires auth, session-held)
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add a product
//! POST /cart/decrement            - One fewer
//! POST /cart/update               - Set quantity (0 removes)
//! POST /cart/remove               - Remove line
//! POST /cart/clear                - Empty the cart
//! POST /cart/checkout             - Snapshot receipt and empty the cart
//! GET  /cart/receipt              - Printable receipt (?last=1)
//!
//! # Liabilities (requires auth)
//! GET  /liabilities               - Grouped by debtor (?q)
//! GET  /liabilities/new           - Add form
//! POST /liabilities               - Create
//! GET  /liabilities/{id}/edit     - Edit form
//! POST /liabilities/{id}          - Update
//! POST /liabilities/{id}/paid     - Mark paid
//! POST /liabilities/{id}/delete   - Delete
//! ```
//!
//! Form handlers redirect back with `?error=<code>` or `?success=<code>`;
//! [`Flash`] turns those codes into the message shown on the page.

pub mod auth;
pub mod cart;
pub mod home;
pub mod liabilities;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;

use crate::models::CurrentUser;
use crate::state::AppState;

/// Largest accepted product form, image included.
const PRODUCT_FORM_LIMIT_BYTES: usize = 5 * 1024 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new_form))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit_form))
        .route("/{id}/delete", post(products::delete))
        .layer(DefaultBodyLimit::max(PRODUCT_FORM_LIMIT_BYTES))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/decrement", post(cart::decrement))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/checkout", post(cart::checkout))
        .route("/receipt", get(cart::receipt))
}

/// Create the liability routes router.
pub fn liability_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(liabilities::index).post(liabilities::create))
        .route("/new", get(liabilities::new_form))
        .route("/{id}", post(liabilities::update))
        .route("/{id}/edit", get(liabilities::edit_form))
        .route("/{id}/paid", post(liabilities::mark_paid))
        .route("/{id}/delete", post(liabilities::delete))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/liabilities", liability_routes())
}

// =============================================================================
// Shared page pieces
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Messages decoded from a redirect's query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flash {
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

impl Flash {
    #[must_use]
    pub fn from_codes(error: Option<&str>, success: Option<&str>) -> Self {
        Self {
            error: error.map(error_message),
            success: success.and_then(success_message),
        }
    }
}

impl From<&MessageQuery> for Flash {
    fn from(query: &MessageQuery) -> Self {
        Self::from_codes(query.error.as_deref(), query.success.as_deref())
    }
}

/// Message for an `?error=` code. Unknown codes get a generic message.
#[must_use]
pub fn error_message(code: &str) -> &'static str {
    match code {
        "invalid_email" => "Please enter a valid email address.",
        "missing_password" => "Please enter your password.",
        "password_mismatch" => "Passwords do not match",
        "store_name_too_long" => "Store name is too long.",
        "credentials" => "Invalid email or password.",
        "email_taken" => "An account with this email already exists.",
        "signup_failed" => "Sign up failed. Please try again.",
        "invalid_link" => "Invalid or expired link.",
        "session" => "Could not start your session. Please sign in again.",
        "unavailable" => "The store service is unavailable. Please try again later.",
        "missing_name" => "Product name is required.",
        "invalid_category" => "Please select a category.",
        "invalid_price" => "Please enter a valid price (0 up to 1,000,000,000,000).",
        "invalid_form" => "The form could not be read. Please try again.",
        "upload_failed" => "Image upload failed. Please try again.",
        "missing_debtor" => "Please enter who owes the amount.",
        "invalid_amount" => "Please enter a valid amount (0 up to 1,000,000,000,000).",
        "invalid_due_date" => "Please enter the due date as YYYY-MM-DD.",
        "not_found" => "That item no longer exists.",
        "empty_cart" => "Your cart is empty.",
        "no_receipt" => "There is no receipt to print yet.",
        "load_failed" => "Could not load your records. Please refresh the page.",
        "save_failed" => "Could not save your changes. Please try again.",
        "delete_failed" => "Could not delete. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Message for a `?success=` code. Unknown codes show nothing.
#[must_use]
pub fn success_message(code: &str) -> Option<&'static str> {
    let message = match code {
        "check_email" => "Check your email to verify your account.",
        "logged_out" => "You have been signed out.",
        "product_added" => "Product added.",
        "product_updated" => "Product updated.",
        "product_deleted" => "Product deleted.",
        "added_to_cart" => "Added to cart.",
        "cart_cleared" => "Cart cleared.",
        "liability_added" => "Liability added.",
        "liability_updated" => "Liability updated.",
        "liability_paid" => "Marked as paid.",
        "liability_deleted" => "Liability deleted.",
        _ => return None,
    };
    Some(message)
}

/// Redirect to `path` carrying an `?error=` code.
#[must_use]
pub fn redirect_error(path: &str, code: &str) -> Redirect {
    Redirect::to(&format!("{path}?error={code}"))
}

/// Redirect to `path` carrying a `?success=` code.
#[must_use]
pub fn redirect_success(path: &str, code: &str) -> Redirect {
    Redirect::to(&format!("{path}?success={code}"))
}

/// Header, tabs and footer data shared by every signed-in page.
#[derive(Debug, Clone)]
pub struct Chrome {
    /// Store name, or the owner's email when none was given.
    pub store_name: String,
    pub subtitle: &'static str,
    /// `products` or `liabilities`.
    pub active_tab: &'static str,
    /// Show the "View Cart" button (catalog page only).
    pub show_cart: bool,
    /// Distinct cart lines, for the badge.
    pub cart_count: usize,
}

impl Chrome {
    /// Chrome for the catalog page, with the cart button.
    #[must_use]
    pub fn products(user: &CurrentUser, cart_count: usize) -> Self {
        Self {
            show_cart: true,
            cart_count,
            ..Self::products_plain(user)
        }
    }

    /// Chrome for the product forms and the cart itself.
    #[must_use]
    pub fn products_plain(user: &CurrentUser) -> Self {
        Self {
            store_name: user.display_name().to_string(),
            subtitle: "Manage your product inventory",
            active_tab: "products",
            show_cart: false,
            cart_count: 0,
        }
    }

    /// Chrome for the liability pages.
    #[must_use]
    pub fn liabilities(user: &CurrentUser) -> Self {
        Self {
            store_name: user.display_name().to_string(),
            subtitle: "Track your store liabilities",
            active_tab: "liabilities",
            show_cart: false,
            cart_count: 0,
        }
    }
}

/// One `<option>` in a `<select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    #[must_use]
    pub fn new(value: &str, label: &str, selected: bool) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected,
        }
    }
}
