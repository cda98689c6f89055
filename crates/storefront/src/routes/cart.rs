//! Cart route handlers.
//!
//! The cart lives in the session as a [`Cart`] value and never reaches the
//! backend. Checkout snapshots it into a [`Receipt`], empties it and opens the
//! print page for that snapshot.

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

use tindahan_core::ProductId;
use tindahan_core::cart::Cart;
use tindahan_core::receipt::{Receipt, ReceiptLine, STORE_TITLE};

use super::products::NO_IMAGE_PATH;
use super::{Chrome, Flash, MessageQuery, redirect_error, redirect_success};
use crate::db::ProductRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::models::session_keys;
use crate::state::AppState;

const CART_PATH: &str = "/cart";
const PRODUCTS_PATH: &str = "/products";

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart from the session. A missing or unreadable cart is empty.
pub async fn load_cart(session: &Session) -> Cart {
    match session.get::<Cart>(session_keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable cart");
            Cart::new()
        }
    }
}

/// Store the cart in the session.
async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Apply `change` to the session cart and save it.
async fn modify_cart(
    session: &Session,
    change: impl FnOnce(&mut Cart),
) -> Result<(), AppError> {
    let mut cart = load_cart(session).await;
    change(&mut cart);
    save_cart(session, &cart).await?;
    Ok(())
}

// =============================================================================
// Forms and views
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i64,
    pub quantity: Option<u32>,
}

/// Form naming one cart line.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub product_id: i64,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i64,
    pub quantity: u32,
}

/// Receipt page query parameters.
#[derive(Debug, Deserialize)]
pub struct ReceiptQuery {
    /// Print the snapshot taken at the last checkout instead of the live cart.
    pub last: Option<String>,
}

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: i64,
    pub name: String,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
    pub image_url: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub chrome: Chrome,
    pub flash: Flash,
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub item_count: u32,
}

/// Printable receipt page.
#[derive(Template, WebTemplate)]
#[template(path = "cart/receipt.html")]
pub struct ReceiptTemplate {
    pub store_title: &'static str,
    pub printed_at: String,
    pub lines: Vec<String>,
    pub total_line: String,
    /// Fixed-width text for narrow printers.
    pub text: String,
    pub nonce: String,
}

impl ReceiptTemplate {
    fn new(receipt: &Receipt, nonce: String) -> Self {
        Self {
            store_title: STORE_TITLE,
            printed_at: receipt.printed_at_display(),
            lines: receipt.lines.iter().map(ReceiptLine::text).collect(),
            total_line: receipt.total_line(),
            text: receipt.render_text(),
            nonce,
        }
    }
}

/// The store's wall clock; receipts show local time.
fn now_local() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart.
#[instrument(skip(session, user))]
pub async fn show(
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    let cart = load_cart(&session).await;
    let lines = cart
        .lines()
        .iter()
        .map(|line| CartLineView {
            product_id: line.product_id.as_i64(),
            name: line.name.clone(),
            unit_price: line.unit_price.to_string(),
            quantity: line.quantity,
            line_total: line.line_total().to_string(),
            image_url: line
                .image_url
                .clone()
                .unwrap_or_else(|| NO_IMAGE_PATH.to_string()),
        })
        .collect();

    CartShowTemplate {
        chrome: Chrome::products_plain(&user),
        flash: Flash::from(&query),
        lines,
        total: cart.total().to_string(),
        item_count: cart.item_count(),
    }
}

/// Add a product to the cart.
///
/// The product is read back from the backend so the line snapshots the
/// stored name and price.
#[instrument(skip(state, session, user))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect, AppError> {
    let product = match ProductRepository::new(state.backend(), &user)
        .get(ProductId::new(form.product_id))
        .await
    {
        Ok(Some(product)) => product,
        Ok(None) => return Ok(redirect_error(PRODUCTS_PATH, "not_found")),
        Err(e) => {
            tracing::error!(error = %e, product_id = form.product_id, "Failed to load product");
            return Ok(redirect_error(PRODUCTS_PATH, "load_failed"));
        }
    };

    let quantity = form.quantity.unwrap_or(1);
    modify_cart(&session, |cart| cart.add(&product, quantity)).await?;
    Ok(redirect_success(PRODUCTS_PATH, "added_to_cart"))
}

/// Remove one unit; the line disappears at zero.
#[instrument(skip(session, _user))]
pub async fn decrement(
    session: Session,
    RequireAuth(_user): RequireAuth,
    Form(form): Form<LineForm>,
) -> Result<Redirect, AppError> {
    modify_cart(&session, |cart| {
        cart.decrement(ProductId::new(form.product_id));
    })
    .await?;
    Ok(Redirect::to(CART_PATH))
}

/// Set a line's quantity; `0` removes it.
#[instrument(skip(session, _user))]
pub async fn update(
    session: Session,
    RequireAuth(_user): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect, AppError> {
    modify_cart(&session, |cart| {
        cart.set_quantity(ProductId::new(form.product_id), form.quantity);
    })
    .await?;
    Ok(Redirect::to(CART_PATH))
}

/// Drop a line entirely.
#[instrument(skip(session, _user))]
pub async fn remove(
    session: Session,
    RequireAuth(_user): RequireAuth,
    Form(form): Form<LineForm>,
) -> Result<Redirect, AppError> {
    modify_cart(&session, |cart| {
        cart.remove(ProductId::new(form.product_id));
    })
    .await?;
    Ok(Redirect::to(CART_PATH))
}

/// Empty the cart.
#[instrument(skip(session, _user))]
pub async fn clear(
    session: Session,
    RequireAuth(_user): RequireAuth,
) -> Result<Redirect, AppError> {
    modify_cart(&session, Cart::reset).await?;
    Ok(redirect_success(CART_PATH, "cart_cleared"))
}

/// Snapshot the cart into a receipt, empty it and open the print page.
#[instrument(skip(session, _user))]
pub async fn checkout(
    session: Session,
    RequireAuth(_user): RequireAuth,
) -> Result<Redirect, AppError> {
    let mut cart = load_cart(&session).await;
    if cart.is_empty() {
        return Ok(redirect_error(CART_PATH, "empty_cart"));
    }

    let receipt = Receipt::from_cart(&cart, now_local());
    session.insert(session_keys::LAST_RECEIPT, &receipt).await?;
    cart.reset();
    save_cart(&session, &cart).await?;

    tracing::info!(
        lines = receipt.lines.len(),
        total = %receipt.total,
        "Checkout completed"
    );
    Ok(Redirect::to("/cart/receipt?last=1"))
}

/// Printable receipt: the last checkout with `?last=1`, otherwise a preview
/// of the live cart.
#[instrument(skip(session, _user, nonce))]
pub async fn receipt(
    session: Session,
    RequireAuth(_user): RequireAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<ReceiptQuery>,
) -> Result<Response, AppError> {
    let receipt = if query.last.is_some() {
        match session.get::<Receipt>(session_keys::LAST_RECEIPT).await? {
            Some(receipt) => receipt,
            None => return Ok(redirect_error(CART_PATH, "no_receipt").into_response()),
        }
    } else {
        let cart = load_cart(&session).await;
        if cart.is_empty() {
            return Ok(redirect_error(CART_PATH, "empty_cart").into_response());
        }
        Receipt::from_cart(&cart, now_local())
    };

    Ok(ReceiptTemplate::new(&receipt, nonce).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tindahan_core::product::Product;
    use tindahan_core::{Category, Peso};

    #[test]
    fn test_receipt_template_lines() {
        let tuna = Product {
            id: ProductId::new(1),
            user_id: None,
            name: "Tuna".to_string(),
            category: Category::CannedGoods,
            price: "120".parse::<Peso>().unwrap(),
            description: None,
            image_url: None,
        };
        let mut cart = Cart::new();
        cart.add(&tuna, 2);
        let printed_at = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();

        let page = ReceiptTemplate::new(&Receipt::from_cart(&cart, printed_at), "n0nce".into());
        assert_eq!(page.lines, ["Tuna x2 ₱240.00"]);
        assert_eq!(page.total_line, "TOTAL: ₱240.00");
        assert_eq!(page.printed_at, "2025-06-01 09:30");
        assert!(page.text.starts_with("TINDAHAN NI LOLA\n"));
    }
}
