//! Session cart, checkout and the printable receipt.

use reqwest::multipart::Form;
use tindahan_integration_tests::{TestApp, edit_ids, location};

/// Add a product and return its id.
async fn stock(app: &TestApp, name: &str, price: &str) -> i64 {
    let form = Form::new()
        .text("name", name.to_string())
        .text("category", "Canned Goods")
        .text("price", price.to_string());
    let resp = app
        .client
        .post(app.url("/products"))
        .multipart(form)
        .send()
        .await
        .expect("POST request failed");
    assert_eq!(location(&resp), "/products?success=product_added");

    let page = app.get_text(&format!("/products?q={name}")).await;
    edit_ids(&page, "/products")[0]
}

async fn add_to_cart(app: &TestApp, id: i64) {
    let resp = app
        .post_form("/cart/add", &[("product_id", &id.to_string())])
        .await;
    assert_eq!(location(&resp), "/products?success=added_to_cart");
}

#[tokio::test]
async fn test_adding_twice_merges_lines() {
    let app = TestApp::spawn().await;
    app.sign_in("lola@example.com", None).await;
    let tuna = stock(&app, "Tuna", "120").await;

    add_to_cart(&app, tuna).await;
    add_to_cart(&app, tuna).await;

    let cart = app.get_text("/cart").await;
    assert!(cart.contains("Tuna"));
    assert!(cart.contains("Total: ₱240.00"));
    assert!(cart.contains("2 item(s)"));

    let catalog = app.get_text("/products").await;
    assert!(catalog.contains("Add to Cart (2)"));
}

#[tokio::test]
async fn test_checkout_prints_and_empties_cart() {
    let app = TestApp::spawn().await;
    app.sign_in("lola@example.com", None).await;
    let tuna = stock(&app, "Tuna", "120").await;
    add_to_cart(&app, tuna).await;
    add_to_cart(&app, tuna).await;

    let resp = app.post_form("/cart/checkout", &[]).await;
    assert_eq!(location(&resp), "/cart/receipt?last=1");

    let receipt = app.get_text("/cart/receipt?last=1").await;
    assert!(receipt.contains("TINDAHAN NI LOLA"));
    assert!(receipt.contains("Tuna x2 ₱240.00"));
    assert!(receipt.contains("TOTAL: ₱240.00"));
    assert!(receipt.contains("window.print()"));

    let cart = app.get_text("/cart").await;
    assert!(cart.contains("Your cart is empty."));

    // Reprinting the last receipt still works after the cart is gone.
    let again = app.get_text("/cart/receipt?last=1").await;
    assert!(again.contains("Tuna x2 ₱240.00"));
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let app = TestApp::spawn().await;
    app.sign_in("lola@example.com", None).await;

    let resp = app.post_form("/cart/checkout", &[]).await;
    assert_eq!(location(&resp), "/cart?error=empty_cart");

    let resp = app.get("/cart/receipt").await;
    assert_eq!(location(&resp), "/cart?error=empty_cart");

    let resp = app.get("/cart/receipt?last=1").await;
    assert_eq!(location(&resp), "/cart?error=no_receipt");
}

#[tokio::test]
async fn test_quantity_changes() {
    let app = TestApp::spawn().await;
    app.sign_in("lola@example.com", None).await;
    let tuna = stock(&app, "Tuna", "120").await;
    let coke = stock(&app, "Coke", "20").await;
    add_to_cart(&app, tuna).await;
    add_to_cart(&app, coke).await;

    let tuna_id = tuna.to_string();
    let resp = app
        .post_form("/cart/update", &[("product_id", &tuna_id), ("quantity", "3")])
        .await;
    assert_eq!(location(&resp), "/cart");
    assert!(app.get_text("/cart").await.contains("Total: ₱380.00"));

    app.post_form("/cart/decrement", &[("product_id", &tuna_id)])
        .await;
    assert!(app.get_text("/cart").await.contains("Total: ₱260.00"));

    app.post_form("/cart/remove", &[("product_id", &coke.to_string())])
        .await;
    let cart = app.get_text("/cart").await;
    assert!(cart.contains("Total: ₱240.00"));
    assert!(!cart.contains("Coke"));

    let resp = app.post_form("/cart/clear", &[]).await;
    assert_eq!(location(&resp), "/cart?success=cart_cleared");
    assert!(app.get_text("/cart").await.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_adding_missing_product() {
    let app = TestApp::spawn().await;
    app.sign_in("lola@example.com", None).await;
    let resp = app.post_form("/cart/add", &[("product_id", "999")]).await;
    assert_eq!(location(&resp), "/products?error=not_found");
}
