//! Product catalog: add with image, search, filter, edit and delete.

use reqwest::multipart::{Form, Part};
use tindahan_integration_tests::{TestApp, edit_ids, location};

fn product_form(name: &str, category: &str, price: &str) -> Form {
    Form::new()
        .text("name", name.to_string())
        .text("category", category.to_string())
        .text("price", price.to_string())
        .text("description", String::new())
}

async fn add_product(app: &TestApp, form: Form) -> String {
    let resp = app
        .client
        .post(app.url("/products"))
        .multipart(form)
        .send()
        .await
        .expect("POST request failed");
    location(&resp)
}

#[tokio::test]
async fn test_add_product_with_image() {
    let app = TestApp::spawn().await;
    app.sign_in("lola@example.com", None).await;

    let image = Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
        .file_name("tuna.jpg")
        .mime_str("image/jpeg")
        .expect("valid mime type");
    let form = product_form("Century Tuna", "Canned Goods", "38.50").part("image", image);
    assert_eq!(add_product(&app, form).await, "/products?success=product_added");

    let page = app.get_text("/products?success=product_added").await;
    assert!(page.contains("Product added."));
    assert!(page.contains("Century Tuna"));
    assert!(page.contains("₱38.50"));
    assert!(page.contains("data:image/jpeg;base64,"));

    let objects = app.backend.object_names().await;
    assert_eq!(objects.len(), 1);
    assert!(objects[0].ends_with(".jpg"));
}

#[tokio::test]
async fn test_product_without_image_uses_placeholder() {
    let app = TestApp::spawn().await;
    app.sign_in("lola@example.com", None).await;

    let empty = Part::bytes(Vec::new())
        .file_name("")
        .mime_str("application/octet-stream")
        .expect("valid mime type");
    let form = product_form("Piattos", "Snacks", "20").part("image", empty);
    assert_eq!(add_product(&app, form).await, "/products?success=product_added");

    let page = app.get_text("/products").await;
    assert!(page.contains("/static/images/no-image.svg"));
    assert!(app.backend.object_names().await.is_empty());
}

#[tokio::test]
async fn test_invalid_products_are_rejected() {
    let app = TestApp::spawn().await;
    app.sign_in("lola@example.com", None).await;

    let form = product_form("  ", "Snacks", "20");
    assert_eq!(add_product(&app, form).await, "/products/new?error=missing_name");

    let form = product_form("Piattos", "", "20");
    assert_eq!(add_product(&app, form).await, "/products/new?error=invalid_category");

    let form = product_form("Piattos", "Snacks", "-1");
    assert_eq!(add_product(&app, form).await, "/products/new?error=invalid_price");

    let form = product_form("Piattos", "Snacks", "79228162514264337593543950335");
    assert_eq!(add_product(&app, form).await, "/products/new?error=invalid_price");

    let page = app.get_text("/products").await;
    assert!(page.contains("No products yet."));
}

#[tokio::test]
async fn test_search_filter_and_sort() {
    let app = TestApp::spawn().await;
    app.sign_in("lola@example.com", None).await;
    for (name, category, price) in [
        ("Coke Mismo", "Drinks", "20"),
        ("Century Tuna", "Canned Goods", "38"),
        ("Argentina Corned Beef", "Canned Goods", "45"),
    ] {
        add_product(&app, product_form(name, category, price)).await;
    }

    let page = app.get_text("/products?q=tuna").await;
    assert!(page.contains("Century Tuna"));
    assert!(!page.contains("Coke Mismo"));

    let page = app.get_text("/products?category=Canned%20Goods").await;
    assert!(page.contains("Century Tuna"));
    assert!(page.contains("Argentina Corned Beef"));
    assert!(!page.contains("Coke Mismo"));

    let page = app.get_text("/products?sort=price_desc").await;
    let corned = page.find("Argentina Corned Beef").expect("listed");
    let coke = page.find("Coke Mismo").expect("listed");
    assert!(corned < coke);

    let page = app.get_text("/products?q=sardines").await;
    assert!(page.contains("No products match your search."));
}

#[tokio::test]
async fn test_edit_and_delete_product() {
    let app = TestApp::spawn().await;
    app.sign_in("lola@example.com", None).await;
    add_product(&app, product_form("Kopiko", "Coffee and Sugar", "8")).await;

    let page = app.get_text("/products").await;
    let id = edit_ids(&page, "/products")[0];

    let form_page = app.get_text(&format!("/products/{id}/edit")).await;
    assert!(form_page.contains("Kopiko"));

    let resp = app
        .client
        .post(app.url(&format!("/products/{id}")))
        .multipart(product_form("Kopiko Brown", "Coffee and Sugar", "9"))
        .send()
        .await
        .expect("POST request failed");
    assert_eq!(location(&resp), "/products?success=product_updated");

    let page = app.get_text("/products").await;
    assert!(page.contains("Kopiko Brown"));
    assert!(page.contains("₱9.00"));

    let resp = app
        .post_form(&format!("/products/{id}/delete"), &[])
        .await;
    assert_eq!(location(&resp), "/products?success=product_deleted");
    let page = app.get_text("/products").await;
    assert!(!page.contains("Kopiko Brown"));
}

#[tokio::test]
async fn test_products_are_private_to_each_store() {
    let app = TestApp::spawn().await;
    app.sign_in("lola@example.com", None).await;
    add_product(&app, product_form("Kopiko", "Coffee and Sugar", "8")).await;
    let id = edit_ids(&app.get_text("/products").await, "/products")[0];

    let other = TestApp {
        base_url: app.base_url.clone(),
        client: app.fresh_client(),
        backend: app.backend.clone(),
    };
    other.sign_in("other@example.com", None).await;

    let page = other.get_text("/products").await;
    assert!(!page.contains("Kopiko"));

    let resp = other.get(&format!("/products/{id}/edit")).await;
    assert_eq!(location(&resp), "/products?error=not_found");
}
