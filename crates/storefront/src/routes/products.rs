//! Product route handlers.
//!
//! The catalog page lists the signed-in owner's products with search, a
//! category filter and sorting. Add and edit forms are multipart so an image
//! can ride along; the image goes to object storage first and its public URL
//! is saved on the product.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use tindahan_core::catalog::{CatalogQuery, CategoryFilter, SortOrder};
use tindahan_core::product::{Product, ProductDraft};
use tindahan_core::{Category, ProductId};

use super::cart::load_cart;
use super::{Chrome, Flash, SelectOption, redirect_error, redirect_success};
use crate::db::{ProductRepository, RepositoryError};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Shown when a product has no image.
pub const NO_IMAGE_PATH: &str = "/static/images/no-image.svg";

const INDEX_PATH: &str = "/products";
const NEW_PATH: &str = "/products/new";

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub category: &'static str,
    pub price: String,
    pub description: Option<String>,
    pub image_url: String,
    /// Quantity of this product already in the cart.
    pub in_cart: u32,
}

impl ProductView {
    fn new(product: Product, in_cart: u32) -> Self {
        Self {
            id: product.id.as_i64(),
            category: product.category.label(),
            price: product.price.to_string(),
            image_url: product
                .image_url
                .unwrap_or_else(|| NO_IMAGE_PATH.to_string()),
            name: product.name,
            description: product.description,
            in_cart,
        }
    }
}

/// Catalog query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl CatalogParams {
    fn catalog_query(&self) -> CatalogQuery {
        CatalogQuery {
            search: self.q.clone().unwrap_or_default(),
            category: CategoryFilter::from_query(self.category.as_deref()),
            sort: SortOrder::from_query(self.sort.as_deref()),
        }
    }
}

/// Form-page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct FormParams {
    pub error: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub chrome: Chrome,
    pub flash: Flash,
    pub products: Vec<ProductView>,
    /// Products before filtering, to tell "none yet" from "no matches".
    pub total_products: usize,
    pub search: String,
    pub categories: Vec<SelectOption>,
    pub sorts: Vec<SelectOption>,
}

/// Add/edit product form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub chrome: Chrome,
    pub flash: Flash,
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub name: String,
    pub price: String,
    pub description: String,
    pub image_url: Option<String>,
    pub categories: Vec<SelectOption>,
}

/// Category `<option>`s for the filter bar.
fn filter_options(current: CategoryFilter) -> Vec<SelectOption> {
    std::iter::once(SelectOption::new(
        CategoryFilter::All.query_value(),
        "All Categories",
        current == CategoryFilter::All,
    ))
    .chain(Category::ALL.iter().map(|category| {
        SelectOption::new(
            category.label(),
            category.label(),
            current == CategoryFilter::Only(*category),
        )
    }))
    .collect()
}

/// Sort `<option>`s for the filter bar.
fn sort_options(current: SortOrder) -> Vec<SelectOption> {
    SortOrder::ALL
        .iter()
        .map(|sort| SelectOption::new(sort.query_value(), sort.label(), *sort == current))
        .collect()
}

/// Category `<option>`s for the add/edit form.
fn form_category_options(current: Option<Category>) -> Vec<SelectOption> {
    std::iter::once(SelectOption::new("", "Select a category", current.is_none()))
        .chain(Category::ALL.iter().map(|category| {
            SelectOption::new(category.label(), category.label(), current == Some(*category))
        }))
        .collect()
}

/// Display the catalog.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(params): Query<CatalogParams>,
) -> impl IntoResponse {
    let cart = load_cart(&session).await;
    let query = params.catalog_query();

    let mut error = params.error.clone();
    let products = match ProductRepository::new(state.backend(), &user).list().await {
        Ok(products) => products,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load products");
            error = Some("load_failed".to_string());
            Vec::new()
        }
    };
    let total_products = products.len();

    let products = query
        .apply(products)
        .into_iter()
        .map(|product| {
            let in_cart = cart.quantity_of(product.id);
            ProductView::new(product, in_cart)
        })
        .collect();

    ProductsIndexTemplate {
        chrome: Chrome::products(&user, cart.line_count()),
        flash: Flash::from_codes(error.as_deref(), params.success.as_deref()),
        products,
        total_products,
        categories: filter_options(query.category),
        sorts: sort_options(query.sort),
        search: query.search,
    }
}

/// Display the add product form.
#[instrument(skip(user))]
pub async fn new_form(
    RequireAuth(user): RequireAuth,
    Query(params): Query<FormParams>,
) -> impl IntoResponse {
    ProductFormTemplate {
        chrome: Chrome::products_plain(&user),
        flash: Flash::from_codes(params.error.as_deref(), None),
        heading: "Add New Product",
        action: INDEX_PATH.to_string(),
        submit_label: "Add Product",
        name: String::new(),
        price: String::new(),
        description: String::new(),
        image_url: None,
        categories: form_category_options(None),
    }
}

/// Display the edit product form.
#[instrument(skip(state, user))]
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
    Query(params): Query<FormParams>,
) -> Response {
    let product = match ProductRepository::new(state.backend(), &user)
        .get(ProductId::new(id))
        .await
    {
        Ok(Some(product)) => product,
        Ok(None) => return redirect_error(INDEX_PATH, "not_found").into_response(),
        Err(e) => {
            tracing::error!(error = %e, product_id = id, "Failed to load product");
            return redirect_error(INDEX_PATH, "load_failed").into_response();
        }
    };

    ProductFormTemplate {
        chrome: Chrome::products_plain(&user),
        flash: Flash::from_codes(params.error.as_deref(), None),
        heading: "Edit Product",
        action: format!("/products/{id}"),
        submit_label: "Save Changes",
        name: product.name,
        price: product.price.plain(),
        description: product.description.unwrap_or_default(),
        image_url: product.image_url,
        categories: form_category_options(Some(product.category)),
    }
    .into_response()
}

// =============================================================================
// Multipart form
// =============================================================================

/// An uploaded image file.
#[derive(Debug)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Raw add/edit product form fields.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: String,
    pub category: String,
    pub price: String,
    pub description: Option<String>,
    /// `None` when no file was chosen.
    pub image: Option<ImageFile>,
}

impl ProductForm {
    /// Read every field of a multipart submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid multipart data.
    pub async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(String::from) else {
                continue;
            };
            match name.as_str() {
                "name" => form.name = field.text().await?,
                "category" => form.category = field.text().await?,
                "price" => form.price = field.text().await?,
                "description" => form.description = Some(field.text().await?),
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part when no file was picked.
                    if !bytes.is_empty() && !file_name.is_empty() {
                        form.image = Some(ImageFile {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(form)
    }

    fn draft(&self) -> Result<ProductDraft, &'static str> {
        ProductDraft::from_form(
            &self.name,
            &self.category,
            &self.price,
            self.description.as_deref(),
        )
        .map_err(|e| e.code())
    }
}

/// Validate the form and upload its image, if any.
///
/// Returns the draft and the new image URL, or the redirect error code.
async fn prepare(
    repo: &ProductRepository<'_>,
    multipart: Multipart,
) -> Result<(ProductDraft, Option<String>), &'static str> {
    let form = ProductForm::read(multipart).await.map_err(|e| {
        tracing::warn!(error = %e, "Unreadable product form");
        "invalid_form"
    })?;
    let draft = form.draft()?;

    let image_url = match form.image {
        Some(image) => Some(
            repo.upload_image(&image.file_name, &image.content_type, image.bytes)
                .await
                .map_err(|e| {
                    tracing::warn!(error = %e, "Product image upload failed");
                    "upload_failed"
                })?,
        ),
        None => None,
    };
    Ok((draft, image_url))
}

/// Handle the add product form.
#[instrument(skip(state, user, multipart))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Redirect {
    let repo = ProductRepository::new(state.backend(), &user);
    let (draft, image_url) = match prepare(&repo, multipart).await {
        Ok(prepared) => prepared,
        Err(code) => return redirect_error(NEW_PATH, code),
    };

    match repo.create(&draft, image_url).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product added");
            redirect_success(INDEX_PATH, "product_added")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to add product");
            redirect_error(NEW_PATH, "save_failed")
        }
    }
}

/// Handle the edit product form. An empty image input keeps the old image.
#[instrument(skip(state, user, multipart))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Redirect {
    let edit_path = format!("/products/{id}/edit");
    let repo = ProductRepository::new(state.backend(), &user);
    let (draft, image_url) = match prepare(&repo, multipart).await {
        Ok(prepared) => prepared,
        Err(code) => return redirect_error(&edit_path, code),
    };

    match repo.update(ProductId::new(id), &draft, image_url).await {
        Ok(_) => redirect_success(INDEX_PATH, "product_updated"),
        Err(RepositoryError::NotFound) => redirect_error(INDEX_PATH, "not_found"),
        Err(e) => {
            tracing::error!(error = %e, product_id = id, "Failed to update product");
            redirect_error(&edit_path, "save_failed")
        }
    }
}

/// Delete a product.
#[instrument(skip(state, user))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
) -> Redirect {
    match ProductRepository::new(state.backend(), &user)
        .delete(ProductId::new(id))
        .await
    {
        Ok(()) => redirect_success(INDEX_PATH, "product_deleted"),
        Err(e) => {
            tracing::error!(error = %e, product_id = id, "Failed to delete product");
            redirect_error(INDEX_PATH, "delete_failed")
        }
    }
}
