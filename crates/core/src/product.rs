//! Product records and the add/edit product form.
//!
//! Rows come back from the backend in slightly different shapes depending on
//! which client wrote them (`id` or `_id`, `image_url` or `imageUrl`). The
//! serde aliases below fold all of them into one [`Product`].

use serde::{Deserialize, Serialize};

use crate::serde_lenient;
use crate::types::{Category, CategoryError, MoneyError, Peso, ProductId, UserId};

/// A product in the store's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "_id", deserialize_with = "serde_lenient::id")]
    pub id: ProductId,
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub name: String,
    #[serde(default)]
    pub category: Category,
    pub price: Peso,
    #[serde(default, deserialize_with = "serde_lenient::blank_as_none")]
    pub description: Option<String>,
    #[serde(
        default,
        alias = "imageUrl",
        alias = "image",
        deserialize_with = "serde_lenient::blank_as_none"
    )]
    pub image_url: Option<String>,
}

/// Validated product fields, ready to insert or patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDraft {
    pub name: String,
    pub category: Category,
    pub price: Peso,
    pub description: Option<String>,
}

/// Problems with a submitted product form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductFormError {
    #[error("product name is required")]
    MissingName,
    #[error("please select a category")]
    MissingCategory,
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error("invalid price: {0}")]
    Price(#[from] MoneyError),
}

impl ProductFormError {
    /// Short code carried in redirect query strings.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingName => "missing_name",
            Self::MissingCategory | Self::Category(_) => "invalid_category",
            Self::Price(_) => "invalid_price",
        }
    }
}

impl ProductDraft {
    /// Validate raw form values.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductFormError`] for a blank name, a missing or unknown
    /// category, or a price that is blank, malformed or negative.
    pub fn from_form(
        name: &str,
        category: &str,
        price: &str,
        description: Option<&str>,
    ) -> Result<Self, ProductFormError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProductFormError::MissingName);
        }
        if category.trim().is_empty() {
            return Err(ProductFormError::MissingCategory);
        }
        let category = category.parse::<Category>()?;
        let price = price.parse::<Peso>()?;
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);

        Ok(Self {
            name: name.to_string(),
            category,
            price,
            description,
        })
    }
}
