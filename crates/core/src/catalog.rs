//! Catalog search, category filter and sorting.

use std::cmp::Ordering;

use crate::product::Product;
use crate::types::Category;

/// Which categories to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Parse the `category` query parameter. Blank, `All` and unknown values
    /// show everything.
    #[must_use]
    pub fn from_query(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse::<Category>().ok())
            .map_or(Self::All, Self::Only)
    }

    /// Value to put back into the query string.
    #[must_use]
    pub const fn query_value(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(category) => category.label(),
        }
    }

    #[must_use]
    pub fn matches(self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

/// Catalog ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    pub const ALL: [Self; 4] = [
        Self::NameAsc,
        Self::NameDesc,
        Self::PriceAsc,
        Self::PriceDesc,
    ];

    /// Parse the `sort` query parameter; unknown values fall back to name.
    #[must_use]
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("name_desc") => Self::NameDesc,
            Some("price") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            _ => Self::NameAsc,
        }
    }

    #[must_use]
    pub const fn query_value(self) -> &'static str {
        match self {
            Self::NameAsc => "name",
            Self::NameDesc => "name_desc",
            Self::PriceAsc => "price",
            Self::PriceDesc => "price_desc",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NameAsc => "Name (A-Z)",
            Self::NameDesc => "Name (Z-A)",
            Self::PriceAsc => "Price (low to high)",
            Self::PriceDesc => "Price (high to low)",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        let by_name = || a.name.to_lowercase().cmp(&b.name.to_lowercase());
        let ordering = match self {
            Self::NameAsc => by_name(),
            Self::NameDesc => by_name().reverse(),
            Self::PriceAsc => a.price.cmp(&b.price).then_with(by_name),
            Self::PriceDesc => b.price.cmp(&a.price).then_with(by_name),
        };
        ordering.then_with(|| a.id.cmp(&b.id))
    }
}

/// Search text, category and ordering for the product list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: String,
    pub category: CategoryFilter,
    pub sort: SortOrder,
}

impl CatalogQuery {
    /// Name contains the search text (case-insensitive) and the category
    /// passes the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let needle = self.search.trim().to_lowercase();
        let name_match = needle.is_empty() || product.name.to_lowercase().contains(&needle);
        name_match && self.category.matches(product.category)
    }

    /// Filter then sort.
    #[must_use]
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        let mut shown: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();
        shown.sort_by(|a, b| self.sort.compare(a, b));
        shown
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    fn product(id: i64, name: &str, category: Category, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            user_id: None,
            name: name.to_string(),
            category,
            price: price.parse().unwrap(),
            description: None,
            image_url: None,
        }
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    fn shelf() -> Vec<Product> {
        vec![
            product(1, "Coke Mismo", Category::Drinks, "20"),
            product(2, "century tuna", Category::CannedGoods, "38"),
            product(3, "Argentina Corned Beef", Category::CannedGoods, "45"),
            product(4, "Royal", Category::Drinks, "20"),
        ]
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let query = CatalogQuery {
            search: "TUNA".to_string(),
            ..CatalogQuery::default()
        };
        assert_eq!(names(&query.apply(shelf())), ["century tuna"]);
    }

    #[test]
    fn test_category_filter_is_exact() {
        let query = CatalogQuery {
            category: CategoryFilter::Only(Category::CannedGoods),
            ..CatalogQuery::default()
        };
        assert_eq!(
            names(&query.apply(shelf())),
            ["Argentina Corned Beef", "century tuna"]
        );
    }

    #[test]
    fn test_sort_orders() {
        let mut query = CatalogQuery::default();
        assert_eq!(
            names(&query.apply(shelf())),
            ["Argentina Corned Beef", "century tuna", "Coke Mismo", "Royal"]
        );

        query.sort = SortOrder::NameDesc;
        assert_eq!(names(&query.apply(shelf()))[0], "Royal");

        query.sort = SortOrder::PriceAsc;
        assert_eq!(
            names(&query.apply(shelf())),
            ["Coke Mismo", "Royal", "century tuna", "Argentina Corned Beef"]
        );

        query.sort = SortOrder::PriceDesc;
        assert_eq!(
            names(&query.apply(shelf())),
            ["Argentina Corned Beef", "century tuna", "Coke Mismo", "Royal"]
        );
    }

    #[test]
    fn test_query_parsing_falls_back() {
        assert_eq!(CategoryFilter::from_query(Some("All")), CategoryFilter::All);
        assert_eq!(CategoryFilter::from_query(Some("Bread")), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from_query(Some("Rice")),
            CategoryFilter::Only(Category::Rice)
        );
        assert_eq!(SortOrder::from_query(Some("bogus")), SortOrder::NameAsc);
        for order in SortOrder::ALL {
            assert_eq!(SortOrder::from_query(Some(order.query_value())), order);
        }
    }
}
