//! Session cart aggregation.
//!
//! The cart is a plain value owned by the caller (the storefront keeps it in
//! the visitor's session). Every operation is a single pass over the lines and
//! totals are recomputed on each call.

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::{Peso, ProductId};

/// One product/quantity pairing.
///
/// Name, price and image are copied from the product when it is first added,
/// so later catalog edits do not change what is already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Peso,
    pub image_url: Option<String>,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Peso {
        self.unit_price * self.quantity
    }
}

/// Lines waiting for checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add `quantity` of `product`.
    ///
    /// An existing line for the same product id grows by `quantity`;
    /// otherwise a new line is appended. Adding zero does nothing.
    pub fn add(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(line) = self.line_mut(product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
            return;
        }
        self.lines.push(CartLine {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            image_url: product.image_url.clone(),
            quantity,
        });
    }

    /// Drop the whole line for `id`. Returns whether a line was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != id);
        self.lines.len() != before
    }

    /// Lower the quantity for `id` by one, removing the line instead of
    /// letting it reach zero. Returns whether a line was found.
    pub fn decrement(&mut self, id: ProductId) -> bool {
        match self.line_mut(id) {
            Some(line) if line.quantity > 1 => {
                line.quantity -= 1;
                true
            }
            Some(_) => self.remove(id),
            None => false,
        }
    }

    /// Set the quantity for `id`; zero removes the line.
    /// Returns whether a line was found.
    pub fn set_quantity(&mut self, id: ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(id);
        }
        match self.line_mut(id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Quantity currently held for `id` (zero when absent).
    #[must_use]
    pub fn quantity_of(&self, id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product_id == id)
            .map_or(0, |line| line.quantity)
    }

    /// Sum of every line total.
    #[must_use]
    pub fn total(&self) -> Peso {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Number of distinct lines (the header badge).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Empty the cart after checkout.
    pub fn reset(&mut self) {
        self.lines.clear();
    }

    fn line_mut(&mut self, id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.product_id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn product(id: i64, name: &str, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            user_id: None,
            name: name.to_string(),
            category: Category::CannedGoods,
            price: price.parse().unwrap(),
            description: None,
            image_url: None,
        }
    }

    #[test]
    fn test_repeated_adds_accumulate_quantity() {
        let tuna = product(1, "Tuna", "120");
        let mut cart = Cart::new();
        for qty in [2, 3, 1, 4] {
            cart.add(&tuna, qty);
        }

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.quantity_of(tuna.id), 10);
        assert_eq!(cart.total(), tuna.price * 10);
    }

    #[test]
    fn test_total_of_single_line() {
        let mut cart = Cart::new();
        cart.add(&product(1, "Tuna", "120"), 2);
        assert_eq!(cart.total().to_string(), "₱240.00");
    }

    #[test]
    fn test_total_across_lines() {
        let mut cart = Cart::new();
        cart.add(&product(1, "Tuna", "120"), 2);
        cart.add(&product(2, "Skyflakes", "8.75"), 4);
        assert_eq!(cart.total().plain(), "275.00");
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn test_largest_price_and_quantity_do_not_panic() {
        let mut cart = Cart::new();
        let priciest = product(1, "Lechon", "1000000000000");
        cart.add(&priciest, u32::MAX);
        cart.add(&priciest, 5);
        cart.add(&product(2, "Rice", "1000000000000"), u32::MAX);

        assert_eq!(cart.quantity_of(priciest.id), u32::MAX);
        assert!(cart.total() > Peso::MAX);
        assert_eq!(cart.total(), priciest.price * u32::MAX * 2);
    }

    #[test]
    fn test_adding_zero_is_ignored() {
        let mut cart = Cart::new();
        cart.add(&product(1, "Tuna", "120"), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_snapshot_survives_catalog_edit() {
        let mut tuna = product(1, "Tuna", "120");
        let mut cart = Cart::new();
        cart.add(&tuna, 1);
        tuna.price = "999".parse().unwrap();
        cart.add(&tuna, 1);
        assert_eq!(cart.lines()[0].unit_price.plain(), "120.00");
    }

    #[test]
    fn test_decrement_removes_at_one() {
        let tuna = product(1, "Tuna", "120");
        let mut cart = Cart::new();
        cart.add(&tuna, 2);

        assert!(cart.decrement(tuna.id));
        assert_eq!(cart.quantity_of(tuna.id), 1);
        assert!(cart.decrement(tuna.id));
        assert!(cart.is_empty());
        assert!(!cart.decrement(tuna.id));
    }

    #[test]
    fn test_remove_and_set_quantity() {
        let mut cart = Cart::new();
        cart.add(&product(1, "Tuna", "120"), 5);
        cart.add(&product(2, "Kape", "10"), 1);

        assert!(cart.set_quantity(ProductId::new(2), 3));
        assert_eq!(cart.quantity_of(ProductId::new(2)), 3);
        assert!(cart.set_quantity(ProductId::new(2), 0));
        assert!(!cart.set_quantity(ProductId::new(2), 1));

        assert!(cart.remove(ProductId::new(1)));
        assert!(!cart.remove(ProductId::new(1)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut cart = Cart::new();
        cart.add(&product(1, "Tuna", "120"), 5);
        cart.reset();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Peso::ZERO);
    }
}
