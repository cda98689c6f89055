//! Printable receipt formatting.
//!
//! A [`Receipt`] is a frozen copy of the cart taken at print or checkout
//! time. Rendering is a pure function of that copy.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLine};
use crate::types::Peso;

/// Header printed at the top of every receipt.
pub const STORE_TITLE: &str = "TINDAHAN NI LOLA";

/// Horizontal rule sized for 58/80mm thermal paper.
pub const DIVIDER: &str = "--------------------------";

/// Closing line.
pub const THANK_YOU: &str = "THANK YOU!";

/// One printed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Peso,
    pub line_total: Peso,
}

impl ReceiptLine {
    /// `Tuna x2 ₱240.00`
    #[must_use]
    pub fn text(&self) -> String {
        format!("{} x{} {}", self.name, self.quantity, self.line_total)
    }
}

impl From<&CartLine> for ReceiptLine {
    fn from(line: &CartLine) -> Self {
        Self {
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total(),
        }
    }
}

/// A cart snapshot with its grand total and print time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub lines: Vec<ReceiptLine>,
    pub total: Peso,
    pub printed_at: NaiveDateTime,
}

impl Receipt {
    /// Snapshot `cart` as of `printed_at`.
    #[must_use]
    pub fn from_cart(cart: &Cart, printed_at: NaiveDateTime) -> Self {
        Self {
            lines: cart.lines().iter().map(ReceiptLine::from).collect(),
            total: cart.total(),
            printed_at,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `TOTAL: ₱240.00`
    #[must_use]
    pub fn total_line(&self) -> String {
        format!("TOTAL: {}", self.total)
    }

    /// Print timestamp as shown on the receipt.
    #[must_use]
    pub fn printed_at_display(&self) -> String {
        self.printed_at.format("%Y-%m-%d %H:%M").to_string()
    }

    /// Fixed-width text layout for the print surface.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(STORE_TITLE);
        out.push('\n');
        out.push_str(DIVIDER);
        out.push('\n');
        for line in &self.lines {
            out.push_str(&line.text());
            out.push('\n');
        }
        out.push_str(DIVIDER);
        out.push('\n');
        out.push_str(&self.total_line());
        out.push('\n');
        out.push_str(THANK_YOU);
        out
    }
}
