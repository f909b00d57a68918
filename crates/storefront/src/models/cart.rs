//! Server-side cart.

use dukkan_core::{CartId, Money, OrderTotals, ProductId};

/// Largest quantity a single line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// One product in the cart, priced at the current catalog price.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product_id: ProductId,
    pub slug: String,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub stock: u32,
    pub is_active: bool,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// Whether the line can be ordered as-is.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.is_active && self.stock >= self.quantity
    }
}

#[derive(Debug, Clone)]
pub struct Cart {
    pub id: CartId,
    pub lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn totals(&self) -> OrderTotals {
        OrderTotals::from_subtotal(self.subtotal())
    }

    #[must_use]
    pub fn has_unavailable_lines(&self) -> bool {
        self.lines.iter().any(|l| !l.is_available())
    }
}

/// Clamp a requested quantity to `1..=99` and to what is in stock.
///
/// Returns `0` when nothing is in stock.
#[must_use]
pub fn clamp_quantity(requested: u32, stock: u32) -> u32 {
    requested.clamp(1, MAX_LINE_QUANTITY).min(stock)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, quantity: u32, stock: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(1),
            slug: "milk".to_string(),
            name: "حليب".to_string(),
            image_url: None,
            unit_price: Money::from_riyals(price),
            quantity,
            stock,
            is_active: true,
        }
    }

    #[test]
    fn test_cart_totals() {
        let cart = Cart {
            id: CartId::new(1),
            lines: vec![line(50, 2, 10), line(25, 2, 10)],
        };
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.subtotal(), Money::from_riyals(150));
        assert_eq!(cart.totals().delivery_fee, Money::from_riyals(25));
    }

    #[test]
    fn test_unavailable_lines() {
        let cart = Cart {
            id: CartId::new(1),
            lines: vec![line(10, 3, 2)],
        };
        assert!(cart.has_unavailable_lines());
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(0, 10), 1);
        assert_eq!(clamp_quantity(5, 3), 3);
        assert_eq!(clamp_quantity(500, 1000), 99);
        assert_eq!(clamp_quantity(2, 0), 0);
    }
}
