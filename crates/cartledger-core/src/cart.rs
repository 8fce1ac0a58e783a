//! # Cart Math
//!
//! Totals are always derived fresh from the current item set, never patched
//! incrementally.
//!
//! ```text
//! items ──► line_total() per item ──► Σ ──► cart_total()
//! ```
//!
//! [`CartView`] is the read model every cart operation returns: the cart row
//! with its items, or the empty-cart value when the customer has no cart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Cart, CartItem};

/// Sums fresh line totals (price × quantity) across all items.
pub fn cart_total(items: &[CartItem]) -> Money {
    items.iter().map(CartItem::line_total).sum()
}

/// Like [`cart_total`], but `None` when a line total or the sum leaves the
/// i64 cents range.
pub fn checked_cart_total(items: &[CartItem]) -> Option<Money> {
    items.iter().try_fold(Money::zero(), |total, item| {
        item.unit_price()
            .checked_multiply_quantity(item.quantity)
            .and_then(|line| total.checked_add(line))
    })
}

/// Checks the subtotal and total invariants for a cart and its items.
///
/// Returns a description of the first violation found.
pub fn check_invariants(total: Money, items: &[CartItem]) -> Result<(), String> {
    for item in items {
        if item.quantity <= 0 {
            return Err(format!(
                "item {} has non-positive quantity {}",
                item.product_id, item.quantity
            ));
        }
        if item.subtotal() != item.line_total() {
            return Err(format!(
                "item {} subtotal {} != {} × {}",
                item.product_id,
                item.subtotal(),
                item.unit_price(),
                item.quantity
            ));
        }
    }

    let expected: Money = items.iter().map(CartItem::subtotal).sum();
    if total != expected {
        return Err(format!("cart total {total} != sum of subtotals {expected}"));
    }

    Ok(())
}

/// A cart as returned to callers.
///
/// ## Empty Cart Value
/// When no cart row exists, `id`, `created_at` and `updated_at` are `None`,
/// `items` is empty and the total is zero. Reads never create a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartView {
    pub id: Option<String>,
    pub customer_id: String,
    pub items: Vec<CartItem>,
    pub total_cents: i64,
    pub item_count: usize,
    pub total_quantity: i64,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CartView {
    /// The empty-cart value for a customer without a cart row.
    pub fn empty(customer_id: impl Into<String>) -> Self {
        CartView {
            id: None,
            customer_id: customer_id.into(),
            items: Vec::new(),
            total_cents: 0,
            item_count: 0,
            total_quantity: 0,
            created_at: None,
            updated_at: None,
        }
    }

    /// Builds the view from a persisted cart and its items.
    pub fn from_parts(cart: Cart, items: Vec<CartItem>) -> Self {
        CartView {
            id: Some(cart.id),
            customer_id: cart.customer_id,
            item_count: items.len(),
            total_quantity: items.iter().map(|i| i.quantity).sum(),
            total_cents: cart.total_cents,
            items,
            created_at: Some(cart.created_at),
            updated_at: Some(cart.updated_at),
        }
    }

    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Whether this is the empty-cart value (no persisted row).
    pub fn is_empty_value(&self) -> bool {
        self.id.is_none()
    }

    /// Finds the line for a product.
    pub fn item(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Product;

    fn item(cart: &Cart, id: &str, price: i64, qty: i64) -> CartItem {
        CartItem::from_product(&cart.id, &Product::new(id, id, price, 100), qty)
    }

    #[test]
    fn test_cart_total_sums_line_totals() {
        let cart = Cart::new("c1");
        let items = vec![item(&cart, "a", 1000, 3), item(&cart, "b", 250, 2)];

        assert_eq!(cart_total(&items).cents(), 3500);
        assert!(check_invariants(cart_total(&items), &items).is_ok());
    }

    #[test]
    fn test_checked_cart_total_overflow() {
        let cart = Cart::new("c1");
        let big = i64::MAX / 2 + 1;
        let one = vec![item(&cart, "a", big, 1)];
        let two = vec![item(&cart, "a", big, 1), item(&cart, "b", big, 1)];

        assert_eq!(checked_cart_total(&one), Some(Money::from_cents(big)));
        assert_eq!(checked_cart_total(&two), None);
        assert_eq!(checked_cart_total(&[]), Some(Money::zero()));
    }

    #[test]
    fn test_check_invariants_detects_drift() {
        let cart = Cart::new("c1");
        let mut items = vec![item(&cart, "a", 1000, 3)];

        assert!(check_invariants(Money::from_cents(2999), &items).is_err());

        if let Some(first) = items.first_mut() {
            first.subtotal_cents += 1;
        }
        assert!(check_invariants(Money::from_cents(3001), &items).is_err());
    }

    #[test]
    fn test_check_invariants_rejects_zero_quantity() {
        let cart = Cart::new("c1");
        let mut line = item(&cart, "a", 1000, 1);
        line.set_quantity(0);
        assert!(check_invariants(Money::zero(), &[line]).is_err());
    }

    #[test]
    fn test_empty_view() {
        let view = CartView::empty("c1");
        assert!(view.is_empty_value());
        assert!(view.items.is_empty());
        assert!(view.total().is_zero());
    }

    #[test]
    fn test_from_parts_counts() {
        let mut cart = Cart::new("c1");
        let items = vec![item(&cart, "a", 1000, 3), item(&cart, "b", 250, 2)];
        cart.total_cents = cart_total(&items).cents();

        let view = CartView::from_parts(cart, items);
        assert_eq!(view.item_count, 2);
        assert_eq!(view.total_quantity, 5);
        assert_eq!(view.total_cents, 3500);
        assert_eq!(view.item("b").map(|i| i.quantity), Some(2));
    }

    #[test]
    fn test_view_wire_shape() {
        let json = serde_json::to_value(CartView::empty("c1")).unwrap();
        assert_eq!(json["customerId"], "c1");
        assert_eq!(json["totalCents"], 0);
        assert!(json["id"].is_null());
        assert_eq!(json["items"], serde_json::json!([]));
    }
}
