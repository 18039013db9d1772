//! Cart wire model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of a cart
///
/// `price`, `name` and `image` are snapshot fields copied from the
/// product at add time; later catalog edits do not touch them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: f64,
    pub quantity: i32,
}

/// Per-user cart
///
/// Exactly one per user, created lazily. Items are keyed by
/// `product_id`; no two items share one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: Option<String>,
    /// Owning user id
    pub user: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// Sum of price * quantity over all items
    pub fn subtotal(&self) -> f64 {
        self.items
            .iter()
            .map(|i| i.price * i.quantity as f64)
            .sum()
    }

    pub fn item(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }
}

/// Add-item request: quantity to add plus catalog hints
///
/// The server snapshots price/name/image from the catalog when the
/// product exists there; the hints cover catalog misses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemAdd {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_hint: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_hint: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

/// Set-quantity request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemUpdate {
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtotal() {
        let cart = Cart {
            id: None,
            user: "user:u1".to_string(),
            items: vec![
                CartItem {
                    product_id: "product:p1".to_string(),
                    name: "Conch Shell".to_string(),
                    image: String::new(),
                    price: 500.0,
                    quantity: 2,
                },
                CartItem {
                    product_id: "product:p2".to_string(),
                    name: "Sea Sponge".to_string(),
                    image: String::new(),
                    price: 120.0,
                    quantity: 1,
                },
            ],
            updated_at: None,
        };
        assert_eq!(cart.subtotal(), 1120.0);
        assert!(cart.item("product:p1").is_some());
        assert!(cart.item("product:p9").is_none());
    }

    #[test]
    fn test_add_defaults_quantity() {
        let req: CartItemAdd =
            serde_json::from_str(r#"{"product_id":"product:p1"}"#).unwrap();
        assert_eq!(req.quantity, 1);
        assert!(req.price_hint.is_none());
    }
}
