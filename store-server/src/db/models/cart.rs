//! Cart Model
//!
//! One cart record per user. Line items are embedded and keyed by
//! product: adding a product that is already present increments its
//! quantity instead of creating a second line.

use super::serde_helpers;
use super::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Cart ID type
pub type CartId = RecordId;

/// A line item embedded in a cart record
///
/// Price, name and image are snapshots taken when the product was
/// first added. Later catalog edits do not rewrite existing lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: f64,
    pub quantity: i32,
}

/// Cart model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<CartId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: UserId,
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Empty cart for a user
    pub fn new(user: UserId) -> Self {
        Self {
            id: None,
            user,
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Find a line item by product
    pub fn item(&self, product: &RecordId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product == product)
    }

    /// Find a mutable line item by product
    pub fn item_mut(&mut self, product: &RecordId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| &i.product == product)
    }
}
