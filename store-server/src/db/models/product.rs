//! Product Model
//!
//! Catalog products with embedded customer reviews. Review aggregates
//! (rating, num_reviews) are denormalized onto the product record and
//! recomputed whenever a review is added.

use super::serde_helpers;
use super::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Product ID type
pub type ProductId = RecordId;

/// Customer review embedded in a product record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(with = "serde_helpers::record_id")]
    pub user: UserId,
    pub name: String,
    pub rating: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Product model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<ProductId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub count_in_stock: i32,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub num_reviews: i32,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub count_in_stock: i32,
}

/// Update product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_in_stock: Option<i32>,
}

impl Product {
    /// Recompute rating aggregates from embedded reviews
    pub fn recalculate_rating(&mut self) {
        self.num_reviews = self.reviews.len() as i32;
        if self.reviews.is_empty() {
            self.rating = 0.0;
        } else {
            let sum: f64 = self.reviews.iter().map(|r| r.rating).sum();
            self.rating = sum / self.reviews.len() as f64;
        }
    }

    /// Whether a user already reviewed this product
    pub fn has_review_from(&self, user: &UserId) -> bool {
        self.reviews.iter().any(|r| &r.user == user)
    }
}
