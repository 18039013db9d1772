//! Favorites wire model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One favorited product
///
/// The (user, product) pair is unique; re-favoriting is rejected,
/// not duplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: Option<String>,
    /// Owning user id
    pub user: String,
    /// Favorited product id
    pub product: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Add-favorite payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteCreate {
    pub product_id: String,
}
