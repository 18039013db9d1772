//! Favorite Model

use super::serde_helpers;
use super::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Favorite ID type
pub type FavoriteId = RecordId;

/// A (user, product) favorite marking
///
/// At most one record exists per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<FavoriteId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: UserId,
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub created_at: DateTime<Utc>,
}
