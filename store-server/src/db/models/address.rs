//! Address Model

use super::serde_helpers;
use super::user::UserId;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Address ID type
pub type AddressId = RecordId;

/// Shipping address matching SurrealDB schema
///
/// Per user, at most one address carries `is_default = true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<AddressId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: UserId,
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_default: bool,
}

/// Create address payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressCreate {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl Address {
    /// Content identity used for duplicate detection
    ///
    /// Two addresses are the same destination when street, city and
    /// postal code all match.
    pub fn same_destination(&self, other: &AddressCreate) -> bool {
        self.street == other.street
            && self.city == other.city
            && self.postal_code == other.postal_code
    }
}
