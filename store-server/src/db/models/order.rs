//! Order Model
//!
//! Orders are append-only records. Once created, only `status` and
//! `payment_result` may change; items, amounts and the address
//! snapshot are frozen at placement time.

use super::serde_helpers;
use super::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::OrderStatus;
use shared::models::PaymentResult;
use surrealdb::RecordId;

/// Order ID type
pub type OrderId = RecordId;

/// A line item frozen into an order at placement time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    #[serde(default)]
    pub image: String,
}

/// Shipping address snapshot embedded in an order
///
/// A copy, not a reference: editing the address book later must not
/// rewrite where a past order was shipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAddress {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl From<&super::address::Address> for OrderAddress {
    fn from(a: &super::address::Address) -> Self {
        Self {
            name: a.name.clone(),
            phone: a.phone.clone(),
            street: a.street.clone(),
            city: a.city.clone(),
            state: a.state.clone(),
            postal_code: a.postal_code.clone(),
        }
    }
}

/// Order model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<OrderId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: OrderAddress,
    /// Opaque payment descriptor chosen at checkout, e.g. "upi" or "card:1111"
    pub payment_method: String,
    /// Gateway confirmation, stored verbatim when payment completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_result: Option<PaymentResult>,
    pub subtotal: f64,
    pub shipping_fee: f64,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
