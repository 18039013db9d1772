//! Order wire model and status lifecycle

use super::address::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status lifecycle
///
/// Happy path runs PENDING -> PROCESSING -> SHIPPED -> DELIVERED.
/// PENDING and PROCESSING may also move to CANCELLED. DELIVERED and
/// CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Terminal statuses admit no further transition
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse error for unknown status values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOrderStatus(pub String);

impl fmt::Display for UnknownOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown order status: {}", self.0)
    }
}

impl std::error::Error for UnknownOrderStatus {}

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    /// Strict parse: exactly the five wire values, nothing else
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}

/// One immutable order line
///
/// Snapshot of the product at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    #[serde(default)]
    pub image: String,
}

/// Shipping address embedded in an order
///
/// Copied from the user's Address at placement; surviving later
/// address edits or deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAddress {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl From<&Address> for OrderAddress {
    fn from(a: &Address) -> Self {
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

/// Opaque payment gateway result, stored verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub id: String,
    pub status: String,
    pub update_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_email: Option<String>,
}

/// Placed order
///
/// Append-only: after creation only `status` and `payment_result`
/// may change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<String>,
    /// Owning user id
    pub user: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: OrderAddress,
    /// Payment method descriptor chosen at checkout
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_result: Option<PaymentResult>,
    pub subtotal: f64,
    pub shipping_fee: f64,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Place-order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub items: Vec<OrderItem>,
    pub address_id: String,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_result: Option<PaymentResult>,
}

/// Status-change payload
///
/// Carries the raw string so the server can reject unknown values
/// explicitly instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");

        let status: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_status_parse_strict() {
        assert_eq!("PENDING".parse::<OrderStatus>(), Ok(OrderStatus::Pending));
        assert_eq!("SHIPPED".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert!("pending".parse::<OrderStatus>().is_err());
        assert!("REFUNDED".parse::<OrderStatus>().is_err());
        assert!("".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_order_address_from_address() {
        let address = Address {
            id: Some("address:a1".to_string()),
            user: "user:u1".to_string(),
            name: "Asha".to_string(),
            phone: "555-0101".to_string(),
            street: "12 Shore Rd".to_string(),
            city: "Porbandar".to_string(),
            state: "GJ".to_string(),
            postal_code: "360575".to_string(),
            is_default: true,
        };
        let snapshot = OrderAddress::from(&address);
        assert_eq!(snapshot.street, "12 Shore Rd");
        assert_eq!(snapshot.postal_code, "360575");
    }
}
