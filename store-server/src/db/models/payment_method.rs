//! Payment Method Model

use super::serde_helpers;
use super::user::UserId;
use serde::{Deserialize, Serialize};
use shared::models::PaymentDetail;
use surrealdb::RecordId;

/// Payment method ID type
pub type PaymentMethodId = RecordId;

/// Stored payment method matching SurrealDB schema
///
/// The kind-specific fields live flattened on the record, tagged by
/// `kind`. Per user and kind, at most one record carries
/// `is_default = true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<PaymentMethodId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: UserId,
    #[serde(flatten)]
    pub detail: PaymentDetail,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_default: bool,
}

impl PaymentMethod {
    /// Content identity used for duplicate detection
    ///
    /// Cards match on their last four digits, UPI methods on the
    /// full handle.
    pub fn same_instrument(&self, other: &PaymentDetail) -> bool {
        match (&self.detail, other) {
            (PaymentDetail::Upi { handle: a }, PaymentDetail::Upi { handle: b }) => a == b,
            (PaymentDetail::Card { .. }, PaymentDetail::Card { .. }) => {
                self.detail.card_last4() == other.card_last4()
            }
            _ => false,
        }
    }
}
