//! Payment method wire model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment method kind
///
/// Defaults are tracked per kind: a default card does not displace
/// a default UPI handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Upi,
    Card,
}

impl PaymentKind {
    pub const ALL: [PaymentKind; 2] = [PaymentKind::Upi, PaymentKind::Card];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "upi",
            Self::Card => "card",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse error for unknown payment kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPaymentKind(pub String);

impl fmt::Display for UnknownPaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown payment kind: {}", self.0)
    }
}

impl std::error::Error for UnknownPaymentKind {}

impl FromStr for PaymentKind {
    type Err = UnknownPaymentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upi" => Ok(Self::Upi),
            "card" => Ok(Self::Card),
            other => Err(UnknownPaymentKind(other.to_string())),
        }
    }
}

/// Kind-specific payment detail
///
/// Card security codes are never part of this payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PaymentDetail {
    Upi {
        handle: String,
    },
    Card {
        number: String,
        holder: String,
        expiry: String,
    },
}

impl PaymentDetail {
    pub fn kind(&self) -> PaymentKind {
        match self {
            Self::Upi { .. } => PaymentKind::Upi,
            Self::Card { .. } => PaymentKind::Card,
        }
    }

    /// Last four digits of a card number, None for UPI
    pub fn card_last4(&self) -> Option<&str> {
        match self {
            Self::Card { number, .. } => {
                let digits = number.trim();
                let cut = digits
                    .char_indices()
                    .rev()
                    .nth(3)
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                Some(&digits[cut..])
            }
            Self::Upi { .. } => None,
        }
    }
}

/// Saved payment method entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: Option<String>,
    /// Owning user id
    pub user: String,
    #[serde(flatten)]
    pub detail: PaymentDetail,
    #[serde(default)]
    pub is_default: bool,
}

/// Create payment method payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethodCreate {
    #[serde(flatten)]
    pub detail: PaymentDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!("upi".parse::<PaymentKind>(), Ok(PaymentKind::Upi));
        assert_eq!("card".parse::<PaymentKind>(), Ok(PaymentKind::Card));
        assert!("paypal".parse::<PaymentKind>().is_err());
        assert!("UPI".parse::<PaymentKind>().is_err());
    }

    #[test]
    fn test_detail_tagged_serde() {
        let detail = PaymentDetail::Card {
            number: "4111111111111111".to_string(),
            holder: "Asha".to_string(),
            expiry: "12/27".to_string(),
        };
        let json = serde_json::to_string(&detail).unwrap();
        assert!(json.contains("\"kind\":\"card\""));

        let parsed: PaymentDetail = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.kind(), PaymentKind::Card);
    }

    #[test]
    fn test_card_last4() {
        let detail = PaymentDetail::Card {
            number: "4111111111111111".to_string(),
            holder: "Asha".to_string(),
            expiry: "12/27".to_string(),
        };
        assert_eq!(detail.card_last4(), Some("1111"));

        let upi = PaymentDetail::Upi {
            handle: "asha@bank".to_string(),
        };
        assert_eq!(upi.card_last4(), None);
    }
}
