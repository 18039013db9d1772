//! Unified error codes for the Conch storefront
//!
//! This module defines all error codes used across store-server and clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication / account errors
//! - 2xxx: Permission errors
//! - 3xxx: Cart errors
//! - 4xxx: Order errors
//! - 5xxx: Payment method errors
//! - 6xxx: Address errors
//! - 7xxx: Favorites errors
//! - 8xxx: Product errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Session has expired
    SessionExpired = 1005,
    /// Account is disabled
    AccountDisabled = 1006,
    /// User not found
    UserNotFound = 1007,
    /// Email already registered
    EmailExists = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2002,
    /// Caller does not own the resource
    NotResourceOwner = 2003,

    // ==================== 3xxx: Cart ====================
    /// Cart item not found
    CartItemNotFound = 3001,
    /// Quantity below the minimum of 1
    InvalidQuantity = 3002,
    /// Cart is empty
    CartEmpty = 3003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no items
    OrderEmpty = 4002,
    /// Order item is missing required fields
    InvalidOrderItem = 4003,
    /// Unknown order status value
    InvalidStatusValue = 4004,
    /// Status transition is not allowed
    InvalidTransition = 4005,

    // ==================== 5xxx: Payment Method ====================
    /// Payment method not found
    PaymentMethodNotFound = 5001,
    /// Unknown payment method kind
    UnknownPaymentKind = 5002,
    /// Equivalent payment method already saved
    PaymentMethodExists = 5003,

    // ==================== 6xxx: Address ====================
    /// Address not found
    AddressNotFound = 6001,
    /// Equivalent address already saved
    AddressExists = 6002,

    // ==================== 7xxx: Favorites ====================
    /// Product is already in favorites
    AlreadyFavorited = 7001,
    /// Favorite entry not found
    FavoriteNotFound = 7002,

    // ==================== 8xxx: Product ====================
    /// Product not found
    ProductNotFound = 8001,
    /// Product is out of stock
    ProductOutOfStock = 8002,
    /// User has already reviewed this product
    ReviewExists = 8003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::SessionExpired => "Session has expired",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::EmailExists => "Email is already registered",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::NotResourceOwner => "Caller does not own this resource",

            // Cart
            ErrorCode::CartItemNotFound => "Cart item not found",
            ErrorCode::InvalidQuantity => "Quantity must be at least 1",
            ErrorCode::CartEmpty => "Cart is empty",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::InvalidOrderItem => "Order item is missing required fields",
            ErrorCode::InvalidStatusValue => "Unknown order status value",
            ErrorCode::InvalidTransition => "Status transition is not allowed",

            // Payment method
            ErrorCode::PaymentMethodNotFound => "Payment method not found",
            ErrorCode::UnknownPaymentKind => "Unknown payment method kind",
            ErrorCode::PaymentMethodExists => "Equivalent payment method already saved",

            // Address
            ErrorCode::AddressNotFound => "Address not found",
            ErrorCode::AddressExists => "Equivalent address already saved",

            // Favorites
            ErrorCode::AlreadyFavorited => "Product is already in favorites",
            ErrorCode::FavoriteNotFound => "Favorite entry not found",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductOutOfStock => "Product is out of stock",
            ErrorCode::ReviewExists => "Product already reviewed by this user",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::SessionExpired),
            1006 => Ok(ErrorCode::AccountDisabled),
            1007 => Ok(ErrorCode::UserNotFound),
            1008 => Ok(ErrorCode::EmailExists),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::AdminRequired),
            2003 => Ok(ErrorCode::NotResourceOwner),

            // Cart
            3001 => Ok(ErrorCode::CartItemNotFound),
            3002 => Ok(ErrorCode::InvalidQuantity),
            3003 => Ok(ErrorCode::CartEmpty),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderEmpty),
            4003 => Ok(ErrorCode::InvalidOrderItem),
            4004 => Ok(ErrorCode::InvalidStatusValue),
            4005 => Ok(ErrorCode::InvalidTransition),

            // Payment method
            5001 => Ok(ErrorCode::PaymentMethodNotFound),
            5002 => Ok(ErrorCode::UnknownPaymentKind),
            5003 => Ok(ErrorCode::PaymentMethodExists),

            // Address
            6001 => Ok(ErrorCode::AddressNotFound),
            6002 => Ok(ErrorCode::AddressExists),

            // Favorites
            7001 => Ok(ErrorCode::AlreadyFavorited),
            7002 => Ok(ErrorCode::FavoriteNotFound),

            // Product
            8001 => Ok(ErrorCode::ProductNotFound),
            8002 => Ok(ErrorCode::ProductOutOfStock),
            8003 => Ok(ErrorCode::ReviewExists),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        // General
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::Unknown.code(), 1);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::AlreadyExists.code(), 4);

        // Auth
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::InvalidCredentials.code(), 1002);
        assert_eq!(ErrorCode::TokenExpired.code(), 1003);
        assert_eq!(ErrorCode::UserNotFound.code(), 1007);
        assert_eq!(ErrorCode::EmailExists.code(), 1008);

        // Permission
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::AdminRequired.code(), 2002);
        assert_eq!(ErrorCode::NotResourceOwner.code(), 2003);

        // Cart
        assert_eq!(ErrorCode::CartItemNotFound.code(), 3001);
        assert_eq!(ErrorCode::InvalidQuantity.code(), 3002);
        assert_eq!(ErrorCode::CartEmpty.code(), 3003);

        // Order
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::OrderEmpty.code(), 4002);
        assert_eq!(ErrorCode::InvalidOrderItem.code(), 4003);
        assert_eq!(ErrorCode::InvalidStatusValue.code(), 4004);
        assert_eq!(ErrorCode::InvalidTransition.code(), 4005);

        // Payment method
        assert_eq!(ErrorCode::PaymentMethodNotFound.code(), 5001);
        assert_eq!(ErrorCode::UnknownPaymentKind.code(), 5002);
        assert_eq!(ErrorCode::PaymentMethodExists.code(), 5003);

        // Address
        assert_eq!(ErrorCode::AddressNotFound.code(), 6001);
        assert_eq!(ErrorCode::AddressExists.code(), 6002);

        // Favorites
        assert_eq!(ErrorCode::AlreadyFavorited.code(), 7001);
        assert_eq!(ErrorCode::FavoriteNotFound.code(), 7002);

        // Product
        assert_eq!(ErrorCode::ProductNotFound.code(), 8001);
        assert_eq!(ErrorCode::ProductOutOfStock.code(), 8002);
        assert_eq!(ErrorCode::ReviewExists.code(), 8003);

        // System
        assert_eq!(ErrorCode::InternalError.code(), 9001);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
        assert_eq!(ErrorCode::NetworkError.code(), 9003);
        assert_eq!(ErrorCode::TimeoutError.code(), 9004);
        assert_eq!(ErrorCode::ConfigError.code(), 9005);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
        assert!(!ErrorCode::NotFound.is_success());
        assert!(!ErrorCode::InternalError.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(1001), Ok(ErrorCode::NotAuthenticated));
        assert_eq!(ErrorCode::try_from(3002), Ok(ErrorCode::InvalidQuantity));
        assert_eq!(ErrorCode::try_from(4005), Ok(ErrorCode::InvalidTransition));
        assert_eq!(ErrorCode::try_from(7001), Ok(ErrorCode::AlreadyFavorited));
        assert_eq!(ErrorCode::try_from(9001), Ok(ErrorCode::InternalError));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
        assert_eq!(ErrorCode::try_from(1234), Err(InvalidErrorCode(1234)));
    }

    #[test]
    fn test_from_error_code_to_u16() {
        let code: u16 = ErrorCode::Success.into();
        assert_eq!(code, 0);

        let code: u16 = ErrorCode::NotAuthenticated.into();
        assert_eq!(code, 1001);

        let code: u16 = ErrorCode::InternalError.into();
        assert_eq!(code, 9001);
    }

    #[test]
    fn test_serialize() {
        let code = ErrorCode::NotFound;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "3");

        let code = ErrorCode::OrderNotFound;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "4001");

        let code = ErrorCode::Success;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "0");
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("0").unwrap();
        assert_eq!(code, ErrorCode::Success);

        let code: ErrorCode = serde_json::from_str("4001").unwrap();
        assert_eq!(code, ErrorCode::OrderNotFound);

        let code: ErrorCode = serde_json::from_str("9001").unwrap();
        assert_eq!(code, ErrorCode::InternalError);
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());

        let result: Result<ErrorCode, _> = serde_json::from_str("10000");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::Success), "0");
        assert_eq!(format!("{}", ErrorCode::NotFound), "3");
        assert_eq!(format!("{}", ErrorCode::OrderNotFound), "4001");
        assert_eq!(format!("{}", ErrorCode::InternalError), "9001");
    }

    #[test]
    fn test_message() {
        assert_eq!(
            ErrorCode::Success.message(),
            "Operation completed successfully"
        );
        assert_eq!(ErrorCode::NotFound.message(), "Resource not found");
        assert_eq!(ErrorCode::InvalidQuantity.message(), "Quantity must be at least 1");
        assert_eq!(
            ErrorCode::InvalidTransition.message(),
            "Status transition is not allowed"
        );
    }

    #[test]
    fn test_roundtrip() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::NotAuthenticated,
            ErrorCode::PermissionDenied,
            ErrorCode::CartItemNotFound,
            ErrorCode::InvalidTransition,
            ErrorCode::AlreadyFavorited,
            ErrorCode::InternalError,
        ];

        for code in codes {
            let json = serde_json::to_string(&code).unwrap();
            let parsed: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(code, parsed);
        }
    }
}
