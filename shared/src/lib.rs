//! Shared types for the Conch storefront
//!
//! Common types used across both crates: wire models, auth DTOs,
//! the unified error system, and the API response envelope.

pub mod client;
pub mod error;
pub mod models;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{OrderStatus, PaymentKind};
