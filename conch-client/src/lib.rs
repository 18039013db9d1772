//! Conch Client - HTTP client and optimistic store for the Store Server
//!
//! [`HttpClient`] gives typed calls over the enveloped API.
//! [`ClientStore`] layers an optimistic cache on top: collections render
//! from memory, mutations apply locally before dispatch, failures roll
//! back, and a snapshot file survives restarts and offline stretches.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod snapshot;
pub mod store;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use snapshot::{GuestSection, Snapshot, SnapshotStore};
pub use store::{ClientStore, Collection, StoreEvent};

// Re-export shared types for convenience
pub use shared::client::{
    ApiResponse, LoginRequest, LoginResponse, ProfileUpdate, RegisterRequest, UserInfo,
};
pub use shared::models::{
    Address, AddressCreate, AddressUpdate, Cart, CartItem, CartItemAdd, Favorite, Order,
    OrderCreate, OrderItem, OrderStatus, PaymentDetail, PaymentMethod, PaymentMethodCreate,
    PaymentResult, Product, ProductQuery, ReviewCreate,
};
