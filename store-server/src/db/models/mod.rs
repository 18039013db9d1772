//! Database Models
//!
//! SurrealDB record shapes. All record links and ids use [`surrealdb::RecordId`]
//! through the [`serde_helpers`] modules so they serialize as "table:id"
//! strings on the wire and accept both string and native forms on read.

pub mod serde_helpers;

pub mod address;
pub mod cart;
pub mod favorite;
pub mod order;
pub mod payment_method;
pub mod product;
pub mod user;

pub use address::{Address, AddressCreate, AddressId};
pub use cart::{Cart, CartId, CartItem};
pub use favorite::{Favorite, FavoriteId};
pub use order::{Order, OrderAddress, OrderId, OrderItem};
pub use payment_method::{PaymentMethod, PaymentMethodId};
pub use product::{Product, ProductCreate, ProductId, ProductUpdate, Review};
pub use user::{User, UserCreate, UserId, UserUpdate};
