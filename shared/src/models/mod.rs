//! Wire models
//!
//! Shared between store-server and conch-client (via API).
//! Record ids travel as `"table:key"` strings; the server converts
//! them from its storage types at the API boundary.

pub mod address;
pub mod cart;
pub mod favorite;
pub mod order;
pub mod payment_method;
pub mod product;

// Re-exports
pub use address::*;
pub use cart::*;
pub use favorite::*;
pub use order::*;
pub use payment_method::*;
pub use product::*;
