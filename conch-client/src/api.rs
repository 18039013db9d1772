//! Typed API calls
//!
//! One method per server route, grouped the way the routes are. All of
//! them unwrap the response envelope and return wire models from
//! `shared::models`.

use crate::http::HttpClient;
use crate::{ClientError, ClientResult};

use shared::client::{LoginRequest, LoginResponse, ProfileUpdate, RegisterRequest, UserInfo};
use shared::models::{
    Address, AddressCreate, AddressUpdate, Cart, CartItemAdd, CartItemUpdate, Favorite,
    FavoriteCreate, Order, OrderCreate, OrderStatusUpdate, PaymentMethod, PaymentMethodCreate,
    PaymentResult, Product, ProductCreate, ProductQuery, ProductUpdate, ReviewCreate,
};

impl HttpClient {
    // ========== Auth API ==========

    /// Register a new account; returns a token plus the profile
    pub async fn register(&self, req: &RegisterRequest) -> ClientResult<LoginResponse> {
        self.post("/api/auth/register", req).await
    }

    /// Login with email and password
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("/api/auth/login", &request).await
    }

    /// Get the current user's profile
    pub async fn me(&self) -> ClientResult<UserInfo> {
        self.get("/api/auth/me").await
    }

    /// Update name, email or password
    pub async fn update_profile(&self, req: &ProfileUpdate) -> ClientResult<UserInfo> {
        self.put("/api/auth/profile", req).await
    }

    // ========== Catalog API ==========

    /// List catalog products, optionally filtered by keyword/category
    pub async fn products(&self, query: &ProductQuery) -> ClientResult<Vec<Product>> {
        self.get_with_query("/api/products", query).await
    }

    /// Fetch one product with its reviews
    pub async fn product(&self, id: &str) -> ClientResult<Product> {
        self.get(&format!("/api/products/{}", id)).await
    }

    /// Create a product (admin)
    pub async fn create_product(&self, req: &ProductCreate) -> ClientResult<Product> {
        self.post("/api/products", req).await
    }

    /// Update a product (admin)
    pub async fn update_product(&self, id: &str, req: &ProductUpdate) -> ClientResult<Product> {
        self.put(&format!("/api/products/{}", id), req).await
    }

    /// Delete a product (admin)
    pub async fn delete_product(&self, id: &str) -> ClientResult<bool> {
        self.delete(&format!("/api/products/{}", id)).await
    }

    /// Leave a review on a product
    pub async fn add_review(&self, product_id: &str, req: &ReviewCreate) -> ClientResult<Product> {
        self.post(&format!("/api/products/{}/reviews", product_id), req)
            .await
    }

    // ========== Cart API ==========

    /// Fetch the caller's cart, creating it on first touch
    pub async fn cart(&self) -> ClientResult<Cart> {
        self.get("/api/cart").await
    }

    /// Add quantity of a product; an existing line is incremented
    pub async fn add_cart_item(&self, req: &CartItemAdd) -> ClientResult<Cart> {
        self.post("/api/cart/items", req).await
    }

    /// Overwrite the quantity of one cart line
    pub async fn set_cart_quantity(&self, product_id: &str, quantity: i32) -> ClientResult<Cart> {
        let request = CartItemUpdate { quantity };
        self.put(&format!("/api/cart/items/{}", product_id), &request)
            .await
    }

    /// Remove one cart line; absent lines are ignored
    pub async fn remove_cart_item(&self, product_id: &str) -> ClientResult<Cart> {
        self.delete(&format!("/api/cart/items/{}", product_id)).await
    }

    /// Empty the cart, keeping the record itself
    pub async fn clear_cart(&self) -> ClientResult<Cart> {
        self.delete("/api/cart").await
    }

    // ========== Favorites API ==========

    /// List the caller's favorites
    pub async fn favorites(&self) -> ClientResult<Vec<Favorite>> {
        self.get("/api/favorites").await
    }

    /// Favorite a product; duplicates are rejected with a conflict
    pub async fn add_favorite(&self, product_id: &str) -> ClientResult<Favorite> {
        let request = FavoriteCreate {
            product_id: product_id.to_string(),
        };
        self.post("/api/favorites", &request).await
    }

    /// Unfavorite a product
    pub async fn remove_favorite(&self, product_id: &str) -> ClientResult<bool> {
        self.delete(&format!("/api/favorites/{}", product_id)).await
    }

    // ========== Addresses API ==========

    /// List the caller's shipping addresses
    pub async fn addresses(&self) -> ClientResult<Vec<Address>> {
        self.get("/api/addresses").await
    }

    /// Add a shipping address; an identical destination returns the
    /// existing record instead of a duplicate
    pub async fn add_address(&self, req: &AddressCreate) -> ClientResult<Address> {
        self.post("/api/addresses", req).await
    }

    /// Update fields of one address
    pub async fn update_address(&self, id: &str, req: &AddressUpdate) -> ClientResult<Address> {
        self.put(&format!("/api/addresses/{}", id), req).await
    }

    /// Make one address the default, displacing the previous default
    pub async fn set_default_address(&self, id: &str) -> ClientResult<Address> {
        self.put_empty(&format!("/api/addresses/{}/default", id))
            .await
    }

    /// Delete an address
    pub async fn delete_address(&self, id: &str) -> ClientResult<bool> {
        self.delete(&format!("/api/addresses/{}", id)).await
    }

    // ========== Payment Methods API ==========

    /// List the caller's saved payment methods
    pub async fn payment_methods(&self) -> ClientResult<Vec<PaymentMethod>> {
        self.get("/api/payment-methods").await
    }

    /// Save a payment method; the same instrument returns the existing
    /// record instead of a duplicate
    pub async fn add_payment_method(
        &self,
        req: &PaymentMethodCreate,
    ) -> ClientResult<PaymentMethod> {
        self.post("/api/payment-methods", req).await
    }

    /// Make one method the default for its kind
    pub async fn set_default_payment_method(&self, id: &str) -> ClientResult<PaymentMethod> {
        self.put_empty(&format!("/api/payment-methods/{}/default", id))
            .await
    }

    /// Delete a payment method
    pub async fn delete_payment_method(&self, id: &str) -> ClientResult<bool> {
        self.delete(&format!("/api/payment-methods/{}", id)).await
    }

    // ========== Orders API ==========

    /// Place an order from explicit items
    pub async fn place_order(&self, req: &OrderCreate) -> ClientResult<Order> {
        self.post("/api/orders", req).await
    }

    /// List the caller's orders, newest first
    pub async fn my_orders(&self) -> ClientResult<Vec<Order>> {
        self.get("/api/orders/mine").await
    }

    /// Fetch one order
    pub async fn order(&self, id: &str) -> ClientResult<Order> {
        self.get(&format!("/api/orders/{}", id)).await
    }

    /// List all orders with pagination (admin)
    pub async fn all_orders(&self, limit: usize, offset: usize) -> ClientResult<Vec<Order>> {
        let query = [
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        self.get_with_query("/api/orders", &query).await
    }

    /// Request a status change
    ///
    /// The raw string is sent as-is; the server decides whether the
    /// value and the transition are acceptable.
    pub async fn update_order_status(&self, id: &str, status: &str) -> ClientResult<Order> {
        let request = OrderStatusUpdate {
            status: status.to_string(),
        };
        self.put(&format!("/api/orders/{}/status", id), &request)
            .await
    }

    /// Record a payment gateway result on an order
    pub async fn pay_order(&self, id: &str, result: &PaymentResult) -> ClientResult<Order> {
        self.post(&format!("/api/orders/{}/pay", id), result).await
    }
}

/// Ensure an id is present on a wire record
///
/// Server responses always carry ids; a missing one means the response
/// cannot be used for follow-up calls.
pub fn require_id(id: &Option<String>) -> ClientResult<&str> {
    id.as_deref()
        .ok_or_else(|| ClientError::InvalidResponse("Record is missing its id".to_string()))
}
