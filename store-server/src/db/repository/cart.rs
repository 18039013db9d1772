//! Cart Repository
//!
//! One cart record per user, lazily created on first write. Line
//! items are keyed by product: the same product never appears twice.

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{Cart, CartItem};
use chrono::Utc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "cart";

#[derive(Clone)]
pub struct CartRepository {
    base: BaseRepository,
}

impl CartRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find the cart belonging to a user
    pub async fn find_by_user(&self, user_id: &str) -> RepoResult<Option<Cart>> {
        let user = parse_id(user_id)?;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM cart WHERE user = $user LIMIT 1")
            .bind(("user", user))
            .await?;
        let carts: Vec<Cart> = result.take(0)?;
        Ok(carts.into_iter().next())
    }

    /// Fetch the user's cart, creating an empty one if absent
    pub async fn get_or_create(&self, user_id: &str) -> RepoResult<Cart> {
        if let Some(cart) = self.find_by_user(user_id).await? {
            return Ok(cart);
        }
        let user = parse_id(user_id)?;
        let created: Option<Cart> = self.base.db().create(TABLE).content(Cart::new(user)).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create cart".to_string()))
    }

    /// Add a line item, or increment quantity when the product is
    /// already in the cart
    ///
    /// The incoming item carries the snapshot for a first add. On
    /// increment, the stored price/name/image stay as captured by the
    /// original add.
    pub async fn add_item(&self, user_id: &str, item: CartItem) -> RepoResult<Cart> {
        if item.quantity < 1 {
            return Err(RepoError::Validation(format!(
                "Quantity must be at least 1, got {}",
                item.quantity
            )));
        }

        let mut cart = self.get_or_create(user_id).await?;
        match cart.item_mut(&item.product) {
            Some(existing) => {
                existing.quantity += item.quantity;
            }
            None => {
                cart.items.push(item);
            }
        }
        self.save(cart).await
    }

    /// Overwrite the quantity of an existing line item
    pub async fn set_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i32,
    ) -> RepoResult<Cart> {
        if quantity < 1 {
            return Err(RepoError::Validation(format!(
                "Quantity must be at least 1, got {}",
                quantity
            )));
        }

        let product = parse_id(product_id)?;
        let mut cart = self
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Item {} not in cart", product_id)))?;

        let item = cart
            .item_mut(&product)
            .ok_or_else(|| RepoError::NotFound(format!("Item {} not in cart", product_id)))?;
        item.quantity = quantity;

        self.save(cart).await
    }

    /// Remove one line item by product
    ///
    /// Removing a product that is not in the cart is a no-op.
    pub async fn remove_item(&self, user_id: &str, product_id: &str) -> RepoResult<Cart> {
        let product = parse_id(product_id)?;
        let mut cart = self.get_or_create(user_id).await?;
        cart.items.retain(|i| i.product != product);
        self.save(cart).await
    }

    /// Empty the items list, keeping the cart record itself
    pub async fn clear(&self, user_id: &str) -> RepoResult<Cart> {
        let mut cart = self.get_or_create(user_id).await?;
        cart.items.clear();
        self.save(cart).await
    }

    /// Persist items and bump updated_at
    async fn save(&self, mut cart: Cart) -> RepoResult<Cart> {
        cart.updated_at = Utc::now();
        let thing = cart
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Cart record has no id".to_string()))?;

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    items = $items,
                    updated_at = $updated_at
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("items", cart.items))
            .bind(("updated_at", cart.updated_at))
            .await?;

        result
            .take::<Option<Cart>>(0)?
            .ok_or_else(|| RepoError::Database("Failed to save cart".to_string()))
    }
}
