//! Order Repository
//!
//! Orders are append-only. Items, amounts and the shipping address are
//! frozen at creation; only the status and the payment result move.

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::Order;
use shared::OrderStatus;
use shared::models::PaymentResult;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Persist a freshly placed order
    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Find order by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let thing = parse_id(id)?;
        let order: Option<Order> = self.base.db().select(thing).await?;
        Ok(order)
    }

    /// Order history of one user, newest first
    pub async fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<Order>> {
        let user = parse_id(user_id)?;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM order WHERE user = $user ORDER BY created_at DESC")
            .bind(("user", user))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders)
    }

    /// Every order in the store, newest first. Admin listings only.
    pub async fn find_all(&self, limit: usize, offset: usize) -> RepoResult<Vec<Order>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM order ORDER BY created_at DESC LIMIT $limit START $offset")
            .bind(("limit", limit))
            .bind(("offset", offset))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders)
    }

    /// Move an order to a new status
    ///
    /// Transition legality is decided in `orders::lifecycle` before this
    /// is called. The repository writes whatever it is told.
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> RepoResult<Order> {
        let thing = parse_id(id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET status = $status RETURN AFTER")
            .bind(("thing", thing))
            .bind(("status", status))
            .await?;

        result
            .take::<Option<Order>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// Attach the gateway payment result, stored verbatim
    pub async fn set_payment_result(
        &self,
        id: &str,
        payment: PaymentResult,
    ) -> RepoResult<Order> {
        let thing = parse_id(id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET payment_result = $payment_result RETURN AFTER")
            .bind(("thing", thing))
            .bind(("payment_result", payment))
            .await?;

        result
            .take::<Option<Order>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }
}
