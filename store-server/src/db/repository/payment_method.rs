//! Payment Method Repository
//!
//! Same single-default discipline as addresses, but scoped per kind:
//! a default card never displaces a default UPI handle.

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::PaymentMethod;
use shared::PaymentKind;
use shared::models::PaymentDetail;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "payment_method";

#[derive(Clone)]
pub struct PaymentMethodRepository {
    base: BaseRepository,
}

impl PaymentMethodRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All payment methods of a user, defaults first
    pub async fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<PaymentMethod>> {
        let user = parse_id(user_id)?;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM payment_method WHERE user = $user ORDER BY is_default DESC")
            .bind(("user", user))
            .await?;
        let methods: Vec<PaymentMethod> = result.take(0)?;
        Ok(methods)
    }

    /// Find payment method by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<PaymentMethod>> {
        let thing = parse_id(id)?;
        let method: Option<PaymentMethod> = self.base.db().select(thing).await?;
        Ok(method)
    }

    /// Add a payment method, deduplicating by content
    ///
    /// Cards are identified by their last four digits, UPI methods by
    /// the handle. A match returns the stored record unchanged.
    pub async fn add(&self, user_id: &str, detail: PaymentDetail) -> RepoResult<PaymentMethod> {
        let existing = self.find_by_user(user_id).await?;
        if let Some(dup) = existing.iter().find(|m| m.same_instrument(&detail)) {
            return Ok(dup.clone());
        }

        // First method of its kind becomes the default for that kind
        let kind = detail.kind();
        let first_of_kind = !existing.iter().any(|m| m.detail.kind() == kind);

        let method = PaymentMethod {
            id: None,
            user: parse_id(user_id)?,
            detail,
            is_default: first_of_kind,
        };

        let created: Option<PaymentMethod> = self.base.db().create(TABLE).content(method).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create payment method".to_string()))
    }

    /// Make one payment method the user's default for its kind
    ///
    /// Clear-then-set, scoped by kind.
    pub async fn set_default(
        &self,
        user_id: &str,
        method_id: &str,
    ) -> RepoResult<PaymentMethod> {
        let user = parse_id(user_id)?;
        let thing = parse_id(method_id)?;

        let target = self
            .find_by_id(method_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Payment method {} not found", method_id)))?;
        if target.user != user {
            return Err(RepoError::NotFound(format!(
                "Payment method {} not found",
                method_id
            )));
        }

        let kind = target.detail.kind();
        self.clear_default(user_id, kind).await?;

        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET is_default = true RETURN AFTER")
            .bind(("thing", thing))
            .await?;

        result
            .take::<Option<PaymentMethod>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Payment method {} not found", method_id)))
    }

    /// Strip the default flag from all of the user's methods of one kind
    ///
    /// The kind tag is serialized inside the detail object.
    async fn clear_default(&self, user_id: &str, kind: PaymentKind) -> RepoResult<()> {
        let user = parse_id(user_id)?;
        self.base
            .db()
            .query(
                "UPDATE payment_method SET is_default = false
                    WHERE user = $user AND detail.kind = $kind",
            )
            .bind(("user", user))
            .bind(("kind", kind.as_str()))
            .await?;
        Ok(())
    }

    /// Delete a payment method owned by the user
    pub async fn delete(&self, user_id: &str, method_id: &str) -> RepoResult<bool> {
        let user = parse_id(user_id)?;
        let thing = parse_id(method_id)?;

        let existing = self
            .find_by_id(method_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Payment method {} not found", method_id)))?;
        if existing.user != user {
            return Err(RepoError::NotFound(format!(
                "Payment method {} not found",
                method_id
            )));
        }

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
