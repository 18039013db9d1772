//! Favorite Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::Favorite;
use chrono::Utc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "favorite";

#[derive(Clone)]
pub struct FavoriteRepository {
    base: BaseRepository,
}

impl FavoriteRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All favorites of a user, newest first
    pub async fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<Favorite>> {
        let user = parse_id(user_id)?;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM favorite WHERE user = $user ORDER BY created_at DESC")
            .bind(("user", user))
            .await?;
        let favorites: Vec<Favorite> = result.take(0)?;
        Ok(favorites)
    }

    /// Find the favorite for one (user, product) pair
    pub async fn find_pair(&self, user_id: &str, product_id: &str) -> RepoResult<Option<Favorite>> {
        let user = parse_id(user_id)?;
        let product = parse_id(product_id)?;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM favorite WHERE user = $user AND product = $product LIMIT 1")
            .bind(("user", user))
            .bind(("product", product))
            .await?;
        let favorites: Vec<Favorite> = result.take(0)?;
        Ok(favorites.into_iter().next())
    }

    /// Mark a product as favorite
    ///
    /// Fails with Duplicate when the pair already exists.
    pub async fn add(&self, user_id: &str, product_id: &str) -> RepoResult<Favorite> {
        if self.find_pair(user_id, product_id).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Product {} already favorited",
                product_id
            )));
        }

        let favorite = Favorite {
            id: None,
            user: parse_id(user_id)?,
            product: parse_id(product_id)?,
            created_at: Utc::now(),
        };

        let created: Option<Favorite> = self.base.db().create(TABLE).content(favorite).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create favorite".to_string()))
    }

    /// Remove the favorite for one (user, product) pair
    ///
    /// Fails with NotFound when the pair does not exist, so removing
    /// twice reports the second call.
    pub async fn remove(&self, user_id: &str, product_id: &str) -> RepoResult<bool> {
        let existing = self
            .find_pair(user_id, product_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not favorited", product_id)))?;

        let thing = existing
            .id
            .ok_or_else(|| RepoError::Database("Favorite record has no id".to_string()))?;

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
