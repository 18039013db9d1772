//! Address Repository
//!
//! Address book entries with the single-default invariant: setting a
//! default always clears the user's other defaults first, in the same
//! request.

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{Address, AddressCreate};
use shared::models::AddressUpdate;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "address";

#[derive(Clone)]
pub struct AddressRepository {
    base: BaseRepository,
}

impl AddressRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All addresses of a user, default first
    pub async fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<Address>> {
        let user = parse_id(user_id)?;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM address WHERE user = $user ORDER BY is_default DESC, city")
            .bind(("user", user))
            .await?;
        let addresses: Vec<Address> = result.take(0)?;
        Ok(addresses)
    }

    /// Find address by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Address>> {
        let thing = parse_id(id)?;
        let address: Option<Address> = self.base.db().select(thing).await?;
        Ok(address)
    }

    /// Add an address, deduplicating by content
    ///
    /// When the user already has an address with the same street, city
    /// and postal code, that record is returned instead of inserting a
    /// second copy.
    pub async fn add(&self, user_id: &str, data: AddressCreate) -> RepoResult<Address> {
        let existing = self.find_by_user(user_id).await?;
        if let Some(dup) = existing.iter().find(|a| a.same_destination(&data)) {
            return Ok(dup.clone());
        }

        let address = Address {
            id: None,
            user: parse_id(user_id)?,
            name: data.name,
            phone: data.phone,
            street: data.street,
            city: data.city,
            state: data.state,
            postal_code: data.postal_code,
            // First address becomes the default
            is_default: existing.is_empty(),
        };

        let created: Option<Address> = self.base.db().create(TABLE).content(address).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create address".to_string()))
    }

    /// Update fields of an address owned by the user
    ///
    /// The default flag is not touched here; use [`set_default`](Self::set_default).
    pub async fn update(
        &self,
        user_id: &str,
        address_id: &str,
        data: AddressUpdate,
    ) -> RepoResult<Address> {
        let user = parse_id(user_id)?;
        let thing = parse_id(address_id)?;

        let existing = self
            .find_by_id(address_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Address {} not found", address_id)))?;
        if existing.user != user {
            return Err(RepoError::NotFound(format!(
                "Address {} not found",
                address_id
            )));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    name = $name OR name,
                    phone = $phone OR phone,
                    street = $street OR street,
                    city = $city OR city,
                    state = $state OR state,
                    postal_code = $postal_code OR postal_code
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("name", data.name))
            .bind(("phone", data.phone))
            .bind(("street", data.street))
            .bind(("city", data.city))
            .bind(("state", data.state))
            .bind(("postal_code", data.postal_code))
            .await?;

        result
            .take::<Option<Address>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Address {} not found", address_id)))
    }

    /// Make one address the user's default
    ///
    /// Clear-then-set: every other address of the user is first
    /// stripped of the flag, then the target gets it.
    pub async fn set_default(&self, user_id: &str, address_id: &str) -> RepoResult<Address> {
        let user = parse_id(user_id)?;
        let thing = parse_id(address_id)?;

        let target = self
            .find_by_id(address_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Address {} not found", address_id)))?;
        if target.user != user {
            return Err(RepoError::NotFound(format!(
                "Address {} not found",
                address_id
            )));
        }

        self.base
            .db()
            .query("UPDATE address SET is_default = false WHERE user = $user")
            .bind(("user", user))
            .await?;

        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET is_default = true RETURN AFTER")
            .bind(("thing", thing))
            .await?;

        result
            .take::<Option<Address>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Address {} not found", address_id)))
    }

    /// Delete an address owned by the user
    pub async fn delete(&self, user_id: &str, address_id: &str) -> RepoResult<bool> {
        let user = parse_id(user_id)?;
        let thing = parse_id(address_id)?;

        let existing = self
            .find_by_id(address_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Address {} not found", address_id)))?;
        if existing.user != user {
            return Err(RepoError::NotFound(format!(
                "Address {} not found",
                address_id
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
