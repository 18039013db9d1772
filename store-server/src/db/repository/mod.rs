//! Repository Layer
//!
//! Data access on top of the embedded SurrealDB instance. Each table
//! gets one repository wrapping [`BaseRepository`].
//!
//! # RecordId convention
//!
//! Repositories accept string ids in "table:id" form and parse them
//! into [`surrealdb::RecordId`]. A string that does not parse is a
//! validation error, never a query.

pub mod address;
pub mod cart;
pub mod favorite;
pub mod order;
pub mod payment_method;
pub mod product;
pub mod user;

pub use address::AddressRepository;
pub use cart::CartRepository;
pub use favorite::FavoriteRepository;
pub use order::OrderRepository;
pub use payment_method::PaymentMethodRepository;
pub use product::ProductRepository;
pub use user::UserRepository;

use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use thiserror::Error;

/// Repository error
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(e: surrealdb::Error) -> Self {
        RepoError::Database(e.to_string())
    }
}

/// Repository result type
pub type RepoResult<T> = Result<T, RepoError>;

/// Base repository holding the shared database handle
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

/// Parse a "table:id" string into a RecordId
pub(crate) fn parse_id(id: &str) -> RepoResult<RecordId> {
    id.parse()
        .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))
}
