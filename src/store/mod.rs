//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! handlers
//!     → UserStore (port, object-safe via async_trait)
//!         → memory.rs   (DashMap, tests and local runs)
//!         → postgres.rs (sqlx PgPool, production)
//! ```
//!
//! # Design Decisions
//! - "Not found" is a variant of [`StoreError`], never inferred from message text
//! - Deletion is soft: deleted rows stay in storage but are invisible to every operation
//! - One storage call per operation; no multi-call transactions

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{User, UserId, UserInput};

pub use memory::MemoryUserStore;
pub use postgres::PostgresUserStore;

/// Errors reported by a [`UserStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No live record with the requested id.
    #[error("record not found")]
    NotFound,

    /// Any other storage failure; the message is passed through to clients.
    #[error("{0}")]
    Database(String),
}

impl StoreError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Durable CRUD operations on user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new record; the store assigns the id and timestamps.
    async fn create(&self, input: UserInput) -> Result<User, StoreError>;

    /// Load a live record.
    async fn find_by_id(&self, id: UserId) -> Result<User, StoreError>;

    /// Overwrite the attributes of `existing` and return the stored result.
    async fn update_fields(&self, existing: &User, fields: UserInput) -> Result<User, StoreError>;

    /// Mark a record deleted. Deleting an absent record is not an error.
    async fn delete_by_id(&self, id: UserId) -> Result<(), StoreError>;

    /// Check that the backing storage is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
