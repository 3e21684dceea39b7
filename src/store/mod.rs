//! Data-access seams for characters and their gold.
//!
//! Two traits split the store by concern:
//! - `CharacterRepository`: plain record access (list, create, update, delete)
//! - `BalanceStore` / `BalanceTransaction`: the transactional interface the
//!   transfer service runs its unit of work against
//!
//! `PgStore` implements both on PostgreSQL. `MemoryStore` implements both
//! in-process with the same locking semantics and backs the tests.

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::character::{Character, CharacterId, CharacterUpdate, NewCharacter},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Record-level access to characters.
///
/// Implementations validate nothing; callers pass records that already went
/// through `NewCharacter::validate` / `CharacterUpdate::validate`.
#[async_trait]
pub trait CharacterRepository: Send + Sync {
    /// All characters ordered by name, then id.
    async fn fetch_all(&self) -> Result<Vec<Character>, AppError>;

    async fn fetch_one(&self, id: CharacterId) -> Result<Character, AppError>;

    /// Create a character and return it with its store-assigned id.
    async fn insert(&self, record: NewCharacter) -> Result<Character, AppError>;

    /// Write the provided fields and return the updated row.
    async fn update(&self, id: CharacterId, changes: CharacterUpdate)
    -> Result<Character, AppError>;

    /// Remove a character together with its dependent rows.
    async fn delete(&self, id: CharacterId) -> Result<(), AppError>;

    /// Cheap connectivity check for health endpoints.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Source of transactions over character balances.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn begin_transaction(&self) -> Result<Box<dyn BalanceTransaction>, AppError>;
}

/// One open unit of work over character balances.
///
/// Locks taken by `lock_and_read_balance` are held until `commit` or
/// `rollback`. Dropping the handle without committing rolls back.
#[async_trait]
pub trait BalanceTransaction: Send {
    async fn entity_exists(&mut self, id: CharacterId) -> Result<bool, AppError>;

    /// Read the current gold of `id` and hold an exclusive lock on it.
    ///
    /// Blocks while another transaction holds the lock, up to the store's
    /// lock timeout, after which it fails with `AppError::TransientStore`.
    async fn lock_and_read_balance(&mut self, id: CharacterId) -> Result<i64, AppError>;

    /// Add `delta` (which may be negative) to the gold of `id`.
    async fn apply_balance_delta(&mut self, id: CharacterId, delta: i64) -> Result<(), AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

/// Everything the HTTP layer needs from a store.
pub trait CharacterStore: CharacterRepository + BalanceStore {}

impl<T> CharacterStore for T where T: CharacterRepository + BalanceStore {}
