//! In-process character store.
//!
//! Committed values live in the index and are read under a short
//! synchronous mutex, so listings and lookups never wait on row locks.
//! Each row also carries its own async writer lock: a transaction that locks
//! a row excludes every other transaction, update and delete touching that
//! row until it commits or rolls back. Deltas are staged in the transaction
//! and published to the index in one step at commit, so readers see either
//! all of a transfer or none of it; dropping the transaction discards them.

use async_trait::async_trait;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use super::{BalanceStore, BalanceTransaction, CharacterRepository};
use crate::{
    error::AppError,
    models::character::{Character, CharacterId, CharacterUpdate, NewCharacter},
};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

type WriteGuard = OwnedMutexGuard<()>;

#[derive(Debug)]
struct Row {
    name: String,
    gold: i64,
    /// Held by whoever is about to change this row.
    write_lock: Arc<RowLock<()>>,
}

impl Row {
    fn to_character(&self, id: CharacterId) -> Character {
        Character {
            id,
            name: self.name.clone(),
            gold: self.gold,
        }
    }
}

#[derive(Debug, Default)]
struct Index {
    last_id: CharacterId,
    rows: BTreeMap<CharacterId, Row>,
}

#[derive(Debug)]
struct Shared {
    index: Mutex<Index>,
    lock_timeout: Duration,
}

impl Shared {
    fn index(&self) -> MutexGuard<'_, Index> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn committed_gold(&self, id: CharacterId) -> Result<i64, AppError> {
        self.index()
            .rows
            .get(&id)
            .map(|row| row.gold)
            .ok_or(AppError::CharacterNotFound(id))
    }

    async fn lock_row(&self, id: CharacterId) -> Result<WriteGuard, AppError> {
        let write_lock = self
            .index()
            .rows
            .get(&id)
            .map(|row| Arc::clone(&row.write_lock))
            .ok_or(AppError::CharacterNotFound(id))?;

        let guard = tokio::time::timeout(self.lock_timeout, write_lock.lock_owned())
            .await
            .map_err(|_| {
                AppError::TransientStore(format!("lock wait timeout on character {id}"))
            })?;

        // Deleted while this caller was queued; ids are never reused
        if !self.index().rows.contains_key(&id) {
            return Err(AppError::CharacterNotFound(id));
        }
        Ok(guard)
    }
}

/// Character store held entirely in memory.
///
/// Cloning yields another handle to the same rows.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Store whose row-lock waits give up after `lock_timeout`.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                index: Mutex::new(Index::default()),
                lock_timeout,
            }),
        }
    }
}

#[async_trait]
impl CharacterRepository for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<Character>, AppError> {
        let mut characters: Vec<Character> = self
            .shared
            .index()
            .rows
            .iter()
            .map(|(id, row)| row.to_character(*id))
            .collect();
        characters.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(characters)
    }

    async fn fetch_one(&self, id: CharacterId) -> Result<Character, AppError> {
        self.shared
            .index()
            .rows
            .get(&id)
            .map(|row| row.to_character(id))
            .ok_or(AppError::CharacterNotFound(id))
    }

    async fn insert(&self, record: NewCharacter) -> Result<Character, AppError> {
        let mut index = self.shared.index();
        index.last_id += 1;
        let id = index.last_id;

        let row = Row {
            name: record.name,
            gold: record.gold,
            write_lock: Arc::new(RowLock::new(())),
        };
        let character = row.to_character(id);
        index.rows.insert(id, row);

        Ok(character)
    }

    async fn update(
        &self,
        id: CharacterId,
        changes: CharacterUpdate,
    ) -> Result<Character, AppError> {
        let _guard = self.shared.lock_row(id).await?;

        let mut index = self.shared.index();
        let row = index
            .rows
            .get_mut(&id)
            .ok_or(AppError::CharacterNotFound(id))?;
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(gold) = changes.gold {
            row.gold = gold;
        }

        Ok(row.to_character(id))
    }

    async fn delete(&self, id: CharacterId) -> Result<(), AppError> {
        let _guard = self.shared.lock_row(id).await?;
        self.shared.index().rows.remove(&id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl BalanceStore for MemoryStore {
    async fn begin_transaction(&self) -> Result<Box<dyn BalanceTransaction>, AppError> {
        Ok(Box::new(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            locked: BTreeMap::new(),
            pending: HashMap::new(),
        }))
    }
}

/// Open transaction over `MemoryStore` balances.
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    locked: BTreeMap<CharacterId, WriteGuard>,
    pending: HashMap<CharacterId, i64>,
}

impl MemoryTransaction {
    async fn ensure_locked(&mut self, id: CharacterId) -> Result<(), AppError> {
        if !self.locked.contains_key(&id) {
            let guard = self.shared.lock_row(id).await?;
            self.locked.insert(id, guard);
        }
        Ok(())
    }

    /// Gold as seen inside this transaction, staged deltas included.
    async fn current_gold(&mut self, id: CharacterId) -> Result<i64, AppError> {
        self.ensure_locked(id).await?;
        let committed = self.shared.committed_gold(id)?;
        Ok(committed + self.pending.get(&id).copied().unwrap_or(0))
    }
}

#[async_trait]
impl BalanceTransaction for MemoryTransaction {
    async fn entity_exists(&mut self, id: CharacterId) -> Result<bool, AppError> {
        Ok(self.shared.index().rows.contains_key(&id))
    }

    async fn lock_and_read_balance(&mut self, id: CharacterId) -> Result<i64, AppError> {
        self.current_gold(id).await
    }

    async fn apply_balance_delta(&mut self, id: CharacterId, delta: i64) -> Result<(), AppError> {
        let current = self.current_gold(id).await?;
        let next = current.checked_add(delta).ok_or_else(|| {
            AppError::InvalidRequest(format!("gold of character {id} would overflow"))
        })?;

        // Same rule the database enforces with CHECK (gold >= 0)
        if next < 0 {
            return Err(AppError::InsufficientGold {
                available: current,
                requested: -delta,
            });
        }

        *self.pending.entry(id).or_insert(0) += delta;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryTransaction {
            shared,
            locked,
            pending,
        } = *self;

        {
            let mut index = shared.index();
            for (id, delta) in pending {
                if let Some(row) = index.rows.get_mut(&id) {
                    row.gold += delta;
                }
            }
        }
        // Row locks are released only after every delta is visible
        drop(locked);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        Ok(())
    }
}
