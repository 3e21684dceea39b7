//! PostgreSQL store.
//!
//! Table and column names are fixed SQL literals; every value is a bound
//! parameter. Multi-row writes (create, delete) run inside one database
//! transaction each.

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use super::{BalanceStore, BalanceTransaction, CharacterRepository};
use crate::{
    db::DbPool,
    error::AppError,
    models::character::{
        CHARACTER_CREATURE_TYPE, Character, CharacterDefaults, CharacterId, CharacterUpdate,
        CreatureStats, NewCharacter,
    },
};

const SELECT_CHARACTERS: &str = r#"
    SELECT c.creature_id AS id, c.creature_name AS name, ch.gold AS gold
    FROM creatures c
    JOIN characters ch ON ch.character_id = c.creature_id
    WHERE c.creature_type = 'Character'
    ORDER BY c.creature_name, c.creature_id
"#;

const SELECT_CHARACTER: &str = r#"
    SELECT c.creature_id AS id, c.creature_name AS name, ch.gold AS gold
    FROM creatures c
    JOIN characters ch ON ch.character_id = c.creature_id
    WHERE c.creature_id = $1 AND c.creature_type = 'Character'
"#;

/// Character store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
    defaults: CharacterDefaults,
}

impl PgStore {
    pub fn new(pool: DbPool, defaults: CharacterDefaults) -> Self {
        Self { pool, defaults }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Lock the `characters` row of `id`, failing with `CharacterNotFound` if absent.
async fn lock_character_row(
    tx: &mut Transaction<'static, Postgres>,
    id: CharacterId,
) -> Result<i64, AppError> {
    sqlx::query_scalar("SELECT gold FROM characters WHERE character_id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::CharacterNotFound(id))
}

#[async_trait]
impl CharacterRepository for PgStore {
    async fn fetch_all(&self) -> Result<Vec<Character>, AppError> {
        let characters = sqlx::query_as::<_, Character>(SELECT_CHARACTERS)
            .fetch_all(&self.pool)
            .await?;
        Ok(characters)
    }

    async fn fetch_one(&self, id: CharacterId) -> Result<Character, AppError> {
        sqlx::query_as::<_, Character>(SELECT_CHARACTER)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::CharacterNotFound(id))
    }

    async fn insert(&self, record: NewCharacter) -> Result<Character, AppError> {
        let stats = CreatureStats::STARTER;
        let mut tx = self.pool.begin().await?;

        // Parent creature row first; it assigns the id the character row shares
        let id: CharacterId = sqlx::query_scalar(
            r#"
            INSERT INTO creatures (
                creature_type, creature_name, hit_points, armor_class, speed, size, level, is_homebrew
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING creature_id
            "#,
        )
        .bind(CHARACTER_CREATURE_TYPE)
        .bind(&record.name)
        .bind(stats.hit_points)
        .bind(stats.armor_class)
        .bind(stats.speed)
        .bind(stats.size)
        .bind(stats.level)
        .bind(stats.is_homebrew)
        .fetch_one(&mut *tx)
        .await?;

        let race_id: Option<i32> =
            sqlx::query_scalar("SELECT race_id FROM races WHERE race_name = $1 LIMIT 1")
                .bind(&self.defaults.race)
                .fetch_optional(&mut *tx)
                .await?;

        let class_id: Option<i32> =
            sqlx::query_scalar("SELECT class_id FROM classes WHERE class_name = $1 LIMIT 1")
                .bind(&self.defaults.class)
                .fetch_optional(&mut *tx)
                .await?;

        sqlx::query(
            "INSERT INTO characters (character_id, race_id, class_id, gold) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(race_id)
        .bind(class_id)
        .bind(record.gold)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(character_id = id, name = %record.name, "Character created");

        Ok(Character {
            id,
            name: record.name,
            gold: record.gold,
        })
    }

    async fn update(
        &self,
        id: CharacterId,
        changes: CharacterUpdate,
    ) -> Result<Character, AppError> {
        let mut tx = self.pool.begin().await?;

        // Serialize with in-flight transfers on this row
        lock_character_row(&mut tx, id).await?;

        if let Some(name) = &changes.name {
            sqlx::query("UPDATE creatures SET creature_name = $1 WHERE creature_id = $2")
                .bind(name)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(gold) = changes.gold {
            sqlx::query("UPDATE characters SET gold = $1 WHERE character_id = $2")
                .bind(gold)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let character = sqlx::query_as::<_, Character>(SELECT_CHARACTER)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::CharacterNotFound(id))?;

        tx.commit().await?;

        Ok(character)
    }

    async fn delete(&self, id: CharacterId) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        lock_character_row(&mut tx, id).await?;

        // Dependents first, then the character, then its creature
        sqlx::query("DELETE FROM character_classes WHERE character_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM character_spells WHERE character_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM character_combats WHERE creature_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM inventory WHERE creature_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM characters WHERE character_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM creatures WHERE creature_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(character_id = id, "Character deleted");

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl BalanceStore for PgStore {
    async fn begin_transaction(&self) -> Result<Box<dyn BalanceTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgBalanceTransaction { tx }))
    }
}

/// Open PostgreSQL transaction over character balances.
///
/// sqlx rolls the transaction back when it is dropped uncommitted.
pub struct PgBalanceTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BalanceTransaction for PgBalanceTransaction {
    async fn entity_exists(&mut self, id: CharacterId) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM characters WHERE character_id = $1)")
                .bind(id)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn lock_and_read_balance(&mut self, id: CharacterId) -> Result<i64, AppError> {
        lock_character_row(&mut self.tx, id).await
    }

    async fn apply_balance_delta(&mut self, id: CharacterId, delta: i64) -> Result<(), AppError> {
        let updated = sqlx::query("UPDATE characters SET gold = gold + $1 WHERE character_id = $2")
            .bind(delta)
            .bind(id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(AppError::CharacterNotFound(id));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
