//! PostgreSQL store tests.
//!
//! These need a live server: set `DATABASE_URL` and run
//! `cargo test -- --ignored`. `#[sqlx::test]` creates a fresh database per
//! test and applies `./migrations`.

use std::time::Duration;

use character_gold_server::{
    db,
    error::AppError,
    models::{
        character::{CharacterDefaults, CharacterUpdate, NewCharacter},
        transfer::TransferRequest,
    },
    services::transfer_service::{execute_transfer, transfer_balance},
    store::{CharacterRepository, PgStore},
};
use sqlx::PgPool;

fn store(pool: PgPool) -> PgStore {
    PgStore::new(pool, CharacterDefaults::default())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn transfer_scenario(pool: PgPool) {
    let store = store(pool);
    let a = store.insert(NewCharacter::new("A", 100)).await.unwrap();
    let b = store.insert(NewCharacter::new("B", 50)).await.unwrap();

    let outcome = transfer_balance(&store, a.id, b.id, 30).await;
    assert!(outcome.ok, "{}", outcome.message);
    assert_eq!(store.fetch_one(a.id).await.unwrap().gold, 70);
    assert_eq!(store.fetch_one(b.id).await.unwrap().gold, 80);

    let err = execute_transfer(
        &store,
        TransferRequest {
            from_id: a.id,
            to_id: b.id,
            amount: 1000,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientGold {
            available: 70,
            requested: 1000
        }
    ));
    assert_eq!(store.fetch_one(a.id).await.unwrap().gold, 70);
    assert_eq!(store.fetch_one(b.id).await.unwrap().gold, 80);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn opposite_direction_transfers_complete(pool: PgPool) {
    let store = store(pool);
    let a = store.insert(NewCharacter::new("A", 500)).await.unwrap();
    let b = store.insert(NewCharacter::new("B", 500)).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..40 {
        let store = store.clone();
        let (from, to) = if i % 2 == 0 { (a.id, b.id) } else { (b.id, a.id) };
        handles.push(tokio::spawn(async move {
            transfer_balance(&store, from, to, 3).await
        }));
    }
    for handle in handles {
        let outcome = handle.await.unwrap();
        assert!(outcome.ok, "{}", outcome.message);
    }

    assert_eq!(store.fetch_one(a.id).await.unwrap().gold, 500);
    assert_eq!(store.fetch_one(b.id).await.unwrap().gold, 500);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn insert_links_default_race_and_class(pool: PgPool) {
    let store = store(pool);
    let character = store.insert(NewCharacter::new("Eowyn", 10)).await.unwrap();

    let (race, class): (Option<String>, Option<String>) = sqlx::query_as(
        r#"
        SELECT r.race_name, cl.class_name
        FROM characters ch
        LEFT JOIN races r ON r.race_id = ch.race_id
        LEFT JOIN classes cl ON cl.class_id = ch.class_id
        WHERE ch.character_id = $1
        "#,
    )
    .bind(character.id)
    .fetch_one(store.pool())
    .await
    .unwrap();

    assert_eq!(race.as_deref(), Some("Human"));
    assert_eq!(class.as_deref(), Some("Fighter"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn update_and_delete_with_dependents(pool: PgPool) {
    let store = store(pool);
    let character = store.insert(NewCharacter::new("Faramir", 10)).await.unwrap();

    let updated = store
        .update(
            character.id,
            CharacterUpdate {
                name: None,
                gold: Some(99),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.gold, 99);
    assert_eq!(updated.name, "Faramir");

    sqlx::query("INSERT INTO inventory (creature_id, item_name) VALUES ($1, 'Horn')")
        .bind(character.id)
        .execute(store.pool())
        .await
        .unwrap();
    sqlx::query("INSERT INTO character_spells (character_id, spell_name) VALUES ($1, 'Light')")
        .bind(character.id)
        .execute(store.pool())
        .await
        .unwrap();

    store.delete(character.id).await.unwrap();

    assert!(matches!(
        store.fetch_one(character.id).await,
        Err(AppError::CharacterNotFound(_))
    ));
    let leftovers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory WHERE creature_id = $1")
        .bind(character.id)
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(leftovers, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn lock_timeout_is_reported_as_retryable(pool: PgPool) {
    let store = store(pool.clone());
    let a = store.insert(NewCharacter::new("A", 100)).await.unwrap();
    let b = store.insert(NewCharacter::new("B", 50)).await.unwrap();

    let mut holder = pool.begin().await.unwrap();
    sqlx::query("SELECT gold FROM characters WHERE character_id = $1 FOR UPDATE")
        .bind(b.id)
        .execute(&mut *holder)
        .await
        .unwrap();

    let short_wait = db::pool_options(2, Duration::from_millis(100))
        .connect_with((*pool.connect_options()).clone())
        .await
        .unwrap();
    let contended = PgStore::new(short_wait, CharacterDefaults::default());

    // 55P03 lock_not_available
    let outcome = transfer_balance(&contended, a.id, b.id, 30).await;
    assert!(!outcome.ok);
    assert!(outcome.retryable, "{}", outcome.message);
    assert_eq!(outcome.code, Some("transient_store_error"));

    holder.rollback().await.unwrap();
    assert_eq!(store.fetch_one(a.id).await.unwrap().gold, 100);
    assert_eq!(store.fetch_one(b.id).await.unwrap().gold, 50);

    let outcome = transfer_balance(&contended, a.id, b.id, 30).await;
    assert!(outcome.ok, "{}", outcome.message);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn other_creatures_are_not_characters(pool: PgPool) {
    let store = store(pool);
    let hero = store.insert(NewCharacter::new("Eomer", 10)).await.unwrap();

    let monster_id: i32 = sqlx::query_scalar(
        "INSERT INTO creatures (creature_type, creature_name) VALUES ('Monster', 'Troll') RETURNING creature_id",
    )
    .fetch_one(store.pool())
    .await
    .unwrap();
    sqlx::query("INSERT INTO characters (character_id, gold) VALUES ($1, 7)")
        .bind(monster_id)
        .execute(store.pool())
        .await
        .unwrap();

    assert!(matches!(
        store.fetch_one(monster_id).await,
        Err(AppError::CharacterNotFound(id)) if id == monster_id
    ));
    let listed: Vec<_> = store
        .fetch_all()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(listed, vec![hero.id]);
}
