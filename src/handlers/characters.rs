//! Character management HTTP handlers.
//!
//! This module implements the character-related API endpoints:
//! - GET /api/v1/characters - List all characters
//! - POST /api/v1/characters - Create a character
//! - GET /api/v1/characters/{id} - Get one character
//! - PUT /api/v1/characters/{id} - Update name and/or gold
//! - DELETE /api/v1/characters/{id} - Delete a character and its dependent rows

use crate::{
    error::AppError,
    models::character::{Character, CharacterId, CharacterUpdate, NewCharacter},
    routes::AppState,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

/// List all characters.
///
/// # Response (200 OK)
///
/// ```json
/// [
///   { "id": 2, "name": "Aragorn", "gold": 100 },
///   { "id": 1, "name": "Boromir", "gold": 50 }
/// ]
/// ```
///
/// # Ordering
///
/// By name, then id.
pub async fn list_characters(
    State(state): State<AppState>,
) -> Result<Json<Vec<Character>>, AppError> {
    let characters = state.store.fetch_all().await?;
    Ok(Json(characters))
}

/// Create a new character.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Aragorn",
///   "gold": 100
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the created character with its id
/// - **Error (400)**: blank name, negative gold, or a body that is not a
///   character object
///
/// A name that already exists creates a second, separate character.
pub async fn create_character(
    State(state): State<AppState>,
    payload: Result<Json<NewCharacter>, JsonRejection>,
) -> Result<(StatusCode, Json<Character>), AppError> {
    let Json(request) = payload?;
    let record = request.validate()?;
    let character = state.store.insert(record).await?;
    Ok((StatusCode::CREATED, Json(character)))
}

/// Get a specific character by ID.
///
/// - **Success (200 OK)**: the character
/// - **Error (404)**: no such character
pub async fn get_character(
    State(state): State<AppState>,
    Path(id): Path<CharacterId>,
) -> Result<Json<Character>, AppError> {
    let character = state.store.fetch_one(id).await?;
    Ok(Json(character))
}

/// Update a character's name and/or gold.
///
/// # Request Body
///
/// ```json
/// { "name": "Strider" }
/// ```
///
/// Omitted fields keep their current value. `gold` replaces the balance
/// outright; use transfers to move gold between characters.
pub async fn update_character(
    State(state): State<AppState>,
    Path(id): Path<CharacterId>,
    payload: Result<Json<CharacterUpdate>, JsonRejection>,
) -> Result<Json<Character>, AppError> {
    let Json(request) = payload?;
    let changes = request.validate()?;

    let character = if changes.is_empty() {
        state.store.fetch_one(id).await?
    } else {
        state.store.update(id, changes).await?
    };

    Ok(Json(character))
}

/// Delete a character together with its class links, spells, combat entries
/// and inventory.
///
/// - **Success (204 No Content)**
/// - **Error (404)**: no such character
pub async fn delete_character(
    State(state): State<AppState>,
    Path(id): Path<CharacterId>,
) -> Result<StatusCode, AppError> {
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
