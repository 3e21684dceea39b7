//! Character data models and API request/response types.
//!
//! This module defines:
//! - `Character`: a character row joined with its parent creature
//! - `NewCharacter`: request body for creating characters
//! - `CharacterUpdate`: request body for field-level updates
//! - `CreatureStats`: the stat block every new character starts with

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Store-assigned identifier shared by a creature and its character row.
pub type CharacterId = i32;

/// A character as shown to clients.
///
/// # Database Tables
///
/// `id` and `name` come from `creatures` (`creature_id`, `creature_name`),
/// `gold` comes from `characters`. The two rows share the same id.
///
/// Gold is an integer number of gold pieces and is never negative
/// (enforced by a database CHECK constraint).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub gold: i64,
}

/// Request body for creating a new character.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Aragorn",
///   "gold": 100
/// }
/// ```
///
/// # Validation
///
/// - `name`: Required, must not be blank
/// - `gold`: Optional, defaults to 0, must not be negative
#[derive(Debug, Clone, Deserialize)]
pub struct NewCharacter {
    pub name: String,

    #[serde(default)]
    pub gold: i64,
}

impl NewCharacter {
    pub fn new(name: impl Into<String>, gold: i64) -> Self {
        Self {
            name: name.into(),
            gold,
        }
    }

    /// Check field rules and return the record with its name trimmed.
    pub fn validate(self) -> Result<Self, AppError> {
        Ok(Self {
            name: validate_name(&self.name)?,
            gold: validate_gold(self.gold)?,
        })
    }
}

/// Request body for updating a character.
///
/// Every field is optional; only the provided ones are written.
/// Gold written here is an absolute value, unlike transfers which apply deltas.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterUpdate {
    pub name: Option<String>,
    pub gold: Option<i64>,
}

impl CharacterUpdate {
    pub fn validate(self) -> Result<Self, AppError> {
        Ok(Self {
            name: self.name.as_deref().map(validate_name).transpose()?,
            gold: self.gold.map(validate_gold).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.gold.is_none()
    }
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidRequest(
            "Character name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_gold(gold: i64) -> Result<i64, AppError> {
    if gold < 0 {
        return Err(AppError::InvalidRequest(format!(
            "Gold cannot be negative, got {gold}"
        )));
    }
    Ok(gold)
}

/// Creature type stored for every row this service manages.
pub const CHARACTER_CREATURE_TYPE: &str = "Character";

/// Stat block written to `creatures` when a character is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatureStats {
    pub hit_points: i32,
    pub armor_class: i32,
    pub speed: i32,
    pub size: &'static str,
    pub level: i32,
    pub is_homebrew: bool,
}

impl CreatureStats {
    pub const STARTER: CreatureStats = CreatureStats {
        hit_points: 50,
        armor_class: 10,
        speed: 30,
        size: "Medium",
        level: 1,
        is_homebrew: false,
    };
}

/// Race and class names linked to newly created characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterDefaults {
    pub race: String,
    pub class: String,
}

impl Default for CharacterDefaults {
    fn default() -> Self {
        Self {
            race: "Human".to_string(),
            class: "Fighter".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_character_name_is_trimmed() {
        let record = NewCharacter::new("  Gimli ", 10).validate().unwrap();
        assert_eq!(record.name, "Gimli");
        assert_eq!(record.gold, 10);
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = NewCharacter::new("   ", 10).validate().unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn negative_starting_gold_is_rejected() {
        let err = NewCharacter::new("Gimli", -1).validate().unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn gold_defaults_to_zero_when_omitted() {
        let record: NewCharacter = serde_json::from_str(r#"{"name":"Legolas"}"#).unwrap();
        assert_eq!(record.gold, 0);
    }

    #[test]
    fn update_validates_only_provided_fields() {
        let update = CharacterUpdate {
            name: None,
            gold: Some(5),
        }
        .validate()
        .unwrap();
        assert_eq!(update.gold, Some(5));
        assert!(update.name.is_none());

        let err = CharacterUpdate {
            name: Some(String::new()),
            gold: None,
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(CharacterUpdate::default().is_empty());
    }
}
