//! Data models representing database entities and API payloads.

/// Character and creature model
pub mod character;
/// Gold transfer request and outcome
pub mod transfer;
