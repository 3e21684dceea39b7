//! Character gold service.
//!
//! Record management for tabletop-game characters and their gold, plus an
//! atomic, deadlock-free gold transfer between two characters.
//!
//! # Layout
//!
//! - [`store`]: data-access traits with PostgreSQL and in-memory implementations
//! - [`services::transfer_service`]: the transfer unit of work
//! - [`handlers`] / [`routes`]: JSON API over both

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
