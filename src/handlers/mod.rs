//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params)
//! 2. Validates it and calls the store or a service
//! 3. Returns HTTP response (JSON, status code)

/// Character management endpoints
pub mod characters;
/// Health check endpoint
pub mod health;
/// Gold transfer endpoint
pub mod transfers;
