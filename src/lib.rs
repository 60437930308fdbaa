//! Library crate for codeversus-back, exposing modules for binaries and integration tests.

/// Runtime configuration loading.
pub mod config;
/// Persistence layer: entities and the contest store backends.
pub mod dao;
/// HTTP request/response payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP route handlers.
pub mod routes;
/// Business logic services.
pub mod services;
/// Shared application state.
pub mod state;
