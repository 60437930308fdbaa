//! Request and response payloads exposed over the HTTP API.

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Matchmaking payloads.
pub mod battle;
/// Health probe payloads.
pub mod health;
/// Judging submission payloads.
pub mod judge;
/// Contest room payloads.
pub mod room;
/// SSE event payloads.
pub mod sse;
/// Field-level validators shared by request DTOs.
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
