/// Problem catalog collaborator.
pub mod catalog;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Client for the external judging service.
pub mod judge_service;
/// 1v1 matchmaking coordination.
pub mod matchmaking_service;
/// Solve reconciliation for running contests.
pub mod progress_service;
/// Contest room lifecycle management.
pub mod room_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor.
pub mod storage_supervisor;

#[cfg(test)]
pub(crate) mod test_support;
