//! Shared fixtures for service tests.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::{
    config::AppConfig,
    dao::{contest_store::ContestStore, contest_store::memory::MemoryContestStore},
    error::ServiceError,
    services::{
        catalog::{ProblemCatalog, StaticCatalog},
        judge_service::{JudgeClient, Submission, Verdict},
    },
    state::{AppState, SharedState},
};

/// Judge stub that accepts everything immediately.
pub(crate) struct AcceptingJudge;

impl JudgeClient for AcceptingJudge {
    fn submit(&self, _submission: Submission) -> BoxFuture<'static, Result<String, ServiceError>> {
        Box::pin(async { Ok("stub-token".to_owned()) })
    }

    fn fetch(&self, _token: String) -> BoxFuture<'static, Result<Verdict, ServiceError>> {
        Box::pin(async {
            Ok(Verdict {
                status_id: 3,
                status_description: "Accepted".to_owned(),
                stdout: None,
                stderr: None,
                compile_output: None,
            })
        })
    }
}

/// Application state backed by the in-memory store and the built-in catalog.
pub(crate) async fn test_state() -> SharedState {
    test_state_with_catalog(StaticCatalog::builtin()).await
}

/// Application state with a caller-provided catalog.
pub(crate) async fn test_state_with_catalog(catalog: StaticCatalog) -> SharedState {
    let state = AppState::new(AppConfig::default(), Arc::new(catalog), Arc::new(AcceptingJudge));
    let store: Arc<dyn ContestStore> = Arc::new(MemoryContestStore::new());
    state.install_contest_store(store).await;
    state
}
