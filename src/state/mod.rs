//! Shared application state and the pure logic layered on top of it.

/// Status transition rules for rooms.
pub mod lifecycle;
/// Derived read-only views over room documents.
pub mod room;
mod sse;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    config::AppConfig,
    dao::contest_store::ContestStore,
    error::ServiceError,
    services::{catalog::ProblemCatalog, judge_service::JudgeClient},
};

pub use self::sse::{SseHub, SseState};

pub type SharedState = Arc<AppState>;

/// Central application state storing service handles and database handles.
pub struct AppState {
    contest_store: RwLock<Option<Arc<dyn ContestStore>>>,
    sse: SseState,
    catalog: Arc<dyn ProblemCatalog>,
    judge: Arc<dyn JudgeClient>,
    config: AppConfig,
    degraded: watch::Sender<bool>,
    matchmaking_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(
        config: AppConfig,
        catalog: Arc<dyn ProblemCatalog>,
        judge: Arc<dyn JudgeClient>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let sse = SseState::new(config.sse_channel_capacity);
        Arc::new(Self {
            contest_store: RwLock::new(None),
            sse,
            catalog,
            judge,
            config,
            degraded: degraded_tx,
            matchmaking_gate: Mutex::new(()),
        })
    }

    /// Obtain a handle to the current contest store, if one is installed.
    pub async fn contest_store(&self) -> Option<Arc<dyn ContestStore>> {
        let guard = self.contest_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the contest store or fail with the degraded-mode error.
    pub async fn require_contest_store(&self) -> Result<Arc<dyn ContestStore>, ServiceError> {
        self.contest_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new contest store implementation and leave degraded mode.
    pub async fn install_contest_store(&self, store: Arc<dyn ContestStore>) {
        {
            let mut guard = self.contest_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current contest store and enter degraded mode.
    pub async fn clear_contest_store(&self) {
        {
            let mut guard = self.contest_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.contest_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Per-document SSE hubs for battles and rooms.
    pub fn sse(&self) -> &SseState {
        &self.sse
    }

    /// Problem catalog collaborator.
    pub fn catalog(&self) -> &Arc<dyn ProblemCatalog> {
        &self.catalog
    }

    /// Judging collaborator.
    pub fn judge(&self) -> &Arc<dyn JudgeClient> {
        &self.judge
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// In-process gate serializing the scan-then-claim step of matchmaking.
    ///
    /// The store's conditional claim stays the real safeguard; the gate only
    /// keeps local seekers from scanning the same records at once.
    pub fn matchmaking_gate(&self) -> &Mutex<()> {
        &self.matchmaking_gate
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }
}
