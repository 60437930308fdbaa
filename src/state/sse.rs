use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::sse::ServerEvent;

/// SSE-specific sub-state carved out from [`super::AppState`].
///
/// Subscriptions are per document: each battle id and each room code gets its
/// own hub, created lazily on first use and dropped once the document reaches
/// a terminal state.
pub struct SseState {
    capacity: usize,
    battles: DashMap<Uuid, Arc<SseHub>>,
    rooms: DashMap<String, Arc<SseHub>>,
}

impl SseState {
    /// Build the SSE sub-tree with the per-hub channel capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            battles: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    /// Hub fanning out events for one battle, created on first access.
    pub fn battle_hub(&self, id: Uuid) -> Arc<SseHub> {
        self.battles
            .entry(id)
            .or_insert_with(|| Arc::new(SseHub::new(self.capacity)))
            .clone()
    }

    /// Hub fanning out events for one room, created on first access.
    pub fn room_hub(&self, code: &str) -> Arc<SseHub> {
        self.rooms
            .entry(code.to_owned())
            .or_insert_with(|| Arc::new(SseHub::new(self.capacity)))
            .clone()
    }

    /// Drop the hub of a battle that reached a terminal state.
    ///
    /// Existing subscribers keep their receivers until their streams end.
    pub fn remove_battle_hub(&self, id: Uuid) {
        self.battles.remove(&id);
    }

    /// Drop the hub of a completed room.
    pub fn remove_room_hub(&self, code: &str) {
        self.rooms.remove(code);
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}
