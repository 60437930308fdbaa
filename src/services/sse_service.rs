//! SSE stream plumbing.
//!
//! Every stream is snapshot-first: the current document state is pushed as
//! the first event before any broadcast is forwarded, so a subscriber that
//! connects after a once-only event (a battle claim, a completion) still
//! observes the outcome.

use std::{convert::Infallible, time::Duration, time::SystemTime};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::sse::ServerEvent,
    error::ServiceError,
    services::{matchmaking_service, room_service, sse_events},
    state::{SharedState, room::remaining_seconds},
};

/// Subscribe to one battle's event stream.
///
/// Returns the broadcast receiver plus the snapshot event to emit first.
pub async fn subscribe_battle(
    state: &SharedState,
    battle_id: Uuid,
) -> Result<(broadcast::Receiver<ServerEvent>, Option<ServerEvent>), ServiceError> {
    let battle = matchmaking_service::get_battle(state, battle_id).await?;
    // Subscribe before building the snapshot so nothing lands in between.
    let receiver = state.sse().battle_hub(battle_id).subscribe();
    let snapshot = sse_events::battle_snapshot_event(battle);
    Ok((receiver, snapshot))
}

/// Subscribe to one room's event stream.
pub async fn subscribe_room(
    state: &SharedState,
    code: &str,
) -> Result<(broadcast::Receiver<ServerEvent>, Option<ServerEvent>), ServiceError> {
    let room = room_service::get_room(state, code).await?;
    let receiver = state.sse().room_hub(code).subscribe();
    let remaining = remaining_seconds(&room, state.config().contest_duration, SystemTime::now());
    let snapshot = sse_events::room_snapshot_event(room, remaining);
    Ok((receiver, snapshot))
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// logging once the client disconnects.
pub fn to_sse_stream(
    snapshot: Option<ServerEvent>,
    mut receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: emits the snapshot, then reads from broadcast and
    // pushes into mpsc
    tokio::spawn(async move {
        if let Some(payload) = snapshot {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive.
                            continue;
                        }
                    }
                }
            }
        }

        tracing::debug!("SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}
