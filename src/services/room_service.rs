use axum::extract::ws::Message;
use log::info;
use tokio::sync::mpsc;

use crate::models::error::GameError;
use crate::models::message::{PlayerView, ServerEvent};
use crate::state::AppState;

/// Creates the room and seats the creator in it.
pub async fn create_room(
    state: &AppState,
    room_id: &str,
    name: &str,
    tx: mpsc::UnboundedSender<Message>,
) -> Result<(), GameError> {
    let session = state.registry.create(room_id).await?;
    let mut session = session.lock().await;

    let effects = match session.room.add_player(name) {
        Ok(effects) => effects,
        Err(e) => {
            // the fresh room must not linger without its creator
            drop(session);
            state.registry.remove(room_id).await;
            return Err(e);
        }
    };
    session.attach(name, tx);

    if let Some(player) = session.room.player(name) {
        session.send_to_player(
            name,
            &ServerEvent::RoomCreated {
                room_id: room_id.to_string(),
                player: PlayerView::of(player),
            },
        );
    }
    session.dispatch(&effects);
    info!("room {} created by {}", room_id, name);
    Ok(())
}

pub async fn join_room(
    state: &AppState,
    room_id: &str,
    name: &str,
    tx: mpsc::UnboundedSender<Message>,
) -> Result<(), GameError> {
    let session = state.registry.lookup(room_id).await?;
    let mut session = session.lock().await;

    let effects = session.room.add_player(name)?;
    session.attach(name, tx);

    if let Some(player) = session.room.player(name) {
        session.send_to_player(
            name,
            &ServerEvent::RoomJoined {
                room_id: room_id.to_string(),
                player: PlayerView::of(player),
                players: session.room.roster(),
            },
        );
    }
    session.dispatch(&effects);
    info!("{} joined room {}", name, room_id);
    Ok(())
}

/// Voluntary departure. Pending timers only die with the room itself.
pub async fn leave_room(state: &AppState, room_id: &str, name: &str) -> Result<(), GameError> {
    remove_member(state, room_id, name, false).await
}

/// Connection loss. Arrives unordered with respect to everything else, so it
/// also cancels the room's pending broadcast: the roster it was armed for is
/// gone.
pub async fn disconnect(state: &AppState, room_id: &str, name: &str) {
    if let Err(e) = remove_member(state, room_id, name, true).await {
        info!("disconnect cleanup for {} in {}: {}", name, room_id, e);
    }
}

async fn remove_member(
    state: &AppState,
    room_id: &str,
    name: &str,
    cancel_timer: bool,
) -> Result<(), GameError> {
    let session = state.registry.lookup(room_id).await?;
    let mut guard = session.lock().await;

    guard.detach(name);
    if cancel_timer {
        guard.cancel_pending_broadcast();
    }
    let effects = guard.room.remove_player(name);

    if guard.room.players.is_empty() {
        guard.cancel_pending_broadcast();
        drop(guard);
        state.registry.remove(room_id).await;
        info!("room {} is empty and was torn down", room_id);
        return Ok(());
    }

    guard.dispatch(&effects);
    Ok(())
}
