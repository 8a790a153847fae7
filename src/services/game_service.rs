use std::collections::HashMap;
use std::time::Duration;

use log::info;

use crate::models::error::GameError;
use crate::models::game::GamePhase;
use crate::models::message::ServerEvent;
use crate::models::role::Role;
use crate::state::AppState;

pub async fn start_game(
    state: &AppState,
    room_id: &str,
    role_counts: HashMap<Role, usize>,
) -> Result<(), GameError> {
    let session = state.registry.lookup(room_id).await?;
    let mut session = session.lock().await;

    let mut rng = rand::thread_rng();
    let effects = session.room.start_game(role_counts, &mut rng)?;
    session.dispatch(&effects);
    info!(
        "game started in room {} with {} players",
        room_id,
        session.room.players.len()
    );
    Ok(())
}

pub async fn submit_selection(
    state: &AppState,
    room_id: &str,
    name: &str,
    target: &str,
    phase: GamePhase,
) -> Result<(), GameError> {
    let session = state.registry.lookup(room_id).await?;
    let mut session = session.lock().await;

    let effects = session.room.submit_selection(name, target, phase)?;
    session.dispatch(&effects);
    Ok(())
}

pub async fn acknowledge_phase(state: &AppState, room_id: &str, name: &str) -> Result<(), GameError> {
    let session = state.registry.lookup(room_id).await?;
    let mut session = session.lock().await;

    let effects = session.room.acknowledge_phase(name)?;
    session.dispatch(&effects);
    Ok(())
}

pub async fn ready(state: &AppState, room_id: &str, name: &str) -> Result<(), GameError> {
    let session = state.registry.lookup(room_id).await?;
    let mut session = session.lock().await;

    let effects = session.room.toggle_ready(name)?;
    session.dispatch(&effects);
    Ok(())
}

pub async fn chat(
    state: &AppState,
    room_id: &str,
    name: &str,
    message: &str,
    phase: GamePhase,
) -> Result<(), GameError> {
    let session = state.registry.lookup(room_id).await?;
    let mut session = session.lock().await;

    let effects = session.room.chat(name, message, phase)?;
    session.dispatch(&effects);
    Ok(())
}

/// Arms the room's single-shot timer. Re-arming replaces the previous timer;
/// a timer that outlives its room fires into nothing.
pub async fn schedule_delayed_broadcast(
    state: &AppState,
    room_id: &str,
    delay_ms: u64,
) -> Result<(), GameError> {
    let session = state.registry.lookup(room_id).await?;
    let mut guard = session.lock().await;

    guard.cancel_pending_broadcast();

    let state = state.clone();
    let room_id = room_id.to_string();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        if let Ok(session) = state.registry.lookup(&room_id).await {
            let mut guard = session.lock().await;
            guard.pending_broadcast = None;
            guard.send_to_room(&ServerEvent::DelayElapsed);
        }
    });
    guard.pending_broadcast = Some(handle);
    Ok(())
}
