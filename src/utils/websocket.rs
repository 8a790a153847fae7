use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::sink::SinkExt;
use futures::stream::StreamExt;
use tokio::sync::mpsc;
use tracing::info;

use crate::models::error::GameError;
use crate::models::message::{ClientEvent, ServerEvent};
use crate::services::{game_service, room_service};
use crate::state::AppState;

/// What a connection knows about itself once it created or joined a room.
#[derive(Default)]
struct ConnectionIdentity {
    room_id: Option<String>,
    name: Option<String>,
}

impl ConnectionIdentity {
    fn as_pair(&self) -> Option<(&str, &str)> {
        match (&self.room_id, &self.name) {
            (Some(room_id), Some(name)) => Some((room_id, name)),
            _ => None,
        }
    }
}

pub async fn handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One task per connection: decode events, hand them to the owning room, and
/// forward whatever the rooms address to this player. Closing the socket is
/// the disconnect signal.
pub async fn handle_socket(ws: WebSocket, state: AppState) {
    info!("new WebSocket connection established");
    let (mut sender, mut receiver) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut identity = ConnectionIdentity::default();
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    if let Err(e) = dispatch(&state, &mut identity, event, &tx).await {
                        send_error(&tx, &e.to_string());
                    }
                }
                Err(e) => send_error(&tx, &format!("unrecognized event: {}", e)),
            }
        }
    }

    if let (Some(room_id), Some(name)) = (identity.room_id.take(), identity.name.take()) {
        info!("connection of {} in room {} closed", name, room_id);
        room_service::disconnect(&state, &room_id, &name).await;
    }
    send_task.abort();
}

async fn dispatch(
    state: &AppState,
    identity: &mut ConnectionIdentity,
    event: ClientEvent,
    tx: &mpsc::UnboundedSender<Message>,
) -> Result<(), GameError> {
    match event {
        ClientEvent::CreateRoom { room_id, name } => {
            if identity.as_pair().is_some() {
                send_error(tx, "already in a room");
                return Ok(());
            }
            room_service::create_room(state, &room_id, &name, tx.clone()).await?;
            identity.room_id = Some(room_id);
            identity.name = Some(name);
        }
        ClientEvent::JoinRoom { room_id, name } => {
            if identity.as_pair().is_some() {
                send_error(tx, "already in a room");
                return Ok(());
            }
            room_service::join_room(state, &room_id, &name, tx.clone()).await?;
            identity.room_id = Some(room_id);
            identity.name = Some(name);
        }
        ClientEvent::LeaveRoom => {
            if let Some((room_id, name)) = identity.as_pair() {
                let (room_id, name) = (room_id.to_string(), name.to_string());
                identity.room_id = None;
                identity.name = None;
                room_service::leave_room(state, &room_id, &name).await?;
            }
        }
        ClientEvent::Chat { message, phase } => {
            let Some((room_id, name)) = identity.as_pair() else {
                send_error(tx, "join a room first");
                return Ok(());
            };
            game_service::chat(state, room_id, name, &message, phase).await?;
        }
        ClientEvent::Ready => {
            let Some((room_id, name)) = identity.as_pair() else {
                send_error(tx, "join a room first");
                return Ok(());
            };
            game_service::ready(state, room_id, name).await?;
        }
        ClientEvent::StartGame { role_counts } => {
            let Some((room_id, _)) = identity.as_pair() else {
                send_error(tx, "join a room first");
                return Ok(());
            };
            game_service::start_game(state, room_id, role_counts).await?;
        }
        ClientEvent::SelectTarget { target_name, phase } => {
            let Some((room_id, name)) = identity.as_pair() else {
                send_error(tx, "join a room first");
                return Ok(());
            };
            game_service::submit_selection(state, room_id, name, &target_name, phase).await?;
        }
        ClientEvent::AcknowledgePhase => {
            let Some((room_id, name)) = identity.as_pair() else {
                send_error(tx, "join a room first");
                return Ok(());
            };
            game_service::acknowledge_phase(state, room_id, name).await?;
        }
        ClientEvent::ScheduleDelayedBroadcast { delay_ms } => {
            let Some((room_id, _)) = identity.as_pair() else {
                send_error(tx, "join a room first");
                return Ok(());
            };
            game_service::schedule_delayed_broadcast(state, room_id, delay_ms).await?;
        }
    }
    Ok(())
}

/// Errors only ever go back to the player who caused them.
fn send_error(tx: &mpsc::UnboundedSender<Message>, message: &str) {
    let event = ServerEvent::Error {
        message: message.to_string(),
    };
    if let Ok(text) = serde_json::to_string(&event) {
        let _ = tx.send(Message::Text(text));
    }
}
