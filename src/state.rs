use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::models::error::GameError;
use crate::models::message::{Outbound, ServerEvent};
use crate::models::room::Room;

pub type SharedRoomSession = Arc<Mutex<RoomSession>>;

/// One live room: its game state plus the transport senders of its members
/// and the (at most one) pending delayed broadcast. Everything is guarded by
/// the session's mutex, so events for the same room apply serially.
#[derive(Debug)]
pub struct RoomSession {
    pub room: Room,
    connections: HashMap<String, mpsc::UnboundedSender<Message>>,
    pub pending_broadcast: Option<JoinHandle<()>>,
}

impl RoomSession {
    pub fn new(room: Room) -> Self {
        RoomSession {
            room,
            connections: HashMap::new(),
            pending_broadcast: None,
        }
    }

    pub fn attach(&mut self, name: &str, tx: mpsc::UnboundedSender<Message>) {
        self.connections.insert(name.to_string(), tx);
    }

    pub fn detach(&mut self, name: &str) {
        self.connections.remove(name);
    }

    /// Arming a new timer replaces the old one, never stacks on it.
    pub fn cancel_pending_broadcast(&mut self) {
        if let Some(handle) = self.pending_broadcast.take() {
            handle.abort();
        }
    }

    pub fn send_to_player(&self, name: &str, event: &ServerEvent) {
        if let Some(tx) = self.connections.get(name) {
            if let Ok(text) = serde_json::to_string(event) {
                // a dropped receiver just means the peer is gone
                let _ = tx.send(Message::Text(text));
            }
        }
    }

    pub fn send_to_room(&self, event: &ServerEvent) {
        for name in self.connections.keys() {
            self.send_to_player(name, event);
        }
    }

    pub fn send_to_subset(&self, names: &[String], event: &ServerEvent) {
        for name in names {
            self.send_to_player(name, event);
        }
    }

    /// Executes the effects a room operation returned.
    pub fn dispatch(&self, effects: &[Outbound]) {
        for effect in effects {
            match effect {
                Outbound::ToRoom(event) => self.send_to_room(event),
                Outbound::ToPlayer(name, event) => self.send_to_player(name, event),
                Outbound::ToSubset(names, event) => self.send_to_subset(names, event),
            }
        }
    }
}

/// Maps room ids to their sessions. The registry lock is held only for
/// lookup, insert and remove, so rooms never serialize against each other;
/// all real work happens under the per-room lock.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, SharedRoomSession>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        RoomRegistry {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    pub async fn create(&self, room_id: &str) -> Result<SharedRoomSession, GameError> {
        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(room_id) {
            return Err(GameError::RoomExists(room_id.to_string()));
        }
        let session = Arc::new(Mutex::new(RoomSession::new(Room::new(room_id.to_string()))));
        rooms.insert(room_id.to_string(), session.clone());
        Ok(session)
    }

    pub async fn lookup(&self, room_id: &str) -> Result<SharedRoomSession, GameError> {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))
    }

    pub async fn remove(&self, room_id: &str) -> Option<SharedRoomSession> {
        self.rooms.lock().await.remove(room_id)
    }

    /// Clones every room's public state, for the diagnostics routes.
    pub async fn snapshot(&self) -> HashMap<String, Room> {
        let rooms = self.rooms.lock().await;
        let mut out = HashMap::new();
        for (room_id, session) in rooms.iter() {
            out.insert(room_id.clone(), session.lock().await.room.clone());
        }
        out
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        RoomRegistry::new()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            registry: Arc::new(RoomRegistry::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new()
    }
}
