use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::chat::ChatChannel;
use super::game::{GameOutcome, GamePhase};
use super::player::Player;
use super::role::Role;

/// Inbound events, one per room-session operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    CreateRoom { room_id: String, name: String },
    JoinRoom { room_id: String, name: String },
    LeaveRoom,
    Chat { message: String, phase: GamePhase },
    Ready,
    StartGame { role_counts: HashMap<Role, usize> },
    SelectTarget { target_name: String, phase: GamePhase },
    AcknowledgePhase,
    ScheduleDelayedBroadcast { delay_ms: u64 },
}

/// Roster entry as clients see it. Roles never travel through this view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub name: String,
    pub color: String,
    pub alive: bool,
    pub is_ready: bool,
}

impl PlayerView {
    pub fn of(player: &Player) -> Self {
        PlayerView {
            name: player.name.clone(),
            color: player.color.clone(),
            alive: player.alive,
            is_ready: player.is_ready,
        }
    }
}

/// One line of the end-game reveal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleReveal {
    pub name: String,
    pub role: Role,
    pub alive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    RoomCreated {
        room_id: String,
        player: PlayerView,
    },
    RoomJoined {
        room_id: String,
        player: PlayerView,
        players: Vec<PlayerView>,
    },
    Roster {
        players: Vec<PlayerView>,
    },
    ChatMessage {
        name: String,
        color: String,
        message: String,
        channel: ChatChannel,
    },
    /// Private: each player learns only their own role. Mafia additionally
    /// get their teammates so the night channel has an audience.
    RoleAssigned {
        role: Role,
        peers: Vec<String>,
    },
    PhaseChanged {
        from: GamePhase,
        to: GamePhase,
    },
    SelectionProgress {
        selector: String,
        target: String,
        submitted: usize,
        required: usize,
    },
    /// Private to the police: the checked player's role.
    CheckResult {
        target: String,
        role: Role,
    },
    NightResolved {
        killed: Option<PlayerView>,
        healed: bool,
    },
    VoteResolved {
        eliminated: Option<PlayerView>,
        votes: usize,
        total: usize,
    },
    GameFinished {
        outcome: GameOutcome,
        roles: Vec<RoleReveal>,
    },
    PlayerLeft {
        name: String,
    },
    DelayElapsed,
    Error {
        message: String,
    },
}

/// A side effect of an event, addressed to one of the three transport
/// capabilities. The session's connection map executes these; nothing in the
/// core touches a socket.
#[derive(Debug, Clone)]
pub enum Outbound {
    ToRoom(ServerEvent),
    ToPlayer(String, ServerEvent),
    ToSubset(Vec<String>, ServerEvent),
}
