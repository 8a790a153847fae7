use serde::{Deserialize, Serialize};

use super::role::Role;

/// Per-player state owned by the room that the player joined. The record
/// outlives the player's death so the end-game reveal can still name them;
/// it is dropped only when the player leaves or the room is torn down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub color: String,
    pub role: Option<Role>,
    pub alive: bool,
    /// Set by the doctor during the night, cleared when the night resolves.
    pub healed: bool,
    /// Target chosen in the current phase, cleared on resolution.
    pub selection: Option<String>,
    pub is_ready: bool,
    pub acked_phase: bool,
}

impl Player {
    pub fn new(name: String, color: String) -> Self {
        Player {
            name,
            color,
            role: None,
            alive: true,
            healed: false,
            selection: None,
            is_ready: false,
            acked_phase: false,
        }
    }

    /// Back to pre-game state. Membership and seat color survive.
    pub fn reset_for_lobby(&mut self) {
        self.role = None;
        self.alive = true;
        self.healed = false;
        self.selection = None;
        self.is_ready = false;
        self.acked_phase = false;
    }
}
