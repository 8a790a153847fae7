use serde::{Deserialize, Serialize};

use super::player::Player;
use super::role::Role;

/// The phase cycle of one session. Exactly one phase is active per room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    Lobby,
    Intro,
    NightKill,
    NightHeal,
    NightCheck,
    Discussion,
    Vote,
    RoundResolution,
    GameOver,
}

impl GamePhase {
    /// Phases that collect one selection per eligible player.
    pub fn is_selection(self) -> bool {
        matches!(
            self,
            GamePhase::NightKill | GamePhase::NightHeal | GamePhase::NightCheck | GamePhase::Vote
        )
    }

    pub fn is_night(self) -> bool {
        matches!(
            self,
            GamePhase::NightKill | GamePhase::NightHeal | GamePhase::NightCheck
        )
    }

    /// The single role allowed to act in a night sub-phase. `Vote` is open to
    /// every living player and has no acting role.
    pub fn acting_role(self) -> Option<Role> {
        match self {
            GamePhase::NightKill => Some(Role::Mafia),
            GamePhase::NightHeal => Some(Role::Doctor),
            GamePhase::NightCheck => Some(Role::Police),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameOutcome {
    Ongoing,
    MafiaWin,
    CitizenWin,
    PoliticianWin,
}

/// Decides whether the game ended, checked after every kill resolution.
///
/// A politician eliminated by the day vote wins alone, before any count is
/// looked at. Otherwise the mafia lose once none of them are left alive, and
/// win once they are at least as many as everyone else still alive.
pub fn evaluate_outcome(players: &[Player], lynched_by_vote: Option<&str>) -> GameOutcome {
    if let Some(name) = lynched_by_vote {
        let lynched_politician = players
            .iter()
            .any(|p| p.name == name && p.role == Some(Role::Politician));
        if lynched_politician {
            return GameOutcome::PoliticianWin;
        }
    }

    let mafia = players
        .iter()
        .filter(|p| p.alive && p.role.map_or(false, Role::is_mafia))
        .count();
    let others = players
        .iter()
        .filter(|p| p.alive && p.role.map_or(false, |r| !r.is_mafia()))
        .count();

    if mafia == 0 {
        GameOutcome::CitizenWin
    } else if mafia >= others {
        GameOutcome::MafiaWin
    } else {
        GameOutcome::Ongoing
    }
}
