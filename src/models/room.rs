use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::barrier::PhaseBarrier;
use super::chat::{ChatChannel, ChatLog, ChatMessage};
use super::error::GameError;
use super::game::{evaluate_outcome, GameOutcome, GamePhase};
use super::message::{Outbound, PlayerView, RoleReveal, ServerEvent};
use super::player::Player;
use super::role::{Role, RoleDeck};
use super::selection::{SelectionAggregator, Tally};

/// Seat colors handed out by join order, recomputed when the roster changes.
pub const PLAYER_COLORS: [&str; 10] = [
    "#f82d39", "#2d5165", "#b9ab6c", "#0c3fb5", "#900599", "#b57731", "#56e616", "#913353",
    "#f1d65d", "#3e2528",
];

pub const DEFAULT_MAX_PLAYERS: usize = 8;

/// One room's entire game state. Every event handler runs under the room's
/// lock, so nothing in here needs interior synchronization: the room is the
/// single writer of its players.
///
/// Methods return the outbound effects the event caused instead of sending
/// anything themselves; the session layer owns the connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,
    pub players: Vec<Player>,
    pub max_players: usize,
    pub phase: GamePhase,
    pub selections: SelectionAggregator,
    pub barrier: PhaseBarrier,
    pub chat_log: ChatLog,
    /// Victim picked during NightKill, applied once the whole night resolved.
    pending_kill: Option<String>,
}

impl Room {
    pub fn new(room_id: String) -> Self {
        Room {
            room_id,
            players: Vec::new(),
            max_players: DEFAULT_MAX_PLAYERS,
            phase: GamePhase::Lobby,
            selections: SelectionAggregator::default(),
            barrier: PhaseBarrier::default(),
            chat_log: ChatLog::default(),
            pending_kill: None,
        }
    }

    pub fn in_progress(&self) -> bool {
        self.phase != GamePhase::Lobby
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name == name)
    }

    pub fn roster(&self) -> Vec<PlayerView> {
        self.players.iter().map(PlayerView::of).collect()
    }

    /// Players allowed to select in `phase`, evaluated against the current
    /// roster: the dead and the departed never appear here.
    pub fn eligible_names(&self, phase: GamePhase) -> Vec<String> {
        self.players
            .iter()
            .filter(|p| p.alive)
            .filter(|p| match phase {
                GamePhase::Vote => true,
                _ => phase
                    .acting_role()
                    .map_or(false, |role| p.role == Some(role)),
            })
            .map(|p| p.name.clone())
            .collect()
    }

    fn mafia_names(&self) -> Vec<String> {
        self.players
            .iter()
            .filter(|p| p.role == Some(Role::Mafia))
            .map(|p| p.name.clone())
            .collect()
    }

    fn reassign_colors(&mut self) {
        for (idx, player) in self.players.iter_mut().enumerate() {
            player.color = PLAYER_COLORS[idx % PLAYER_COLORS.len()].to_string();
        }
    }

    pub fn add_player(&mut self, name: &str) -> Result<Vec<Outbound>, GameError> {
        if self.in_progress() {
            return Err(GameError::GameAlreadyStarted);
        }
        if self.players.len() >= self.max_players {
            return Err(GameError::RoomFull(self.room_id.clone()));
        }
        if self.players.iter().any(|p| p.name == name) {
            return Err(GameError::NameTaken(name.to_string()));
        }

        let color = PLAYER_COLORS[self.players.len() % PLAYER_COLORS.len()];
        self.players
            .push(Player::new(name.to_string(), color.to_string()));

        Ok(vec![Outbound::ToRoom(ServerEvent::Roster {
            players: self.roster(),
        })])
    }

    /// Removes a member and everything they contributed to the current phase,
    /// then re-checks quorum and barrier: the departed must not keep blocking
    /// either. An empty room is the caller's cue to tear the room down.
    pub fn remove_player(&mut self, name: &str) -> Vec<Outbound> {
        let Some(idx) = self.players.iter().position(|p| p.name == name) else {
            return Vec::new();
        };
        self.players.remove(idx);
        self.selections.remove(name);
        self.barrier.forget(name);
        self.reassign_colors();

        let mut effects = vec![
            Outbound::ToRoom(ServerEvent::PlayerLeft {
                name: name.to_string(),
            }),
            Outbound::ToRoom(ServerEvent::Roster {
                players: self.roster(),
            }),
        ];

        if self.players.is_empty() {
            return effects;
        }

        match self.phase {
            phase if phase.is_selection() => {
                let eligible = self.eligible_names(phase);
                if self
                    .selections
                    .quorum_reached(eligible.iter().map(String::as_str))
                {
                    self.resolve_phase(&mut effects);
                }
            }
            GamePhase::Intro | GamePhase::Discussion => {
                self.release_barrier_if_complete(&mut effects);
            }
            _ => {}
        }

        effects
    }

    pub fn toggle_ready(&mut self, name: &str) -> Result<Vec<Outbound>, GameError> {
        if self.phase != GamePhase::Lobby {
            return Err(GameError::InvalidPhaseTransition(self.phase));
        }
        let player = self
            .player_mut(name)
            .ok_or_else(|| GameError::UnknownTarget(name.to_string()))?;
        player.is_ready = !player.is_ready;

        Ok(vec![Outbound::ToRoom(ServerEvent::Roster {
            players: self.roster(),
        })])
    }

    /// Deals roles and opens the game. Each player privately learns their own
    /// role; mafia also learn their teammates for the night channel.
    pub fn start_game(
        &mut self,
        role_counts: HashMap<Role, usize>,
        rng: &mut impl Rng,
    ) -> Result<Vec<Outbound>, GameError> {
        if self.in_progress() {
            return Err(GameError::GameAlreadyStarted);
        }

        let names: Vec<String> = self.players.iter().map(|p| p.name.clone()).collect();
        let assignment = RoleDeck::new(role_counts).assign(&names, rng)?;

        for player in &mut self.players {
            player.role = assignment.get(&player.name).copied();
            player.alive = true;
            player.healed = false;
            player.selection = None;
            player.is_ready = false;
            player.acked_phase = false;
        }
        self.selections.clear();
        self.barrier.reset();
        self.pending_kill = None;
        self.chat_log
            .add_system_message(format!("game started with {} players", self.players.len()));

        let mafia = self.mafia_names();
        let mut effects = Vec::new();
        for player in &self.players {
            if let Some(role) = player.role {
                let peers = if role == Role::Mafia {
                    mafia
                        .iter()
                        .filter(|name| **name != player.name)
                        .cloned()
                        .collect()
                } else {
                    Vec::new()
                };
                effects.push(Outbound::ToPlayer(
                    player.name.clone(),
                    ServerEvent::RoleAssigned { role, peers },
                ));
            }
        }

        self.enter_phase(GamePhase::Intro, &mut effects);
        Ok(effects)
    }

    /// Records one selection for the current phase and resolves the phase the
    /// instant the last eligible selector is in.
    pub fn submit_selection(
        &mut self,
        selector: &str,
        target: &str,
        claimed_phase: GamePhase,
    ) -> Result<Vec<Outbound>, GameError> {
        if claimed_phase != self.phase || !self.phase.is_selection() {
            return Err(GameError::InvalidPhaseTransition(self.phase));
        }

        let eligible = self.eligible_names(self.phase);
        if !eligible.iter().any(|name| name == selector) {
            return Err(GameError::IneligibleSelector(selector.to_string()));
        }

        let target_player = self
            .player(target)
            .ok_or_else(|| GameError::UnknownTarget(target.to_string()))?;
        // the police check may inspect the dead; every other phase targets the living
        if self.phase != GamePhase::NightCheck && !target_player.alive {
            return Err(GameError::UnknownTarget(target.to_string()));
        }

        self.selections.record(selector, target);
        if let Some(player) = self.player_mut(selector) {
            player.selection = Some(target.to_string());
        }

        let mut effects = vec![Outbound::ToSubset(
            eligible.clone(),
            ServerEvent::SelectionProgress {
                selector: selector.to_string(),
                target: target.to_string(),
                submitted: self.selections.len(),
                required: eligible.len(),
            },
        )];

        if self
            .selections
            .quorum_reached(eligible.iter().map(String::as_str))
        {
            self.resolve_phase(&mut effects);
        }
        Ok(effects)
    }

    /// Marks this member's phase-animation acknowledgment; the last one to
    /// arrive releases the barrier and advances the phase.
    pub fn acknowledge_phase(&mut self, name: &str) -> Result<Vec<Outbound>, GameError> {
        if !matches!(self.phase, GamePhase::Intro | GamePhase::Discussion) {
            return Err(GameError::InvalidPhaseTransition(self.phase));
        }
        let player = self
            .player_mut(name)
            .ok_or_else(|| GameError::UnknownTarget(name.to_string()))?;
        player.acked_phase = true;
        self.barrier.arrive(name);

        let mut effects = Vec::new();
        self.release_barrier_if_complete(&mut effects);
        Ok(effects)
    }

    /// Day chat goes to the whole room; at night only the mafia may talk, on
    /// their own channel. The claimed phase guards against messages racing a
    /// phase change.
    pub fn chat(
        &mut self,
        name: &str,
        message: &str,
        claimed_phase: GamePhase,
    ) -> Result<Vec<Outbound>, GameError> {
        if claimed_phase != self.phase {
            return Err(GameError::InvalidPhaseTransition(self.phase));
        }
        let player = self
            .player(name)
            .ok_or_else(|| GameError::UnknownTarget(name.to_string()))?;
        let color = player.color.clone();
        let role = player.role;

        if self.phase.is_night() {
            if role != Some(Role::Mafia) {
                return Err(GameError::IneligibleSelector(name.to_string()));
            }
            self.chat_log.add_message(ChatMessage::new(
                name.to_string(),
                color.clone(),
                message.to_string(),
                ChatChannel::Mafia,
            ));
            Ok(vec![Outbound::ToSubset(
                self.mafia_names(),
                ServerEvent::ChatMessage {
                    name: name.to_string(),
                    color,
                    message: message.to_string(),
                    channel: ChatChannel::Mafia,
                },
            )])
        } else {
            self.chat_log.add_message(ChatMessage::new(
                name.to_string(),
                color.clone(),
                message.to_string(),
                ChatChannel::Room,
            ));
            Ok(vec![Outbound::ToRoom(ServerEvent::ChatMessage {
                name: name.to_string(),
                color,
                message: message.to_string(),
                channel: ChatChannel::Room,
            })])
        }
    }

    /// Moves to `to` and announces it. A selection phase that has nobody
    /// eligible resolves on the spot and falls through to the next phase; a
    /// phase must never wait on selectors that do not exist.
    fn enter_phase(&mut self, to: GamePhase, effects: &mut Vec<Outbound>) {
        let from = self.phase;
        self.phase = to;
        effects.push(Outbound::ToRoom(ServerEvent::PhaseChanged { from, to }));

        if to.is_selection() && self.eligible_names(to).is_empty() {
            self.resolve_phase(effects);
        }
    }

    fn release_barrier_if_complete(&mut self, effects: &mut Vec<Outbound>) {
        let members: Vec<String> = self.players.iter().map(|p| p.name.clone()).collect();
        if members.is_empty() {
            return;
        }
        if self
            .barrier
            .try_release(members.iter().map(String::as_str))
        {
            for player in &mut self.players {
                player.acked_phase = false;
            }
            match self.phase {
                GamePhase::Intro => self.enter_phase(GamePhase::NightKill, effects),
                GamePhase::Discussion => self.enter_phase(GamePhase::Vote, effects),
                _ => {}
            }
        }
    }

    /// Tallies the current phase and advances the state machine.
    fn resolve_phase(&mut self, effects: &mut Vec<Outbound>) {
        let tally = self.selections.resolve();
        for player in &mut self.players {
            player.selection = None;
        }

        match self.phase {
            GamePhase::NightKill => {
                self.pending_kill = tally.map(|t| t.target);
                self.enter_phase(GamePhase::NightHeal, effects);
            }
            GamePhase::NightHeal => {
                if let Some(t) = tally {
                    if let Some(target) = self.player_mut(&t.target) {
                        target.healed = true;
                    }
                }
                self.enter_phase(GamePhase::NightCheck, effects);
            }
            GamePhase::NightCheck => {
                if let Some(t) = tally {
                    if let Some(role) = self.player(&t.target).and_then(|p| p.role) {
                        effects.push(Outbound::ToSubset(
                            self.eligible_names(GamePhase::NightCheck),
                            ServerEvent::CheckResult {
                                target: t.target,
                                role,
                            },
                        ));
                    }
                }
                self.finish_night(effects);
            }
            GamePhase::Vote => {
                self.finish_vote(tally, effects);
            }
            _ => {}
        }
    }

    /// Applies the pending kill once the whole night has resolved. A heal on
    /// the victim negates it; either way heal flags reset for the next cycle.
    fn finish_night(&mut self, effects: &mut Vec<Outbound>) {
        match self.pending_kill.take() {
            Some(name) => match self.player_mut(&name) {
                Some(victim) if victim.healed => {
                    effects.push(Outbound::ToRoom(ServerEvent::NightResolved {
                        killed: None,
                        healed: true,
                    }));
                }
                Some(victim) => {
                    victim.alive = false;
                    let view = PlayerView::of(victim);
                    effects.push(Outbound::ToRoom(ServerEvent::NightResolved {
                        killed: Some(view),
                        healed: false,
                    }));
                }
                // the victim left the room before the night ended
                None => effects.push(Outbound::ToRoom(ServerEvent::NightResolved {
                    killed: None,
                    healed: false,
                })),
            },
            None => effects.push(Outbound::ToRoom(ServerEvent::NightResolved {
                killed: None,
                healed: false,
            })),
        }

        for player in &mut self.players {
            player.healed = false;
        }

        let outcome = evaluate_outcome(&self.players, None);
        if outcome == GameOutcome::Ongoing {
            self.enter_phase(GamePhase::Discussion, effects);
        } else {
            self.finish_game(outcome, effects);
        }
    }

    /// The day vote eliminates its target only on a strict majority of the
    /// votes cast. A lynched politician is immune and wins on the spot.
    fn finish_vote(&mut self, tally: Option<Tally>, effects: &mut Vec<Outbound>) {
        self.enter_phase(GamePhase::RoundResolution, effects);

        let mut outcome = GameOutcome::Ongoing;
        match tally {
            Some(t) if t.votes * 2 > t.total => {
                match self.players.iter().position(|p| p.name == t.target) {
                    Some(idx) => {
                        if self.players[idx].role != Some(Role::Politician) {
                            self.players[idx].alive = false;
                        }
                        let name = self.players[idx].name.clone();
                        effects.push(Outbound::ToRoom(ServerEvent::VoteResolved {
                            eliminated: Some(PlayerView::of(&self.players[idx])),
                            votes: t.votes,
                            total: t.total,
                        }));
                        outcome = evaluate_outcome(&self.players, Some(&name));
                    }
                    // the top-voted player left before resolution
                    None => effects.push(Outbound::ToRoom(ServerEvent::VoteResolved {
                        eliminated: None,
                        votes: t.votes,
                        total: t.total,
                    })),
                }
            }
            Some(t) => effects.push(Outbound::ToRoom(ServerEvent::VoteResolved {
                eliminated: None,
                votes: t.votes,
                total: t.total,
            })),
            None => effects.push(Outbound::ToRoom(ServerEvent::VoteResolved {
                eliminated: None,
                votes: 0,
                total: 0,
            })),
        }

        if outcome == GameOutcome::Ongoing {
            self.enter_phase(GamePhase::Discussion, effects);
        } else {
            self.finish_game(outcome, effects);
        }
    }

    /// Announces the outcome with the full role reveal, then resets the room
    /// to the lobby. Membership survives; everything game-related clears.
    fn finish_game(&mut self, outcome: GameOutcome, effects: &mut Vec<Outbound>) {
        self.enter_phase(GamePhase::GameOver, effects);

        let roles: Vec<RoleReveal> = self
            .players
            .iter()
            .filter_map(|p| {
                p.role.map(|role| RoleReveal {
                    name: p.name.clone(),
                    role,
                    alive: p.alive,
                })
            })
            .collect();
        effects.push(Outbound::ToRoom(ServerEvent::GameFinished {
            outcome,
            roles,
        }));
        self.chat_log
            .add_system_message(format!("game finished: {:?}", outcome));

        for player in &mut self.players {
            player.reset_for_lobby();
        }
        self.selections.clear();
        self.barrier.reset();
        self.pending_kill = None;
        self.enter_phase(GamePhase::Lobby, effects);
        effects.push(Outbound::ToRoom(ServerEvent::Roster {
            players: self.roster(),
        }));
    }
}
