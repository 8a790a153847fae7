use super::game::GamePhase;

/// Per-request failures. All of these are reported back to the player who
/// caused them; none of them tears a room down.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("room {0} was not found")]
    RoomNotFound(String),
    #[error("room {0} already exists")]
    RoomExists(String),
    #[error("room {0} is full")]
    RoomFull(String),
    #[error("the name {0} is already taken in this room")]
    NameTaken(String),
    #[error("the game in this room has already started")]
    GameAlreadyStarted,
    #[error("{roles} roles were requested for {players} players")]
    ConfigMismatch { players: usize, roles: usize },
    #[error("{0} may not act in the current phase")]
    IneligibleSelector(String),
    #[error("this event does not apply to the {0:?} phase")]
    InvalidPhaseTransition(GamePhase),
    #[error("no selectable player named {0} in this room")]
    UnknownTarget(String),
}
