use std::collections::HashMap;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mafia,
    Citizen,
    Police,
    Doctor,
    Politician,
}

impl Role {
    pub fn is_mafia(self) -> bool {
        matches!(self, Role::Mafia)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Mafia => write!(f, "mafia"),
            Role::Citizen => write!(f, "citizen"),
            Role::Police => write!(f, "police"),
            Role::Doctor => write!(f, "doctor"),
            Role::Politician => write!(f, "politician"),
        }
    }
}

/// The role deck built from the start-game configuration: each requested role
/// repeated `count` times, shuffled, dealt to players in join order.
#[derive(Debug, Clone)]
pub struct RoleDeck {
    counts: HashMap<Role, usize>,
}

impl RoleDeck {
    pub fn new(counts: HashMap<Role, usize>) -> Self {
        RoleDeck { counts }
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Deals one role per player. The deck size must match the player count
    /// exactly; the shuffle is an unbiased Fisher-Yates.
    pub fn assign(
        &self,
        players: &[String],
        rng: &mut impl Rng,
    ) -> Result<HashMap<String, Role>, GameError> {
        if self.total() != players.len() {
            return Err(GameError::ConfigMismatch {
                players: players.len(),
                roles: self.total(),
            });
        }

        let mut deck: Vec<Role> = Vec::with_capacity(players.len());
        for (role, count) in &self.counts {
            deck.extend(std::iter::repeat(*role).take(*count));
        }
        deck.shuffle(rng);

        Ok(players.iter().cloned().zip(deck).collect())
    }
}
