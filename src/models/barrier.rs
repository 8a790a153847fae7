use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Holds a phase transition until every room member has acknowledged the
/// animation for the previous one, so clients advance in lockstep.
///
/// Duplicate acknowledgments are harmless. The barrier itself never removes
/// anyone from the required set; the room does that when a member leaves, and
/// re-checks the barrier afterwards so a departure cannot wedge it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseBarrier {
    arrived: HashSet<String>,
}

impl PhaseBarrier {
    pub fn arrive(&mut self, name: &str) {
        self.arrived.insert(name.to_string());
    }

    pub fn forget(&mut self, name: &str) {
        self.arrived.remove(name);
    }

    /// Releases (and resets) once every member has arrived, true at most once
    /// per cycle.
    pub fn try_release<'a>(&mut self, mut members: impl Iterator<Item = &'a str>) -> bool {
        if members.all(|m| self.arrived.contains(m)) {
            self.arrived.clear();
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.arrived.clear();
    }
}
