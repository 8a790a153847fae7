use serde::{Deserialize, Serialize};

/// Result of tallying one phase's selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub target: String,
    pub votes: usize,
    pub total: usize,
}

/// Collects one selection per eligible player for the current phase.
///
/// Selections keep their first-submission order; a re-record only swaps the
/// target. That order is observable: ties in the tally go to the first target
/// that reached the winning count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionAggregator {
    selections: Vec<(String, String)>,
}

impl SelectionAggregator {
    /// Records `selector`'s choice, overwriting any earlier one. Changing
    /// your mind before resolution is allowed.
    pub fn record(&mut self, selector: &str, target: &str) {
        match self.selections.iter_mut().find(|(s, _)| s == selector) {
            Some((_, t)) => *t = target.to_string(),
            None => self
                .selections
                .push((selector.to_string(), target.to_string())),
        }
    }

    pub fn has_selected(&self, selector: &str) -> bool {
        self.selections.iter().any(|(s, _)| s == selector)
    }

    /// Drops a selector's choice entirely, used when they die or leave.
    pub fn remove(&mut self, selector: &str) {
        self.selections.retain(|(s, _)| s != selector);
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// True iff every currently eligible selector has a recorded selection.
    /// Eligibility is whatever the caller passes in right now, not a snapshot
    /// from phase start.
    pub fn quorum_reached<'a>(&self, mut eligible: impl Iterator<Item = &'a str>) -> bool {
        eligible.all(|name| self.has_selected(name))
    }

    /// Tallies selections by target and clears them for the next cycle.
    /// Targets are counted in first-occurrence order and only a strictly
    /// higher count displaces the current leader.
    pub fn resolve(&mut self) -> Option<Tally> {
        let total = self.selections.len();

        let mut counts: Vec<(String, usize)> = Vec::new();
        for (_, target) in self.selections.drain(..) {
            match counts.iter_mut().find(|(t, _)| *t == target) {
                Some((_, n)) => *n += 1,
                None => counts.push((target, 1)),
            }
        }

        let mut winner: Option<(String, usize)> = None;
        for (target, votes) in counts {
            match &winner {
                Some((_, best)) if votes <= *best => {}
                _ => winner = Some((target, votes)),
            }
        }

        winner.map(|(target, votes)| Tally {
            target,
            votes,
            total,
        })
    }
}
