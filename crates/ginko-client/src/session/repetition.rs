//! Occurrence counting for fourfold repetition

use std::collections::HashMap;

use ginko_core::{PositionState, RepetitionKey};

/// Occurrences that end the game
pub const REPETITION_LIMIT: u32 = 4;

/// Counts how often each position occurred in the current game
#[derive(Debug, Clone, Default)]
pub struct RepetitionTable {
    counts: HashMap<RepetitionKey, u32>,
}

impl RepetitionTable {
    /// Table holding only `initial` (counted once)
    pub fn new(initial: &PositionState) -> Self {
        let mut table = RepetitionTable::default();
        table.reset(initial);
        table
    }

    pub fn reset(&mut self, initial: &PositionState) {
        self.counts.clear();
        self.counts.insert(initial.repetition_key(), 1);
    }

    /// Count one more occurrence and return the new total
    pub fn record(&mut self, position: &PositionState) -> u32 {
        let count = self.counts.entry(position.repetition_key()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, position: &PositionState) -> u32 {
        self.counts.get(&position.repetition_key()).copied().unwrap_or(0)
    }

    /// Recount from the start position by replaying `history`
    ///
    /// Stops at the first move that does not apply.
    pub fn rebuild<S: AsRef<str>>(&mut self, history: &[S]) {
        let mut replay = PositionState::new();
        self.reset(&replay);
        for mv in history {
            if let Err(e) = replay.apply_move(mv.as_ref()) {
                log::warn!("repetition rebuild stopped at {}: {e}", mv.as_ref());
                break;
            }
            self.record(&replay);
        }
    }
}
