//! Named sub-states of the session

use std::time::Duration;

use ginko_core::types::Color;

use super::outcome::GameOutcome;

pub const DEFAULT_DEPTH: u32 = 3;
pub const DEFAULT_RANDOMNESS: u32 = 200;
pub const DEFAULT_TURN_DELAY: Duration = Duration::from_millis(1000);

/// Slider ranges of the GUI; values outside are accepted but logged
pub const DEPTH_UI_MAX: u32 = 8;
pub const RANDOMNESS_UI_MAX: u32 = 2000;
pub const TURN_DELAY_UI_MAX: Duration = Duration::from_millis(5000);

/// Handshake / process link with the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// No process has been started yet
    NotStarted,
    /// `usi` sent
    AwaitingUsiOk,
    /// `isready` sent
    AwaitingReadyOk,
    /// `readyok` received
    Ready,
    /// The process terminated with this exit code
    Exited(i32),
}

impl Link {
    pub fn is_ready(&self) -> bool {
        matches!(self, Link::Ready)
    }
}

/// Whose move is being produced right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// Nothing in flight
    Idle,
    /// An engine turn for `side` is scheduled after the inter-turn delay
    DelayedStart(Color),
    /// `go` was sent; waiting for `bestmove`
    Searching(Color),
    /// The game has ended
    Finished(GameOutcome),
}

impl Turn {
    pub fn is_searching(&self) -> bool {
        matches!(self, Turn::Searching(_))
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Turn::Finished(_))
    }

    /// Can a new search (or a delayed start) begin from here?
    pub fn can_start_search(&self) -> bool {
        matches!(self, Turn::Idle)
    }
}

/// Cached result of the last `legalmoves` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegalMoves {
    /// No usable answer
    Unknown,
    /// Request sent while the history had `ply` entries
    Pending { ply: usize },
    /// Answer for the current position
    Known(Vec<String>),
}

impl LegalMoves {
    pub fn is_pending(&self) -> bool {
        matches!(self, LegalMoves::Pending { .. })
    }

    pub fn moves(&self) -> &[String] {
        match self {
            LegalMoves::Known(moves) => moves,
            _ => &[],
        }
    }

    pub fn has_moves(&self) -> bool {
        !self.moves().is_empty()
    }
}

/// Play mode and engine think parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaySettings {
    /// Color the human plays in human-vs-engine mode
    pub human_color: Color,
    /// Engine plays both sides
    pub auto_play: bool,
    pub depth: u32,
    pub randomness: u32,
    /// Pause before each engine turn in auto-play mode
    pub turn_delay: Duration,
}

impl Default for PlaySettings {
    fn default() -> Self {
        PlaySettings {
            human_color: Color::Black,
            auto_play: false,
            depth: DEFAULT_DEPTH,
            randomness: DEFAULT_RANDOMNESS,
            turn_delay: DEFAULT_TURN_DELAY,
        }
    }
}

impl PlaySettings {
    /// Is `side` moved by the engine in the current mode?
    pub fn is_engine_controlled(&self, side: Color) -> bool {
        self.auto_play || side != self.human_color
    }

    /// Display label: "Black", "White AI", "Black (you)" ...
    pub fn actor_label(&self, side: Color) -> String {
        if self.is_engine_controlled(side) {
            format!("{} AI", side.name())
        } else {
            format!("{} (you)", side.name())
        }
    }

    /// Clamp depth to at least 1; warn outside the usual range
    pub fn set_depth(&mut self, depth: u32) {
        if depth > DEPTH_UI_MAX {
            log::warn!("search depth {depth} is above the usual maximum {DEPTH_UI_MAX}");
        }
        self.depth = depth.max(1);
    }

    pub fn set_randomness(&mut self, randomness: u32) {
        if randomness > RANDOMNESS_UI_MAX {
            log::warn!("randomness {randomness} is above the usual maximum {RANDOMNESS_UI_MAX}");
        }
        self.randomness = randomness;
    }

    pub fn set_turn_delay(&mut self, delay: Duration) {
        if delay > TURN_DELAY_UI_MAX {
            log::warn!("turn delay {delay:?} is above the usual maximum {TURN_DELAY_UI_MAX:?}");
        }
        self.turn_delay = delay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_controlled_sides() {
        let mut settings = PlaySettings::default();
        assert!(!settings.is_engine_controlled(Color::Black));
        assert!(settings.is_engine_controlled(Color::White));
        assert_eq!(settings.actor_label(Color::Black), "Black (you)");
        assert_eq!(settings.actor_label(Color::White), "White AI");

        settings.auto_play = true;
        assert!(settings.is_engine_controlled(Color::Black));
        assert_eq!(settings.actor_label(Color::Black), "Black AI");
    }

    #[test]
    fn test_depth_is_clamped() {
        let mut settings = PlaySettings::default();
        settings.set_depth(0);
        assert_eq!(settings.depth, 1);
        settings.set_depth(12);
        assert_eq!(settings.depth, 12);
    }
}
