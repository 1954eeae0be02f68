//! Inputs to and outputs from the session state machine

use std::time::Duration;

use serde::Serialize;

use ginko_core::types::Color;

use super::outcome::GameOutcome;
use crate::protocol::EngineCommand;

/// Everything the session reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A (re)started engine process is ready to receive `usi`
    EngineStarted,
    /// One stdout line from the engine
    EngineLine(String),
    /// One stderr line from the engine
    EngineErrorLine(String),
    EngineExited(i32),
    /// The inter-turn delay scheduled for `side` elapsed
    TurnDelayElapsed(Color),
    /// The user played a move
    SubmitMove(String),
    NewGame,
    /// The user resigned
    Resign,
    SetAutoPlay(bool),
    SetDepth(u32),
    SetRandomness(u32),
    SetTurnDelay(Duration),
}

/// What the driver must do after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write a command line to the engine
    Send(EngineCommand),
    /// Arm the one-shot turn timer, replacing any armed one
    ScheduleTurn { side: Color, delay: Duration },
    /// Tell the front-end
    Notify(Notification),
}

/// Notifications for the front-end
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Handshake completed
    Ready,
    GameStarted,
    MoveApplied {
        mover: Color,
        usi: String,
        by_engine: bool,
    },
    LegalMoves {
        moves: Vec<String>,
    },
    CheckState {
        in_check: bool,
    },
    /// Game log line
    Log {
        message: String,
    },
    /// Engine `info` line, verbatim
    Info {
        line: String,
    },
    /// Clear the engine info pane
    InfoCleared,
    Status {
        message: String,
    },
    /// Drop any piece selection / highlight in the UI
    SelectionReset,
    /// The position was rebuilt from the history (rollback, new game)
    PositionReloaded,
    GameOver(GameOutcome),
    EngineExited {
        code: i32,
    },
}

impl Notification {
    /// One JSON object per notification
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
