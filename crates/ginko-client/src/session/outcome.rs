//! Game results

use serde::Serialize;

use ginko_core::types::Color;

use super::state::PlaySettings;

/// Why the game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// No legal moves while in check
    Checkmate,
    /// No legal moves without check
    NoLegalMoves,
    /// The same position occurred four times
    Repetition,
    Resignation,
}

impl EndReason {
    pub fn label(self) -> &'static str {
        match self {
            EndReason::Checkmate => "checkmate",
            EndReason::NoLegalMoves => "no_legal_moves",
            EndReason::Repetition => "repetition",
            EndReason::Resignation => "resignation",
        }
    }
}

/// Final result with the user-facing strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameOutcome {
    pub reason: EndReason,
    pub winner: Color,
    pub loser: Color,
    /// Short status line
    pub status: String,
    /// Line for the game log
    pub message: String,
}

impl GameOutcome {
    pub fn new(reason: EndReason, loser: Color, settings: &PlaySettings) -> Self {
        let winner = !loser;
        let winner_label = settings.actor_label(winner);
        let loser_label = settings.actor_label(loser);
        // human-vs-engine results are worded from the player's side
        let human_lost = !settings.auto_play && loser == settings.human_color;

        let (status, message) = match reason {
            EndReason::Checkmate if settings.auto_play => (
                format!("Checkmate: {winner_label} wins"),
                format!("Checkmate. {winner_label} wins."),
            ),
            EndReason::Checkmate if human_lost => {
                ("Checkmated".to_string(), "Checkmate. You lose.".to_string())
            }
            EndReason::Checkmate => (
                "You delivered checkmate".to_string(),
                "Checkmate. You win.".to_string(),
            ),
            EndReason::NoLegalMoves if settings.auto_play => (
                format!("No legal moves: {winner_label} wins"),
                format!("No legal moves for {loser_label}. {winner_label} wins."),
            ),
            EndReason::NoLegalMoves if human_lost => (
                "No legal moves".to_string(),
                "No legal moves. You lose.".to_string(),
            ),
            EndReason::NoLegalMoves => (
                "Opponent has no legal moves".to_string(),
                "No legal moves for the engine. You win.".to_string(),
            ),
            EndReason::Repetition => (
                format!("Repetition: {loser_label} loses"),
                format!("Fourfold repetition. {loser_label} loses."),
            ),
            EndReason::Resignation => (
                format!("{loser_label} resigned"),
                format!("{loser_label} resigned. {winner_label} wins."),
            ),
        };

        GameOutcome {
            reason,
            winner,
            loser,
            status,
            message,
        }
    }
}
