//! USI protocol lines exchanged with the engine (client side)

use std::fmt;

/// Commands sent to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Initialize USI mode
    Usi,

    /// Check if engine is ready
    IsReady,

    /// New game notification
    UsiNewGame,

    /// Set position (always from the start position)
    Position { moves: Vec<String> },

    /// Start search with fixed depth and randomized move choice
    Go { depth: u32, random: u32 },

    /// Ask for the legal moves of the current position (followed by `checkstate`)
    LegalMoves,

    /// Quit the engine
    Quit,
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Usi => write!(f, "usi"),
            EngineCommand::IsReady => write!(f, "isready"),
            EngineCommand::UsiNewGame => write!(f, "usinewgame"),
            EngineCommand::Position { moves } => {
                write!(f, "position startpos")?;
                if !moves.is_empty() {
                    write!(f, " moves {}", moves.join(" "))?;
                }
                Ok(())
            }
            EngineCommand::Go { depth, random } => write!(f, "go depth {depth} random {random}"),
            EngineCommand::LegalMoves => write!(f, "legalmoves"),
            EngineCommand::Quit => write!(f, "quit"),
        }
    }
}

/// Lines received from the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    /// Blank line
    Empty,

    /// `id name ...` / `id author ...`
    Id,

    /// `usiok` (anything after the keyword is ignored)
    UsiOk,

    /// `readyok`
    ReadyOk,

    /// `info string position error ...`: the engine rejected the last position
    PositionError,

    /// `info string legalmoves error ...`: the legal-move request failed
    LegalMovesError,

    /// Any other `info ...` line
    Info,

    /// `legalmoves m1 m2 ...` (possibly empty)
    LegalMoves(Vec<String>),

    /// `checkstate <bool>`
    CheckState(bool),

    /// `bestmove <move>`; `None` when the move token is missing
    BestMove(Option<String>),

    /// Anything else
    Other,
}

impl EngineMessage {
    /// Classify one line from the engine's stdout
    pub fn parse(line: &str) -> EngineMessage {
        let line = line.trim();
        if line.is_empty() {
            return EngineMessage::Empty;
        }
        if line.starts_with("usiok") {
            return EngineMessage::UsiOk;
        }
        if line.starts_with("info string position error") {
            return EngineMessage::PositionError;
        }
        if line.starts_with("info string legalmoves error") {
            return EngineMessage::LegalMovesError;
        }

        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("id") => EngineMessage::Id,
            Some("readyok") => EngineMessage::ReadyOk,
            Some("info") => EngineMessage::Info,
            Some("legalmoves") => EngineMessage::LegalMoves(tokens.map(str::to_string).collect()),
            Some("checkstate") => EngineMessage::CheckState(tokens.next().is_some_and(parse_bool)),
            Some("bestmove") => EngineMessage::BestMove(tokens.next().map(str::to_string)),
            _ => EngineMessage::Other,
        }
    }
}

/// `1` / `true` / `yes` (case-insensitive) are true; everything else is false
pub fn parse_bool(token: &str) -> bool {
    matches!(token.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
