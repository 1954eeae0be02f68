use ginko_core::IllegalMove;

/// Reasons a session action could not be carried out
///
/// All of these are recovered inside the session; they surface as log lines.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("engine rejected the position: {0}")]
    ProtocolDesync(String),

    #[error("engine exited (code={0})")]
    EngineExited(i32),

    #[error("engine is not ready")]
    EngineNotReady,

    #[error("engine is thinking")]
    SearchInProgress,

    #[error("game is over")]
    GameOver,

    #[error("the engine plays this side")]
    HumanSideAutomated,

    #[error("it is not your turn")]
    NotHumanTurn,

    #[error("illegal move {usi}: {source}")]
    IllegalMove {
        usi: String,
        #[source]
        source: IllegalMove,
    },
}
