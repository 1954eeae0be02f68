//! Session state machine
//!
//! [`Session`] owns the game position, the move history and the handshake /
//! turn state. It never performs I/O: every [`SessionEvent`] is turned into a
//! list of [`Effect`]s (engine commands, timer requests, notifications) that
//! the driver executes in order.

mod error;
mod event;
mod outcome;
mod repetition;
mod state;

#[cfg(test)]
mod tests;

pub use error::SessionError;
pub use event::{Effect, Notification, SessionEvent};
pub use outcome::{EndReason, GameOutcome};
pub use repetition::{REPETITION_LIMIT, RepetitionTable};
pub use state::{
    DEFAULT_DEPTH, DEFAULT_RANDOMNESS, DEFAULT_TURN_DELAY, LegalMoves, Link, PlaySettings, Turn,
};

use std::time::Duration;

use ginko_core::PositionState;
use ginko_core::types::{Color, RESIGN};

use crate::protocol::{EngineCommand, EngineMessage};

/// Game controller between a front-end and a USI engine
#[derive(Debug)]
pub struct Session {
    position: PositionState,
    history: Vec<String>,
    repetition: RepetitionTable,
    link: Link,
    turn: Turn,
    legal: LegalMoves,
    /// `legalmoves` commands sent but not answered yet
    legal_in_flight: u32,
    /// A `legalmoves` answer was stored and its `checkstate` has not arrived yet
    awaiting_check: bool,
    in_check: bool,
    /// Last move the human played that the engine has not confirmed yet
    unconfirmed_move: Option<String>,
    settings: PlaySettings,
    effects: Vec<Effect>,
}

impl Session {
    pub fn new(settings: PlaySettings) -> Self {
        let position = PositionState::new();
        let repetition = RepetitionTable::new(&position);
        Session {
            position,
            history: Vec::new(),
            repetition,
            link: Link::NotStarted,
            turn: Turn::Idle,
            legal: LegalMoves::Unknown,
            legal_in_flight: 0,
            awaiting_check: false,
            in_check: false,
            unconfirmed_move: None,
            settings,
            effects: Vec::new(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn position(&self) -> &PositionState {
        &self.position
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn link(&self) -> Link {
        self.link
    }

    pub fn turn(&self) -> &Turn {
        &self.turn
    }

    pub fn legal_moves(&self) -> &LegalMoves {
        &self.legal
    }

    pub fn in_check(&self) -> bool {
        self.in_check
    }

    pub fn is_game_over(&self) -> bool {
        self.turn.is_finished()
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        match &self.turn {
            Turn::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn settings(&self) -> &PlaySettings {
        &self.settings
    }

    pub fn repetition_count(&self) -> u32 {
        self.repetition.count(&self.position)
    }

    /// Would a human move be accepted right now (ignoring its legality)?
    pub fn human_can_move(&self) -> bool {
        self.check_human_turn().is_ok()
    }

    // =========================================================================
    // Transition entry point
    // =========================================================================

    /// Apply one event and return the effects to execute, in order
    ///
    /// This is the only way in: every transition's effects come back from the
    /// call that caused them.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::EngineStarted => self.on_engine_started(),
            SessionEvent::EngineLine(line) => self.on_engine_line(&line),
            SessionEvent::EngineErrorLine(line) => self.on_engine_error_line(&line),
            SessionEvent::EngineExited(code) => self.on_engine_exited(code),
            SessionEvent::TurnDelayElapsed(side) => self.on_turn_delay_elapsed(side),
            SessionEvent::SubmitMove(usi) => {
                if let Err(e) = self.submit_human_move(&usi) {
                    log::info!("human move rejected: {e}");
                    self.log(format!("Move not accepted: {e}"));
                }
            }
            SessionEvent::NewGame => self.new_game(),
            SessionEvent::Resign => {
                if let Err(e) = self.resign() {
                    self.log(format!("Cannot resign: {e}"));
                }
            }
            SessionEvent::SetAutoPlay(on) => self.set_auto_play(on),
            SessionEvent::SetDepth(depth) => self.settings.set_depth(depth),
            SessionEvent::SetRandomness(randomness) => self.settings.set_randomness(randomness),
            SessionEvent::SetTurnDelay(delay) => self.settings.set_turn_delay(delay),
        }
        std::mem::take(&mut self.effects)
    }

    // =========================================================================
    // Effect helpers
    // =========================================================================

    fn send(&mut self, command: EngineCommand) {
        self.effects.push(Effect::Send(command));
    }

    fn notify(&mut self, notification: Notification) {
        self.effects.push(Effect::Notify(notification));
    }

    fn log(&mut self, message: impl Into<String>) {
        self.notify(Notification::Log {
            message: message.into(),
        });
    }

    fn status(&mut self, message: impl Into<String>) {
        self.notify(Notification::Status {
            message: message.into(),
        });
    }

    // =========================================================================
    // Engine link
    // =========================================================================

    fn on_engine_started(&mut self) {
        self.link = Link::AwaitingUsiOk;
        self.legal = LegalMoves::Unknown;
        self.legal_in_flight = 0;
        self.awaiting_check = false;
        self.unconfirmed_move = None;
        if !self.turn.is_finished() {
            self.turn = Turn::Idle;
        }
        self.status("Starting engine…");
        self.send(EngineCommand::Usi);
    }

    fn on_engine_line(&mut self, line: &str) {
        log::debug!("<< {line}");
        match EngineMessage::parse(line) {
            EngineMessage::Empty | EngineMessage::Id => {}
            EngineMessage::UsiOk => {
                if self.link == Link::AwaitingUsiOk {
                    self.link = Link::AwaitingReadyOk;
                    self.send(EngineCommand::IsReady);
                } else {
                    log::warn!("unexpected usiok in {:?}", self.link);
                }
            }
            EngineMessage::ReadyOk => {
                if self.link == Link::AwaitingReadyOk {
                    self.on_ready();
                } else {
                    log::warn!("unexpected readyok in {:?}", self.link);
                }
            }
            EngineMessage::PositionError => self.on_position_error(line),
            EngineMessage::LegalMovesError => {
                self.notify(Notification::Info {
                    line: line.to_string(),
                });
                self.legal_in_flight = self.legal_in_flight.saturating_sub(1);
                if self.legal_in_flight == 0 && self.legal.is_pending() {
                    self.legal = LegalMoves::Unknown;
                }
            }
            EngineMessage::Info => self.notify(Notification::Info {
                line: line.to_string(),
            }),
            EngineMessage::LegalMoves(moves) => self.on_legal_moves(moves),
            EngineMessage::CheckState(in_check) => self.on_check_state(in_check),
            EngineMessage::BestMove(Some(usi)) => self.on_bestmove(&usi),
            EngineMessage::BestMove(None) => {
                log::warn!("bestmove without a move: {line}");
                self.log(line);
            }
            EngineMessage::Other => self.log(line),
        }
    }

    fn on_ready(&mut self) {
        self.link = Link::Ready;
        log::info!("engine ready");
        self.send(EngineCommand::UsiNewGame);
        self.sync_position();
        self.notify(Notification::InfoCleared);
        self.notify(Notification::Ready);
        self.request_legal_moves();
    }

    fn on_engine_error_line(&mut self, line: &str) {
        log::warn!("engine stderr: {line}");
        self.log(format!("[ERR] {line}"));
    }

    fn on_engine_exited(&mut self, code: i32) {
        log::warn!("{}", SessionError::EngineExited(code));
        self.link = Link::Exited(code);
        if matches!(self.turn, Turn::Searching(_) | Turn::DelayedStart(_)) {
            self.turn = Turn::Idle;
        }
        self.legal = LegalMoves::Unknown;
        self.legal_in_flight = 0;
        self.awaiting_check = false;
        self.unconfirmed_move = None;
        self.log(format!("Engine exited (code={code})"));
        self.notify(Notification::Info {
            line: format!("info string engine exited code={code}"),
        });
        self.notify(Notification::EngineExited { code });
        self.status("Engine stopped");
    }

    // =========================================================================
    // Position sync & legal moves
    // =========================================================================

    fn sync_position(&mut self) {
        if !self.link.is_ready() {
            return;
        }
        self.send(EngineCommand::Position {
            moves: self.history.clone(),
        });
    }

    fn request_legal_moves(&mut self) {
        if !self.link.is_ready()
            || self.turn.is_searching()
            || self.turn.is_finished()
            || self.legal.is_pending()
        {
            return;
        }
        self.legal = LegalMoves::Pending {
            ply: self.history.len(),
        };
        self.legal_in_flight += 1;
        self.awaiting_check = false;
        self.send(EngineCommand::LegalMoves);
    }

    /// Forget the cached list, keeping an outstanding request outstanding
    fn invalidate_legal_moves(&mut self) {
        if !self.legal.is_pending() {
            self.legal = LegalMoves::Unknown;
        }
    }

    fn on_legal_moves(&mut self, moves: Vec<String>) {
        self.legal_in_flight = self.legal_in_flight.saturating_sub(1);
        if self.legal_in_flight > 0 {
            log::debug!("discarding legalmoves superseded by a newer request");
            return;
        }
        if let LegalMoves::Pending { ply } = self.legal {
            if ply != self.history.len() {
                log::debug!(
                    "discarding stale legalmoves (requested at ply {ply}, now {})",
                    self.history.len()
                );
                self.legal = LegalMoves::Unknown;
                self.request_legal_moves();
                return;
            }
        }
        self.legal = LegalMoves::Known(moves.clone());
        self.awaiting_check = true;
        self.notify(Notification::LegalMoves { moves });
        self.evaluate_terminal();
        self.maybe_start_engine_turn();
    }

    fn on_check_state(&mut self, in_check: bool) {
        self.in_check = in_check;
        self.awaiting_check = false;
        self.notify(Notification::CheckState { in_check });
        self.evaluate_terminal();
    }

    /// Decide checkmate / no-legal-moves from the engine's answers
    ///
    /// An empty list is judged once the `checkstate` that follows it arrived.
    fn evaluate_terminal(&mut self) {
        if self.turn.is_finished() || self.awaiting_check {
            return;
        }
        match &self.legal {
            LegalMoves::Known(moves) if moves.is_empty() => {}
            _ => return,
        }
        let loser = self.position.side_to_move();
        let reason = if self.in_check {
            EndReason::Checkmate
        } else {
            EndReason::NoLegalMoves
        };
        self.finalize(reason, loser);
    }

    // =========================================================================
    // Turn arbitration
    // =========================================================================

    fn maybe_start_engine_turn(&mut self) {
        if !self.link.is_ready() || !self.turn.can_start_search() || self.legal.is_pending() {
            return;
        }
        let side = self.position.side_to_move();
        if !self.settings.is_engine_controlled(side) {
            let label = self.settings.actor_label(side);
            self.status(format!("{label} to move"));
            return;
        }
        if !self.legal.has_moves() {
            self.evaluate_terminal();
            return;
        }
        let delay = if self.settings.auto_play {
            self.settings.turn_delay
        } else {
            Duration::ZERO
        };
        if delay > Duration::ZERO {
            self.turn = Turn::DelayedStart(side);
            self.effects.push(Effect::ScheduleTurn { side, delay });
            let label = self.settings.actor_label(side);
            self.status(format!("{label} is about to move…"));
            return;
        }
        self.begin_search(side);
    }

    fn on_turn_delay_elapsed(&mut self, side: Color) {
        if self.turn != Turn::DelayedStart(side) {
            log::debug!("ignoring superseded turn timer for {side}");
            return;
        }
        self.turn = Turn::Idle;
        self.begin_search(side);
    }

    fn begin_search(&mut self, side: Color) {
        if !self.link.is_ready() || !self.turn.can_start_search() || self.legal.is_pending() {
            return;
        }
        if self.position.side_to_move() != side || !self.settings.is_engine_controlled(side) {
            return;
        }
        if !self.legal.has_moves() {
            self.evaluate_terminal();
            return;
        }
        self.notify(Notification::SelectionReset);
        self.turn = Turn::Searching(side);
        self.unconfirmed_move = None;
        self.sync_position();
        self.send(EngineCommand::Go {
            depth: self.settings.depth,
            random: self.settings.randomness,
        });
        let label = self.settings.actor_label(side);
        self.status(format!("{label} is thinking…"));
    }

    // =========================================================================
    // Moves
    // =========================================================================

    fn on_bestmove(&mut self, usi: &str) {
        if !self.turn.is_searching() {
            log::warn!("stray bestmove {usi}");
            self.log(format!("Ignored bestmove {usi} (no search in progress)"));
            return;
        }
        let mover = self.position.side_to_move();
        self.turn = Turn::Idle;
        self.unconfirmed_move = None;

        if usi == RESIGN {
            self.finalize(EndReason::Resignation, mover);
            return;
        }
        if let Err(e) = self.position.apply_move(usi) {
            log::warn!("engine proposed an illegal move {usi}: {e}");
            self.log(format!("[engine error] illegal move {usi}: {e}"));
            return;
        }
        self.history.push(usi.to_string());
        self.notify(Notification::MoveApplied {
            mover,
            usi: usi.to_string(),
            by_engine: true,
        });
        let label = self.settings.actor_label(mover);
        self.log(format!("{label}: {usi}"));
        self.record_position();
        if self.turn.is_finished() {
            return;
        }
        self.invalidate_legal_moves();
        self.sync_position();
        self.request_legal_moves();
        self.evaluate_terminal();
        self.maybe_start_engine_turn();
    }

    fn check_human_turn(&self) -> Result<(), SessionError> {
        match self.link {
            Link::Ready => {}
            Link::Exited(code) => return Err(SessionError::EngineExited(code)),
            _ => return Err(SessionError::EngineNotReady),
        }
        if self.turn.is_finished() {
            return Err(SessionError::GameOver);
        }
        if self.turn.is_searching() {
            return Err(SessionError::SearchInProgress);
        }
        let human = self.settings.human_color;
        if self.settings.is_engine_controlled(human) {
            return Err(SessionError::HumanSideAutomated);
        }
        if self.position.side_to_move() != human {
            return Err(SessionError::NotHumanTurn);
        }
        Ok(())
    }

    /// Apply a move from the human player and hand the turn to the engine
    fn submit_human_move(&mut self, usi: &str) -> Result<(), SessionError> {
        self.check_human_turn()?;
        let mover = self.position.side_to_move();
        self.position
            .apply_move(usi)
            .map_err(|source| SessionError::IllegalMove {
                usi: usi.to_string(),
                source,
            })?;

        self.history.push(usi.to_string());
        self.unconfirmed_move = Some(usi.to_string());
        self.invalidate_legal_moves();
        self.turn = Turn::Searching(!mover);
        self.notify(Notification::SelectionReset);
        self.notify(Notification::MoveApplied {
            mover,
            usi: usi.to_string(),
            by_engine: false,
        });
        let label = self.settings.actor_label(mover);
        self.log(format!("{label}: {usi}"));
        self.record_position();
        if self.turn.is_finished() {
            return Ok(());
        }

        self.sync_position();
        self.send(EngineCommand::Go {
            depth: self.settings.depth,
            random: self.settings.randomness,
        });
        let label = self.settings.actor_label(!mover);
        self.status(format!("{label} is thinking…"));
        Ok(())
    }

    /// The engine rejected the synced position: undo the unconfirmed human move
    fn on_position_error(&mut self, line: &str) {
        log::warn!("{}", SessionError::ProtocolDesync(line.to_string()));
        self.notify(Notification::Info {
            line: line.to_string(),
        });
        self.log(line);
        if self.legal.is_pending() {
            self.legal = LegalMoves::Unknown;
        }
        if matches!(self.turn, Turn::DelayedStart(_)) {
            self.turn = Turn::Idle;
        }

        let Some(usi) = self.unconfirmed_move.take() else {
            return;
        };
        if self.history.last() != Some(&usi) {
            return;
        }
        self.history.pop();
        if let Err(e) = self.position.load_history(&self.history) {
            log::error!("history no longer replays after rollback: {e}");
        }
        self.repetition.rebuild(&self.history);
        self.turn = Turn::Idle;
        self.legal = LegalMoves::Unknown;
        self.notify(Notification::SelectionReset);
        self.notify(Notification::PositionReloaded);
        self.log(format!("Move {usi} was rolled back"));
        self.status("Please move again");
        self.sync_position();
        self.request_legal_moves();
    }

    /// Count the current position; the fourth occurrence ends the game
    fn record_position(&mut self) {
        if self.turn.is_finished() {
            return;
        }
        let count = self.repetition.record(&self.position);
        if count >= REPETITION_LIMIT {
            self.finalize(EndReason::Repetition, self.settings.human_color);
        }
    }

    fn finalize(&mut self, reason: EndReason, loser: Color) {
        if self.turn.is_finished() {
            return;
        }
        let outcome = GameOutcome::new(reason, loser, &self.settings);
        log::info!("game over: {} ({} loses)", reason.label(), loser);
        self.turn = Turn::Finished(outcome.clone());
        if self.legal.is_pending() {
            self.legal = LegalMoves::Unknown;
        }
        self.unconfirmed_move = None;
        self.notify(Notification::SelectionReset);
        self.status(outcome.status.clone());
        self.log(outcome.message.clone());
        self.notify(Notification::GameOver(outcome));
    }

    // =========================================================================
    // Game lifecycle
    // =========================================================================

    fn new_game(&mut self) {
        self.position.reset();
        self.history.clear();
        self.repetition.reset(&self.position);
        self.turn = Turn::Idle;
        self.legal = LegalMoves::Unknown;
        self.awaiting_check = false;
        self.in_check = false;
        self.unconfirmed_move = None;
        self.notify(Notification::SelectionReset);
        self.notify(Notification::PositionReloaded);
        self.notify(Notification::CheckState { in_check: false });
        self.notify(Notification::InfoCleared);
        self.notify(Notification::GameStarted);
        self.log("New game");
        if self.link.is_ready() {
            self.send(EngineCommand::UsiNewGame);
            self.sync_position();
            self.request_legal_moves();
        }
    }

    /// Switch between human-vs-engine and engine-vs-engine
    fn set_auto_play(&mut self, on: bool) {
        if self.settings.auto_play == on {
            return;
        }
        self.settings.auto_play = on;
        let state = if on { "on" } else { "off" };
        self.notify(Notification::Info {
            line: format!("info string ai_vs_ai_mode={state}"),
        });
        if matches!(self.turn, Turn::DelayedStart(_)) {
            self.turn = Turn::Idle;
        }
        if on {
            self.new_game();
            return;
        }
        if self.link.is_ready() {
            self.request_legal_moves();
        }
    }

    /// The human gives up
    ///
    /// `resign` is appended to the history so the log shows it; the board is
    /// left as it was.
    fn resign(&mut self) -> Result<(), SessionError> {
        if self.turn.is_finished() {
            return Err(SessionError::GameOver);
        }
        if self.settings.auto_play {
            return Err(SessionError::HumanSideAutomated);
        }
        let human = self.settings.human_color;
        self.history.push(RESIGN.to_string());
        let label = self.settings.actor_label(human);
        self.log(format!("{label}: {RESIGN}"));
        self.finalize(EndReason::Resignation, human);
        Ok(())
    }
}
