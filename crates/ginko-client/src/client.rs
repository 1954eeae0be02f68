//! Consumer loop: owns the engine process and the session
//!
//! Engine events, front-end commands and the inter-turn timer are multiplexed
//! with `crossbeam_channel::select!` on one thread. Every effect returned by
//! the session is executed here, in order.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, after, never, select, unbounded};

use ginko_core::types::Color;

use crate::engine::{EngineConfig, EngineError, EngineEvent, EngineProcess};
use crate::protocol::EngineCommand;
use crate::session::{Effect, Notification, PlaySettings, Session, SessionEvent};

/// Receives every notification the session emits
pub trait SessionObserver {
    fn notify(&mut self, notification: &Notification, session: &Session);

    /// Called for [`ClientCommand::Refresh`]; front-ends redraw from the session
    fn refresh(&mut self, _session: &Session) {}
}

/// Commands from the front-end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    SubmitMove(String),
    NewGame,
    Resign,
    SetAutoPlay(bool),
    ToggleAutoPlay,
    SetDepth(u32),
    SetRandomness(u32),
    SetTurnDelay(Duration),
    /// Stop the engine and start it again
    RestartEngine,
    /// Ask the observer to redraw
    Refresh,
    Shutdown,
}

/// Cloneable sender side for front-ends, the stdin reader and the Ctrl-C handler
#[derive(Debug, Clone)]
pub struct ClientHandle {
    tx: Sender<ClientCommand>,
}

impl ClientHandle {
    /// Returns false once the client loop has gone away
    pub fn send(&self, command: ClientCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn submit_move(&self, usi: impl Into<String>) -> bool {
        self.send(ClientCommand::SubmitMove(usi.into()))
    }

    pub fn shutdown(&self) -> bool {
        self.send(ClientCommand::Shutdown)
    }
}

impl From<EngineEvent> for SessionEvent {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::Line(line) => SessionEvent::EngineLine(line),
            EngineEvent::ErrorLine(line) => SessionEvent::EngineErrorLine(line),
            EngineEvent::Exited(code) => SessionEvent::EngineExited(code),
        }
    }
}

/// What the loop does after one `select!` round
enum Step {
    Continue,
    ReplaceEvents(Receiver<EngineEvent>),
    Shutdown,
}

/// The driver
pub struct Client<O: SessionObserver> {
    session: Session,
    engine: EngineProcess,
    observer: O,
    commands: Receiver<ClientCommand>,
    /// Armed one-shot turn timer
    timer: Option<(Color, Receiver<std::time::Instant>)>,
}

impl<O: SessionObserver> Client<O> {
    pub fn new(engine: EngineConfig, settings: PlaySettings, observer: O) -> (Self, ClientHandle) {
        let (tx, rx) = unbounded();
        let client = Client {
            session: Session::new(settings),
            engine: EngineProcess::new(engine),
            observer,
            commands: rx,
            timer: None,
        };
        (client, ClientHandle { tx })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Start the engine and process events until shutdown
    ///
    /// Fails only if the engine cannot be started the first time.
    pub fn run(mut self) -> Result<O, EngineError> {
        let mut events = self.start_engine()?;
        let commands = self.commands.clone();

        loop {
            let timer = self
                .timer
                .as_ref()
                .map(|(_, rx)| rx.clone())
                .unwrap_or_else(never);

            let step = select! {
                recv(events) -> event => match event {
                    Ok(event) => {
                        self.dispatch(event.into());
                        Step::Continue
                    }
                    Err(_) => {
                        log::debug!("engine event channel closed");
                        Step::ReplaceEvents(never())
                    }
                },
                recv(commands) -> command => match command {
                    Ok(ClientCommand::Shutdown) | Err(_) => Step::Shutdown,
                    Ok(ClientCommand::RestartEngine) => Step::ReplaceEvents(self.restart_engine()),
                    Ok(ClientCommand::Refresh) => {
                        self.observer.refresh(&self.session);
                        Step::Continue
                    }
                    Ok(command) => {
                        if let Some(event) = self.to_event(command) {
                            self.dispatch(event);
                        }
                        Step::Continue
                    }
                },
                recv(timer) -> _ => {
                    if let Some((side, _)) = self.timer.take() {
                        self.dispatch(SessionEvent::TurnDelayElapsed(side));
                    }
                    Step::Continue
                },
            };

            match step {
                Step::Continue => {}
                Step::ReplaceEvents(rx) => events = rx,
                Step::Shutdown => break,
            }
        }

        log::info!("shutting down");
        self.engine.stop();
        Ok(self.observer)
    }

    fn start_engine(&mut self) -> Result<Receiver<EngineEvent>, EngineError> {
        let events = self.engine.start()?;
        self.dispatch(SessionEvent::EngineStarted);
        Ok(events)
    }

    fn restart_engine(&mut self) -> Receiver<EngineEvent> {
        self.engine.stop_in_background();
        self.timer = None;
        match self.start_engine() {
            Ok(events) => events,
            Err(e) => {
                log::error!("engine restart failed: {e}");
                self.emit(&Notification::Log {
                    message: format!("Engine restart failed: {e}"),
                });
                never()
            }
        }
    }

    /// Session event for a command; `None` for commands the loop handles itself
    fn to_event(&self, command: ClientCommand) -> Option<SessionEvent> {
        let event = match command {
            ClientCommand::SubmitMove(usi) => SessionEvent::SubmitMove(usi),
            ClientCommand::NewGame => SessionEvent::NewGame,
            ClientCommand::Resign => SessionEvent::Resign,
            ClientCommand::SetAutoPlay(on) => SessionEvent::SetAutoPlay(on),
            ClientCommand::ToggleAutoPlay => {
                SessionEvent::SetAutoPlay(!self.session.settings().auto_play)
            }
            ClientCommand::SetDepth(depth) => SessionEvent::SetDepth(depth),
            ClientCommand::SetRandomness(randomness) => SessionEvent::SetRandomness(randomness),
            ClientCommand::SetTurnDelay(delay) => SessionEvent::SetTurnDelay(delay),
            ClientCommand::RestartEngine | ClientCommand::Refresh | ClientCommand::Shutdown => {
                return None;
            }
        };
        Some(event)
    }

    fn dispatch(&mut self, event: SessionEvent) {
        for effect in self.session.handle(event) {
            match effect {
                Effect::Send(command) => self.send(&command),
                Effect::ScheduleTurn { side, delay } => {
                    self.timer = Some((side, after(delay)));
                }
                Effect::Notify(notification) => self.emit(&notification),
            }
        }
    }

    fn send(&mut self, command: &EngineCommand) {
        if let Err(e) = self.engine.send_line(&command.to_string()) {
            log::warn!("failed to send `{command}`: {e}");
            self.emit(&Notification::Log {
                message: format!("Failed to send `{command}`: {e}"),
            });
        }
    }

    fn emit(&mut self, notification: &Notification) {
        self.observer.notify(notification, &self.session);
    }
}
