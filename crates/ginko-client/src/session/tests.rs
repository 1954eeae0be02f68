//! Event-sequence tests for the session state machine

use std::time::Duration;

use ginko_core::types::Color;

use super::*;

fn line(s: &str) -> SessionEvent {
    SessionEvent::EngineLine(s.to_string())
}

/// Engine commands among the effects, rendered as protocol lines
fn sent(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Send(cmd) => Some(cmd.to_string()),
            _ => None,
        })
        .collect()
}

fn notifications(effects: &[Effect]) -> Vec<&Notification> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Notify(n) => Some(n),
            _ => None,
        })
        .collect()
}

fn game_overs(effects: &[Effect]) -> Vec<GameOutcome> {
    notifications(effects)
        .into_iter()
        .filter_map(|n| match n {
            Notification::GameOver(outcome) => Some(outcome.clone()),
            _ => None,
        })
        .collect()
}

fn logs(effects: &[Effect]) -> Vec<String> {
    notifications(effects)
        .into_iter()
        .filter_map(|n| match n {
            Notification::Log { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

fn schedules(effects: &[Effect]) -> Vec<(Color, Duration)> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::ScheduleTurn { side, delay } => Some((*side, *delay)),
            _ => None,
        })
        .collect()
}

/// Session after the handshake; the initial `legalmoves` is still outstanding
fn handshaken(settings: PlaySettings) -> Session {
    let mut session = Session::new(settings);
    session.handle(SessionEvent::EngineStarted);
    session.handle(line("usiok"));
    session.handle(line("readyok"));
    session
}

/// Human-vs-engine session where it is the human's (Black's) turn
fn human_to_move() -> Session {
    let mut session = handshaken(PlaySettings::default());
    session.handle(line("legalmoves 5d5c 4e4d"));
    session.handle(line("checkstate false"));
    session
}

#[test]
fn handshake_sequence() {
    let mut session = Session::new(PlaySettings::default());
    assert_eq!(session.link(), Link::NotStarted);

    let effects = session.handle(SessionEvent::EngineStarted);
    assert_eq!(sent(&effects), vec!["usi"]);

    assert!(session.handle(line("id name Ginko5x5")).is_empty());
    assert!(session.handle(line("id author test")).is_empty());

    let effects = session.handle(line("usiok"));
    assert_eq!(sent(&effects), vec!["isready"]);

    let effects = session.handle(line("readyok"));
    assert_eq!(sent(&effects), vec!["usinewgame", "position startpos", "legalmoves"]);
    assert!(notifications(&effects).contains(&&Notification::Ready));
    assert!(session.link().is_ready());
    assert!(session.legal_moves().is_pending());
}

#[test]
fn readyok_before_usiok_is_ignored() {
    let mut session = Session::new(PlaySettings::default());
    session.handle(SessionEvent::EngineStarted);
    let effects = session.handle(line("readyok"));
    assert!(sent(&effects).is_empty());
    assert_eq!(session.link(), Link::AwaitingUsiOk);
}

#[test]
fn human_turn_waits_for_input() {
    let mut session = handshaken(PlaySettings::default());
    let effects = session.handle(line("legalmoves 5d5c 4e4d"));
    assert!(sent(&effects).is_empty());
    assert_eq!(session.legal_moves().moves(), ["5d5c", "4e4d"]);
    assert!(session.human_can_move());
}

#[test]
fn human_move_syncs_and_starts_search() {
    let mut session = human_to_move();
    let effects = session.handle(SessionEvent::SubmitMove("5d5c".to_string()));

    assert_eq!(sent(&effects), vec!["position startpos moves 5d5c", "go depth 3 random 200"]);
    assert_eq!(session.turn(), &Turn::Searching(Color::White));
    assert_eq!(session.history(), ["5d5c"]);
    assert!(notifications(&effects).contains(&&Notification::MoveApplied {
        mover: Color::Black,
        usi: "5d5c".to_string(),
        by_engine: false,
    }));
}

#[test]
fn human_move_rejections() {
    let mut session = Session::new(PlaySettings::default());
    assert_eq!(session.submit_human_move("5d5c"), Err(SessionError::EngineNotReady));

    let mut session = human_to_move();
    let err = session.submit_human_move("5e4e").unwrap_err();
    assert!(matches!(err, SessionError::IllegalMove { .. }));
    assert!(session.history().is_empty());

    let effects = session.handle(SessionEvent::SubmitMove("5d5c".to_string()));
    assert_eq!(sent(&effects).len(), 2);
    assert_eq!(session.submit_human_move("4e4d"), Err(SessionError::SearchInProgress));

    // rejection through the event path becomes a log line
    let effects = session.handle(SessionEvent::SubmitMove("4e4d".to_string()));
    assert!(sent(&effects).is_empty());
    assert_eq!(logs(&effects).len(), 1);
}

#[test]
fn effects_come_back_from_the_causing_event() {
    let mut session = human_to_move();
    let effects = session.handle(SessionEvent::SubmitMove("5d5c".to_string()));
    assert_eq!(sent(&effects), vec!["position startpos moves 5d5c", "go depth 3 random 200"]);

    // 無関係な行に前の遷移のコマンドが混ざらない
    let effects = session.handle(line("info depth 1"));
    assert!(sent(&effects).is_empty());

    let effects = session.handle(line("bestmove resign"));
    assert_eq!(game_overs(&effects).len(), 1);
    let effects = session.handle(SessionEvent::NewGame);
    assert_eq!(sent(&effects), vec!["usinewgame", "position startpos", "legalmoves"]);
    assert!(session.handle(line("info depth 1")).iter().all(|e| !matches!(e, Effect::Send(_))));
}

#[test]
fn engine_bestmove_is_applied() {
    let mut session = human_to_move();
    session.handle(SessionEvent::SubmitMove("5d5c".to_string()));

    let effects = session.handle(line("bestmove 1b1c"));
    assert_eq!(sent(&effects), vec!["position startpos moves 5d5c 1b1c", "legalmoves"]);
    assert_eq!(session.history(), ["5d5c", "1b1c"]);
    assert_eq!(session.turn(), &Turn::Idle);
    assert_eq!(session.position().side_to_move(), Color::Black);
    assert!(notifications(&effects).contains(&&Notification::MoveApplied {
        mover: Color::White,
        usi: "1b1c".to_string(),
        by_engine: true,
    }));
}

#[test]
fn stray_bestmove_only_logs() {
    let mut session = human_to_move();
    let before = session.position().clone();

    let effects = session.handle(line("bestmove 1b1c"));

    assert_eq!(session.position(), &before);
    assert!(session.history().is_empty());
    assert!(sent(&effects).is_empty());
    assert_eq!(logs(&effects).len(), 1);
}

#[test]
fn illegal_engine_move_leaves_position_untouched() {
    let mut session = human_to_move();
    session.handle(SessionEvent::SubmitMove("5d5c".to_string()));
    let before = session.position().clone();

    // 5e は先手玉
    let effects = session.handle(line("bestmove 5e5d"));

    assert_eq!(session.position(), &before);
    assert_eq!(session.history(), ["5d5c"]);
    assert_eq!(session.turn(), &Turn::Idle);
    assert!(logs(&effects)[0].starts_with("[engine error]"));
}

#[test]
fn checkmate_finalizes_once() {
    let mut session = handshaken(PlaySettings::default());

    let effects = session.handle(line("legalmoves"));
    assert!(game_overs(&effects).is_empty(), "waits for checkstate");

    let effects = session.handle(line("checkstate true"));
    let outcomes = game_overs(&effects);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].reason, EndReason::Checkmate);
    assert_eq!(outcomes[0].loser, Color::Black);
    assert_eq!(outcomes[0].winner, Color::White);
    assert!(session.is_game_over());

    assert!(game_overs(&session.handle(line("checkstate true"))).is_empty());
    assert!(game_overs(&session.handle(line("legalmoves"))).is_empty());
}

#[test]
fn checkstate_before_empty_list_is_checkmate() {
    let mut session = handshaken(PlaySettings::default());
    session.handle(line("checkstate true"));
    // 応答待ちの間は判定しない
    assert!(!session.is_game_over());
    let effects = session.handle(line("legalmoves"));
    assert!(game_overs(&effects).is_empty());
    let effects = session.handle(line("checkstate true"));
    assert_eq!(game_overs(&effects)[0].reason, EndReason::Checkmate);
}

#[test]
fn empty_list_without_check_is_no_legal_moves() {
    let mut session = handshaken(PlaySettings::default());
    session.handle(line("legalmoves"));
    let effects = session.handle(line("checkstate false"));
    let outcomes = game_overs(&effects);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].reason, EndReason::NoLegalMoves);
    assert_eq!(outcomes[0].loser, Color::Black);
}

#[test]
fn legalmoves_error_clears_pending_request() {
    let mut session = handshaken(PlaySettings::default());
    let effects = session.handle(line("info string legalmoves error: broken"));
    assert_eq!(session.legal_moves(), &LegalMoves::Unknown);
    assert!(matches!(notifications(&effects)[0], Notification::Info { .. }));
    assert!(!session.is_game_over());
}

#[test]
fn position_error_rolls_back_human_move() {
    let mut session = human_to_move();
    session.handle(SessionEvent::SubmitMove("5d5c".to_string()));

    let effects = session.handle(line("info string position error: illegal move 5d5c"));

    assert!(session.history().is_empty());
    assert_eq!(session.position(), &ginko_core::PositionState::new());
    assert_eq!(session.turn(), &Turn::Idle);
    assert_eq!(session.repetition_count(), 1);
    assert_eq!(sent(&effects), vec!["position startpos", "legalmoves"]);
    assert!(notifications(&effects).contains(&&Notification::PositionReloaded));

    // search result for the rejected position is now stray
    let effects = session.handle(line("bestmove 1b1c"));
    assert!(session.history().is_empty());
    assert_eq!(logs(&effects).len(), 1);
}

#[test]
fn position_error_without_unconfirmed_move_keeps_history() {
    let mut session = human_to_move();
    session.handle(SessionEvent::SubmitMove("5d5c".to_string()));
    session.handle(line("bestmove 1b1c"));

    let effects = session.handle(line("info string position error: whatever"));
    assert_eq!(session.history(), ["5d5c", "1b1c"]);
    assert!(sent(&effects).is_empty());
}

#[test]
fn fourfold_repetition_finalizes_once() {
    let mut session = human_to_move();
    let mut outcomes = Vec::new();
    for _ in 0..3 {
        for (human, engine) in [("4e4d", "2a2b"), ("4d4e", "2b2a")] {
            session.handle(SessionEvent::SubmitMove(human.to_string()));
            outcomes.extend(game_overs(&session.handle(line(&format!("bestmove {engine}")))));
            if !session.is_game_over() {
                session.handle(line("legalmoves 4e4d 4d4e"));
                session.handle(line("checkstate false"));
            }
        }
    }

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].reason, EndReason::Repetition);
    assert_eq!(outcomes[0].loser, Color::Black);
    assert_eq!(session.history().len(), 12);
    assert_eq!(session.repetition_count(), 4);

    let effects = session.handle(line("bestmove 2a2b"));
    assert!(game_overs(&effects).is_empty());
}

#[test]
fn auto_play_schedules_delayed_turns() {
    let mut session = handshaken(PlaySettings::default());
    session.handle(line("legalmoves 5d5c"));

    let effects = session.handle(SessionEvent::SetAutoPlay(true));
    assert_eq!(sent(&effects), vec!["usinewgame", "position startpos", "legalmoves"]);
    assert!(notifications(&effects).contains(&&Notification::GameStarted));

    let effects = session.handle(line("legalmoves 5d5c 4e4d"));
    assert_eq!(schedules(&effects), vec![(Color::Black, DEFAULT_TURN_DELAY)]);
    assert_eq!(session.turn(), &Turn::DelayedStart(Color::Black));
    assert!(sent(&effects).is_empty());
    session.handle(line("checkstate false"));

    // 別の手番向けのタイマーは無視
    assert!(session.handle(SessionEvent::TurnDelayElapsed(Color::White)).is_empty());

    let effects = session.handle(SessionEvent::TurnDelayElapsed(Color::Black));
    assert_eq!(sent(&effects), vec!["position startpos", "go depth 3 random 200"]);

    let effects = session.handle(line("bestmove 5d5c"));
    assert_eq!(sent(&effects), vec!["position startpos moves 5d5c", "legalmoves"]);
    let effects = session.handle(line("legalmoves 1b1c"));
    assert_eq!(schedules(&effects), vec![(Color::White, DEFAULT_TURN_DELAY)]);
}

#[test]
fn zero_delay_auto_play_starts_immediately() {
    let settings = PlaySettings {
        auto_play: true,
        turn_delay: Duration::ZERO,
        ..PlaySettings::default()
    };
    let mut session = handshaken(settings);
    let effects = session.handle(line("legalmoves 5d5c"));
    assert!(schedules(&effects).is_empty());
    assert_eq!(sent(&effects), vec!["position startpos", "go depth 3 random 200"]);
    assert!(!session.human_can_move());
    assert_eq!(
        session.submit_human_move("5d5c"),
        Err(SessionError::SearchInProgress)
    );
}

#[test]
fn new_game_cancels_scheduled_turn() {
    let settings = PlaySettings {
        auto_play: true,
        ..PlaySettings::default()
    };
    let mut session = handshaken(settings);
    session.handle(line("legalmoves 5d5c"));
    assert_eq!(session.turn(), &Turn::DelayedStart(Color::Black));

    session.handle(SessionEvent::NewGame);
    assert_eq!(session.turn(), &Turn::Idle);
    let effects = session.handle(SessionEvent::TurnDelayElapsed(Color::Black));
    assert!(sent(&effects).is_empty());
}

#[test]
fn disabling_auto_play_hands_turn_back() {
    let settings = PlaySettings {
        auto_play: true,
        ..PlaySettings::default()
    };
    let mut session = handshaken(settings);
    session.handle(line("legalmoves 5d5c"));
    session.handle(line("checkstate false"));

    let effects = session.handle(SessionEvent::SetAutoPlay(false));
    assert_eq!(session.turn(), &Turn::Idle);
    assert_eq!(sent(&effects), vec!["legalmoves"]);

    session.handle(line("legalmoves 5d5c"));
    assert!(session.human_can_move());
}

#[test]
fn engine_resignation_ends_game() {
    let mut session = human_to_move();
    session.handle(SessionEvent::SubmitMove("5d5c".to_string()));
    let effects = session.handle(line("bestmove resign"));
    let outcomes = game_overs(&effects);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].reason, EndReason::Resignation);
    assert_eq!(outcomes[0].loser, Color::White);
    assert_eq!(session.history(), ["5d5c"]);
}

#[test]
fn human_resignation_records_resign() {
    let mut session = human_to_move();
    let effects = session.handle(SessionEvent::Resign);
    let outcomes = game_overs(&effects);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].loser, Color::Black);
    assert_eq!(session.history(), ["resign"]);
    assert_eq!(session.resign(), Err(SessionError::GameOver));
}

#[test]
fn engine_exit_disables_play_until_restart() {
    let mut session = human_to_move();
    let effects = session.handle(SessionEvent::EngineExited(3));
    assert!(notifications(&effects).contains(&&Notification::EngineExited { code: 3 }));
    assert_eq!(session.link(), Link::Exited(3));
    assert_eq!(session.submit_human_move("5d5c"), Err(SessionError::EngineExited(3)));

    let effects = session.handle(SessionEvent::EngineStarted);
    assert_eq!(sent(&effects), vec!["usi"]);
}

#[test]
fn stderr_and_unknown_lines_are_logged() {
    let mut session = Session::new(PlaySettings::default());
    let effects = session.handle(SessionEvent::EngineErrorLine("panic".to_string()));
    assert_eq!(logs(&effects), vec!["[ERR] panic"]);

    let effects = session.handle(line("option name Hash type spin"));
    assert_eq!(logs(&effects), vec!["option name Hash type spin"]);

    let effects = session.handle(line("info depth 3 score cp 10"));
    assert_eq!(
        notifications(&effects),
        vec![&Notification::Info {
            line: "info depth 3 score cp 10".to_string()
        }]
    );
}

#[test]
fn stale_legal_moves_are_discarded() {
    let mut session = handshaken(PlaySettings::default());
    // 初回要求に答える前に人間が指す
    session.handle(SessionEvent::SubmitMove("5d5c".to_string()));
    let effects = session.handle(line("legalmoves 5d5c 4e4d"));
    assert!(notifications(&effects).is_empty());
    assert_eq!(session.legal_moves(), &LegalMoves::Unknown);
}

#[test]
fn think_parameters_reach_go() {
    let mut session = human_to_move();
    session.handle(SessionEvent::SetDepth(0));
    session.handle(SessionEvent::SetRandomness(50));
    let effects = session.handle(SessionEvent::SubmitMove("5d5c".to_string()));
    assert_eq!(sent(&effects)[1], "go depth 1 random 50");
}
