//! 端末への表示

use std::fmt::Write as _;
use std::io::{self, Write};

use ginko_client::session::LegalMoves;
use ginko_client::{Notification, Session, SessionObserver};
use ginko_core::PositionState;
use ginko_core::types::{Color, Square};

/// Prints notifications to stdout, as text or one JSON object per line
pub struct TerminalObserver {
    json: bool,
}

impl TerminalObserver {
    pub fn new(json: bool) -> Self {
        TerminalObserver { json }
    }

    fn print(&self, text: &str) {
        let mut out = io::stdout().lock();
        // stdout が閉じていても対局は続ける
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }
}

impl SessionObserver for TerminalObserver {
    fn notify(&mut self, notification: &Notification, session: &Session) {
        if self.json {
            match notification.to_json() {
                Ok(line) => self.print(&line),
                Err(e) => log::warn!("failed to encode notification: {e}"),
            }
            return;
        }

        match notification {
            Notification::Ready => self.print("engine ready"),
            Notification::GameStarted => {
                self.print("--- new game ---");
                self.print(&format_board(session.position()));
            }
            Notification::MoveApplied { .. } => {
                self.print(&format_board(session.position()));
            }
            Notification::PositionReloaded => {
                self.print(&format_board(session.position()));
            }
            Notification::LegalMoves { moves } if session.human_can_move() => {
                self.print(&format!("legal: {}", moves.join(" ")));
            }
            Notification::CheckState { in_check: true } => self.print("check!"),
            Notification::Log { message } => self.print(message),
            Notification::Info { line } => self.print(&format!("  {line}")),
            Notification::Status { message } => self.print(&format!("[{message}]")),
            Notification::GameOver(outcome) => {
                self.print(&format!("*** {} ***", outcome.status));
            }
            Notification::EngineExited { code } => {
                self.print(&format!("engine exited ({code}); type `restart`"));
            }
            Notification::LegalMoves { .. }
            | Notification::CheckState { .. }
            | Notification::InfoCleared
            | Notification::SelectionReset => {}
        }
    }

    fn refresh(&mut self, session: &Session) {
        if self.json {
            let snapshot = serde_json::json!({
                "type": "snapshot",
                "sfen": session.position().to_sfen(),
                "history": session.history(),
                "legal_moves": session.legal_moves().moves(),
                "in_check": session.in_check(),
                "game_over": session.outcome(),
            });
            self.print(&snapshot.to_string());
            return;
        }

        self.print(&format_board(session.position()));
        self.print(&format!("sfen: {}", session.position().to_sfen()));
        match session.legal_moves() {
            LegalMoves::Known(moves) => self.print(&format!("legal: {}", moves.join(" "))),
            LegalMoves::Pending { .. } => self.print("legal: (waiting for engine)"),
            LegalMoves::Unknown => self.print("legal: (unknown)"),
        }
        if let Some(outcome) = session.outcome() {
            self.print(&format!("*** {} ***", outcome.status));
        }
    }
}

/// 盤面図（上が 1 段目、左が 5 筋）
pub fn format_board(pos: &PositionState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "white hand: {}", format_hand(pos, Color::White));
    out.push_str("   5  4  3  2  1\n");
    for row in 0..Square::RANKS as usize {
        out.push(' ');
        for col in 0..Square::FILES as usize {
            let cell = Square::from_grid(row, col)
                .and_then(|sq| pos.piece_at(sq))
                .map(|p| p.to_sfen())
                .unwrap_or_else(|| ".".to_string());
            let _ = write!(out, "{cell:>3}");
        }
        let _ = writeln!(out, "  {}", (b'a' + row as u8) as char);
    }
    let _ = writeln!(out, "black hand: {}", format_hand(pos, Color::Black));
    let _ = write!(out, "{} to move (ply {})", pos.side_to_move(), pos.ply());
    out
}

fn format_hand(pos: &PositionState, color: Color) -> String {
    let counts = pos.hand_counts(color);
    if counts.is_empty() {
        return "-".to_string();
    }
    counts
        .iter()
        .map(|(pt, n)| if *n > 1 { format!("{pt}x{n}") } else { pt.to_string() })
        .collect::<Vec<_>>()
        .join(" ")
}
