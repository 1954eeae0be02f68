//! stdin から端末コマンドを読むスレッド

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ginko_client::{ClientCommand, ClientHandle};
use ginko_core::types::Move;

pub const HELP: &str = "\
commands:
  <move> | move <move>   play a move (e.g. 5d5c, 2b2a+, P*3c)
  new                    start a new game
  resign                 resign the current game
  auto [on|off]          engine plays both sides (toggle without argument)
  depth <n>              search depth
  random <n>             move randomness
  delay <ms>             pause between engine moves in auto mode
  board                  show the board
  moves                  show the legal moves
  restart                restart the engine
  help                   this text
  quit                   exit";

/// 1行のコマンドを解釈する（空行は `Ok(None)`）
pub fn parse_command(line: &str) -> Result<Option<ClientCommand>, String> {
    let mut tokens = line.split_whitespace();
    let Some(head) = tokens.next() else {
        return Ok(None);
    };
    let arg = tokens.next();
    if tokens.next().is_some() {
        return Err(format!("too many arguments: {line}"));
    }

    let command = match (head, arg) {
        ("move", Some(mv)) => ClientCommand::SubmitMove(mv.to_string()),
        ("new", None) => ClientCommand::NewGame,
        ("resign", None) => ClientCommand::Resign,
        ("auto", None) => ClientCommand::ToggleAutoPlay,
        ("auto", Some("on")) => ClientCommand::SetAutoPlay(true),
        ("auto", Some("off")) => ClientCommand::SetAutoPlay(false),
        ("depth", Some(n)) => ClientCommand::SetDepth(parse_number(n)?),
        ("random", Some(n)) => ClientCommand::SetRandomness(parse_number(n)?),
        ("delay", Some(ms)) => ClientCommand::SetTurnDelay(Duration::from_millis(
            ms.parse().map_err(|_| format!("not a number: {ms}"))?,
        )),
        ("board" | "moves", None) => ClientCommand::Refresh,
        ("restart", None) => ClientCommand::RestartEngine,
        ("quit" | "exit", None) => ClientCommand::Shutdown,
        (mv, None) if Move::from_usi(mv).is_some() => ClientCommand::SubmitMove(mv.to_string()),
        _ => return Err(format!("unknown command: {line} (type `help`)")),
    };
    Ok(Some(command))
}

fn parse_number(s: &str) -> Result<u32, String> {
    s.parse().map_err(|_| format!("not a number: {s}"))
}

/// Spawn stdin reader thread
///
/// EOF（パイプが閉じた場合も含む）で `Shutdown` を送って終わる。
pub fn spawn_stdin_reader(handle: ClientHandle) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("failed to read stdin: {e}");
                    break;
                }
            };
            let line = line.trim();
            if line == "help" {
                println!("{HELP}");
                continue;
            }
            match parse_command(line) {
                Ok(Some(command)) => {
                    log::debug!("Received: {line}");
                    let quit = command == ClientCommand::Shutdown;
                    if !handle.send(command) || quit {
                        return;
                    }
                }
                Ok(None) => {}
                Err(message) => println!("{message}"),
            }
        }
        log::debug!("stdin closed");
        handle.shutdown();
    })
}
