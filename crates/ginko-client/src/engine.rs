//! エンジンプロセス（USI エンジンの子プロセス）の入出力
//!
//! stdout / stderr はそれぞれ専用スレッドで行単位に読み、終了は待機スレッドが
//! 1回だけ通知する。すべて [`EngineEvent`] として 1 本のチャネルに流れる。

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::protocol::EngineCommand;

pub const ENGINE_QUIT_TIMEOUT: Duration = Duration::from_secs(5);
pub const ENGINE_QUIT_POLL_INTERVAL: Duration = Duration::from_millis(10);
const ENGINE_WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// エンジンプロセス起動時の設定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub path: PathBuf,
    pub args: Vec<String>,
}

impl EngineConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EngineConfig {
            path: path.into(),
            args: Vec::new(),
        }
    }
}

/// エンジンから届くイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// stdout の1行（改行除去済み）
    Line(String),
    /// stderr の1行
    ErrorLine(String),
    /// プロセス終了（シグナル終了などで終了コードがない場合は 0）
    Exited(i32),
}

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("engine binary not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("engine is not running")]
    NotRunning,

    #[error("failed to spawn engine at {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("engine {0} pipe was not captured")]
    MissingPipe(&'static str),

    #[error("engine I/O error: {0}")]
    Io(#[from] io::Error),
}

/// 起動中のプロセスに紐づく資源
struct RunningEngine {
    child: Arc<Mutex<Child>>,
    stdin: Mutex<Option<BufWriter<ChildStdin>>>,
    events: Receiver<EngineEvent>,
    /// 待機スレッドが終了を検知したら立つ
    exited: Arc<AtomicBool>,
}

impl RunningEngine {
    fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
            || matches!(lock_or_recover(&self.child).try_wait(), Ok(Some(_)))
    }

    /// `quit` を送って終了を待ち、時間内に終わらなければ kill する
    fn shutdown(self) {
        {
            let mut guard = lock_or_recover(&self.stdin);
            if let Some(mut writer) = guard.take() {
                let _ = writeln!(writer, "{}", EngineCommand::Quit).and_then(|_| writer.flush());
                // writer を drop して stdin を閉じる
            }
        }

        let deadline = Instant::now() + ENGINE_QUIT_TIMEOUT;
        while Instant::now() < deadline {
            if self.has_exited() {
                log::info!("engine stopped");
                return;
            }
            thread::sleep(ENGINE_QUIT_POLL_INTERVAL);
        }

        log::warn!("engine did not exit within {ENGINE_QUIT_TIMEOUT:?}; killing it");
        let mut child = lock_or_recover(&self.child);
        let _ = child.kill();
        let _ = child.wait();
    }
}

/// 1本のエンジンに対する入出力をカプセル化する。
pub struct EngineProcess {
    config: EngineConfig,
    running: Option<RunningEngine>,
}

impl EngineProcess {
    pub fn new(config: EngineConfig) -> Self {
        EngineProcess {
            config,
            running: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 起動済みで、まだ終了していないか
    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.has_exited())
    }

    /// プロセスを起動してイベント受信側を返す
    ///
    /// 起動済みなら何もせず既存の受信側を返す。起動ごとに新しいチャネルを作るので、
    /// 前のプロセスのイベントが再起動後に混ざることはない。
    pub fn start(&mut self) -> Result<Receiver<EngineEvent>, EngineError> {
        if let Some(running) = &self.running {
            if !running.has_exited() {
                return Ok(running.events.clone());
            }
            // 自分で終了したプロセスの残骸を片付けてから起動し直す
            log::debug!("discarding exited engine before restart");
            if let Some(dead) = self.running.take() {
                dead.shutdown();
            }
        }

        let path = &self.config.path;
        if !path.exists() {
            return Err(EngineError::NotFound(path.clone()));
        }

        let mut cmd = Command::new(path);
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        detach_process_group(&mut cmd);

        let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
            path: path.clone(),
            source,
        })?;
        let stdin = child.stdin.take().ok_or(EngineError::MissingPipe("stdin"));
        let stdout = child.stdout.take().ok_or(EngineError::MissingPipe("stdout"));
        let stderr = child.stderr.take().ok_or(EngineError::MissingPipe("stderr"));
        let (stdin, stdout, stderr) = match (stdin, stdout, stderr) {
            (Ok(i), Ok(o), Ok(e)) => (i, o, e),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        let (tx, rx) = unbounded();
        spawn_reader("engine-stdout", stdout, tx.clone(), EngineEvent::Line);
        spawn_reader("engine-stderr", stderr, tx.clone(), EngineEvent::ErrorLine);
        let child = Arc::new(Mutex::new(child));
        let exited = Arc::new(AtomicBool::new(false));
        spawn_waiter(Arc::clone(&child), Arc::clone(&exited), tx);

        log::info!("engine started: {}", path.display());
        self.running = Some(RunningEngine {
            child,
            stdin: Mutex::new(Some(BufWriter::new(stdin))),
            events: rx.clone(),
            exited,
        });
        Ok(rx)
    }

    /// 1行送信する（末尾に改行を付けて flush）
    pub fn send_line(&self, text: &str) -> Result<(), EngineError> {
        let running = self.running.as_ref().ok_or(EngineError::NotRunning)?;
        if running.has_exited() {
            return Err(EngineError::NotRunning);
        }
        let mut guard = lock_or_recover(&running.stdin);
        let writer = guard.as_mut().ok_or(EngineError::NotRunning)?;
        log::debug!(">> {text}");
        let result = writer
            .write_all(text.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush());
        match result {
            Ok(()) => Ok(()),
            // 終了検知より先に書き込みが失敗した
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Err(EngineError::NotRunning),
            Err(e) => Err(e.into()),
        }
    }

    /// `quit` を送って終了を待ち、時間内に終わらなければ kill する
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.shutdown();
        }
    }

    /// [`stop`](Self::stop) と同じ手順を別スレッドで行い、すぐ戻る
    ///
    /// 再起動時に呼び出し側のループを止めないために使う。
    pub fn stop_in_background(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let child = Arc::clone(&running.child);
        let result = thread::Builder::new()
            .name("engine-stop".to_string())
            .spawn(move || running.shutdown());
        if let Err(e) = result {
            log::error!("failed to spawn engine-stop thread: {e}; killing engine");
            let mut child = lock_or_recover(&child);
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn spawn_reader<R>(name: &str, stream: R, tx: Sender<EngineEvent>, wrap: fn(String) -> EngineEvent)
where
    R: Read + Send + 'static,
{
    let result = thread::Builder::new().name(name.to_string()).spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            match line {
                Ok(l) => {
                    let l = l.trim_end_matches('\r').to_string();
                    if tx.send(wrap(l)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
    if let Err(e) = result {
        log::error!("failed to spawn {name} thread: {e}");
    }
}

/// 終了を 1 回だけ通知する待機スレッド
fn spawn_waiter(child: Arc<Mutex<Child>>, exited: Arc<AtomicBool>, tx: Sender<EngineEvent>) {
    let result = thread::Builder::new().name("engine-wait".to_string()).spawn(move || {
        loop {
            let status = lock_or_recover(&child).try_wait();
            match status {
                Ok(Some(status)) => {
                    let code = status.code().unwrap_or(0);
                    log::info!("engine exited (code={code})");
                    exited.store(true, Ordering::Release);
                    let _ = tx.send(EngineEvent::Exited(code));
                    return;
                }
                Ok(None) => thread::sleep(ENGINE_WAIT_POLL_INTERVAL),
                Err(e) => {
                    log::warn!("failed to wait for engine: {e}");
                    exited.store(true, Ordering::Release);
                    let _ = tx.send(EngineEvent::Exited(0));
                    return;
                }
            }
        }
    });
    if let Err(e) = result {
        log::error!("failed to spawn engine-wait thread: {e}");
    }
}

/// 端末の Ctrl-C がエンジンに直接届かないよう、子を別プロセスグループにする
#[cfg(unix)]
fn detach_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;

    // SAFETY: fork 後 exec 前に async-signal-safe な setpgid だけを呼ぶ
    unsafe {
        cmd.pre_exec(|| {
            if libc::setpgid(0, 0) == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn detach_process_group(_cmd: &mut Command) {}

/// エンジンバイナリを `<root>/engine/target/{debug,release}/` から探す。
pub fn find_engine_in_dir(root: &Path) -> Option<PathBuf> {
    #[cfg(windows)]
    let name = "engine.exe";
    #[cfg(not(windows))]
    let name = "engine";

    ["debug", "release"]
        .into_iter()
        .map(|profile| root.join("engine").join("target").join(profile).join(name))
        .find(|candidate| candidate.is_file())
}

/// 見つからなかった場合の既定パス（release ビルド）
pub fn default_engine_path(root: &Path) -> PathBuf {
    #[cfg(windows)]
    let name = "engine.exe";
    #[cfg(not(windows))]
    let name = "engine";

    root.join("engine").join("target").join("release").join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_process_is_not_running() {
        let engine = EngineProcess::new(EngineConfig::new("/nonexistent/engine"));
        assert!(matches!(engine.send_line("usi"), Err(EngineError::NotRunning)));
    }

    #[test]
    fn test_start_missing_binary() {
        let mut engine = EngineProcess::new(EngineConfig::new("/nonexistent/engine"));
        assert!(matches!(engine.start(), Err(EngineError::NotFound(_))));
        assert!(!engine.is_running());
    }

    #[test]
    fn test_find_engine_prefers_debug_build() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_engine_in_dir(dir.path()), None);

        let release = default_engine_path(dir.path());
        std::fs::create_dir_all(release.parent().unwrap()).unwrap();
        std::fs::write(&release, b"").unwrap();
        assert_eq!(find_engine_in_dir(dir.path()), Some(release.clone()));

        let debug = dir
            .path()
            .join("engine")
            .join("target")
            .join("debug")
            .join(release.file_name().unwrap());
        std::fs::create_dir_all(debug.parent().unwrap()).unwrap();
        std::fs::write(&debug, b"").unwrap();
        assert_eq!(find_engine_in_dir(dir.path()), Some(debug));
    }
}
