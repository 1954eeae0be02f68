//! ginko-client: 5五将棋 USI エンジンとの対局セッション
//!
//! - [`engine`]: エンジン子プロセスの起動・行単位の送受信・終了検知
//! - [`protocol`]: 送受信する USI 行の型
//! - [`session`]: ハンドシェイク・局面同期・手番管理・終局判定の状態機械（I/O なし）
//! - [`client`]: 上記をまとめて 1 スレッドで回すドライバ
//! - [`config`]: `ginko.toml`

pub mod client;
pub mod config;
pub mod engine;
pub mod protocol;
pub mod session;

pub use client::{Client, ClientCommand, ClientHandle, SessionObserver};
pub use config::{ClientConfig, ConfigError};
pub use engine::{EngineConfig, EngineError, EngineEvent, EngineProcess};
pub use session::{
    EndReason, GameOutcome, Notification, PlaySettings, Session, SessionError, SessionEvent,
};
