//! ginko-core: 5五将棋のルールエンジン
//!
//! - [`types`]: 手番・升目・駒・手駒・指し手
//! - [`position`]: 局面の保持、指し手の検証と適用、千日手キー
//!
//! I/O は持たない。合法手・王手の判定はエンジン側に任せる。

pub mod error;
pub mod position;
pub mod types;

pub use error::{IllegalMove, SfenError};
pub use position::{LastMove, PositionState, RepetitionKey, SFEN_START};
