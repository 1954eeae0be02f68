//! 5五将棋の基本型
//!
//! 盤（5x5）・駒・手駒・指し手の閉じた型を定義する。

mod color;
mod hand;
mod moves;
mod piece;
mod piece_type;
mod square;

pub use color::Color;
pub use hand::Hand;
pub use moves::{Move, RESIGN};
pub use piece::Piece;
pub use piece_type::PieceType;
pub use square::Square;
