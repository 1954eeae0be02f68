//! 駒（Piece）

use super::{Color, PieceType};

/// 駒（先後の区別あり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub piece_type: PieceType,
}

impl Piece {
    #[inline]
    pub const fn new(color: Color, piece_type: PieceType) -> Piece {
        Piece { color, piece_type }
    }

    /// SFEN 表記（先手は大文字、後手は小文字、成駒は `+` 前置）
    pub fn to_sfen(self) -> String {
        let c = match self.color {
            Color::Black => self.piece_type.base_char(),
            Color::White => self.piece_type.base_char().to_ascii_lowercase(),
        };
        if self.piece_type.is_promoted() {
            format!("+{c}")
        } else {
            c.to_string()
        }
    }

    /// SFEN の駒文字から生駒を得る（大文字なら先手）
    pub fn from_sfen_char(c: char) -> Option<Piece> {
        let color = if c.is_ascii_uppercase() {
            Color::Black
        } else {
            Color::White
        };
        let piece_type = PieceType::from_base_char(c.to_ascii_uppercase())?;
        Some(Piece::new(color, piece_type))
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sfen())
    }
}
