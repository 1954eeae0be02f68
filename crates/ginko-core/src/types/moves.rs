//! 指し手（Move）

use super::{PieceType, Square};

/// 投了を表す指し手文字列
pub const RESIGN: &str = "resign";

/// USI 形式で表された指し手
///
/// - 駒打ち: `P*2c`
/// - 盤上の移動: `5d5c` / 成り `2b2a+`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Drop {
        piece_type: PieceType,
        to: Square,
    },
    Normal {
        from: Square,
        to: Square,
        promote: bool,
    },
}

impl Move {
    /// 移動先
    #[inline]
    pub const fn to(self) -> Square {
        match self {
            Move::Drop { to, .. } | Move::Normal { to, .. } => to,
        }
    }

    /// 移動元（駒打ちは None）
    #[inline]
    pub const fn from(self) -> Option<Square> {
        match self {
            Move::Drop { .. } => None,
            Move::Normal { from, .. } => Some(from),
        }
    }

    /// USI形式の文字列に変換
    pub fn to_usi(self) -> String {
        match self {
            Move::Drop { piece_type, to } => format!("{}*{to}", piece_type.base_char()),
            Move::Normal { from, to, promote } => {
                let promote = if promote { "+" } else { "" };
                format!("{from}{to}{promote}")
            }
        }
    }

    /// USI形式の文字列からMoveに変換
    ///
    /// 余分な文字が付いた文字列は受け付けない。
    pub fn from_usi(s: &str) -> Option<Move> {
        if !s.is_ascii() {
            return None;
        }

        // 駒打ち判定（"P*2c" 形式）
        if s.len() == 4 && s.as_bytes()[1] == b'*' {
            let piece_type = PieceType::from_base_char(s.as_bytes()[0] as char)?;
            let to = Square::from_usi(&s[2..4])?;
            return Some(Move::Drop { piece_type, to });
        }

        // 通常の移動（"5d5c" または "2b2a+" 形式）
        let promote = match s.len() {
            4 => false,
            5 if s.ends_with('+') => true,
            _ => return None,
        };
        let from = Square::from_usi(&s[0..2])?;
        let to = Square::from_usi(&s[2..4])?;
        Some(Move::Normal { from, to, promote })
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_usi())
    }
}
