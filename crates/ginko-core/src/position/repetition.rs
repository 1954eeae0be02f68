//! 千日手判定用の局面キー（RepetitionKey）

use crate::types::{Color, Hand, Piece, Square};

/// 局面の同一性を表すキー
///
/// 盤面・両者の手駒・手番の値コピー。盤面は升目順の固定長配列、手駒は
/// 駒種ごとの枚数なので、駒を置いた順序に依存せず同じ局面は同じキーになる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RepetitionKey {
    board: [Option<Piece>; Square::NUM],
    hands: [Hand; Color::NUM],
    side_to_move: Color,
}

impl RepetitionKey {
    pub(super) fn new(
        board: &[Option<Piece>; Square::NUM],
        hands: &[Hand; Color::NUM],
        side_to_move: Color,
    ) -> Self {
        RepetitionKey {
            board: *board,
            hands: *hands,
            side_to_move,
        }
    }

    /// キーの手番
    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }
}
