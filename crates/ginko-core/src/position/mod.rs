//! 局面（PositionState）
//!
//! 盤面・手駒・手番を保持し、USI 形式の指し手を検証して適用する。
//! 王手や詰みの判定は行わない（エンジン側の責務）。

mod repetition;
mod sfen;

pub use repetition::RepetitionKey;

use crate::error::IllegalMove;
use crate::types::{Color, Hand, Move, Piece, PieceType, RESIGN, Square};

/// 5五将棋の開始局面
pub const SFEN_START: &str = "rbsgk/4p/5/P4/KGSBR b - 1";

/// 直前の指し手（盤上ハイライト用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastMove {
    /// 移動元（駒打ちは None）
    pub from: Option<Square>,
    pub to: Square,
}

/// 局面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionState {
    board: [Option<Piece>; Square::NUM],
    hands: [Hand; Color::NUM],
    side_to_move: Color,
    last_move: Option<LastMove>,
    ply: u32,
}

impl Default for PositionState {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionState {
    /// 開始局面で生成
    pub fn new() -> Self {
        let mut pos = Self::empty();
        pos.reset();
        pos
    }

    /// 駒のない空の局面（先手番）
    pub fn empty() -> Self {
        PositionState {
            board: [None; Square::NUM],
            hands: [Hand::EMPTY; Color::NUM],
            side_to_move: Color::Black,
            last_move: None,
            ply: 1,
        }
    }

    /// 開始局面に戻す
    pub fn reset(&mut self) {
        // 定数文字列なので失敗しない
        if let Err(e) = self.set_sfen(SFEN_START) {
            unreachable!("start position must parse: {e}");
        }
    }

    /// 全消去（空盤・手駒なし・先手番）
    pub fn clear(&mut self) {
        *self = Self::empty();
    }

    // =========================================================================
    // 参照
    // =========================================================================

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index()]
    }

    #[inline]
    pub fn hand(&self, color: Color) -> Hand {
        self.hands[color.index()]
    }

    /// 手駒の枚数（0枚の駒種は含まない、表示順）
    pub fn hand_counts(&self, color: Color) -> Vec<(PieceType, u8)> {
        self.hand(color).iter().collect()
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn last_move(&self) -> Option<LastMove> {
        self.last_move
    }

    /// 手数（SFEN の最終フィールド）
    #[inline]
    pub fn ply(&self) -> u32 {
        self.ply
    }

    /// 盤上の駒を列挙
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.piece_at(sq).map(|pc| (sq, pc)))
    }

    /// 千日手判定用のキー
    pub fn repetition_key(&self) -> RepetitionKey {
        RepetitionKey::new(&self.board, &self.hands, self.side_to_move)
    }

    // =========================================================================
    // 局面編集（テスト・SFEN 読み込み用）
    // =========================================================================

    pub fn put_piece(&mut self, sq: Square, piece: Piece) {
        self.board[sq.index()] = Some(piece);
    }

    pub fn remove_piece(&mut self, sq: Square) -> Option<Piece> {
        self.board[sq.index()].take()
    }

    pub fn set_hand_count(&mut self, color: Color, pt: PieceType, count: u8) {
        self.hands[color.index()].set(pt, count);
    }

    pub fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }

    // =========================================================================
    // 指し手の適用
    // =========================================================================

    /// 指し手文字列を検証して適用する
    ///
    /// 失敗した場合は局面を一切変更しない。`"resign"` は手番を入れ替えて
    /// 直前の指し手をクリアするだけで、盤面には触れない。
    pub fn apply_move(&mut self, usi: &str) -> Result<(), IllegalMove> {
        if usi == RESIGN {
            self.side_to_move = !self.side_to_move;
            self.last_move = None;
            self.ply += 1;
            return Ok(());
        }

        let mv = Move::from_usi(usi).ok_or_else(|| IllegalMove::Malformed(usi.to_string()))?;
        match mv {
            Move::Drop { piece_type, to } => self.apply_drop(piece_type, to)?,
            Move::Normal { from, to, promote } => self.apply_normal(from, to, promote)?,
        }

        self.last_move = Some(LastMove {
            from: mv.from(),
            to: mv.to(),
        });
        self.side_to_move = !self.side_to_move;
        self.ply += 1;
        Ok(())
    }

    /// 開始局面から指し手列を再生して局面を作り直す
    ///
    /// 途中で失敗した場合、その手の直前の局面で止まりエラーを返す。
    pub fn load_history<S: AsRef<str>>(&mut self, moves: &[S]) -> Result<(), IllegalMove> {
        self.reset();
        for mv in moves {
            self.apply_move(mv.as_ref())?;
        }
        Ok(())
    }

    fn apply_drop(&mut self, piece_type: PieceType, to: Square) -> Result<(), IllegalMove> {
        let us = self.side_to_move;

        if piece_type == PieceType::Pawn {
            if to.is_promotion_rank(us) {
                return Err(IllegalMove::PawnDropOnLastRank(to));
            }
            if self.has_unpromoted_pawn_on_file(us, to.file()) {
                return Err(IllegalMove::DoublePawn {
                    color: us,
                    file: to.file(),
                });
            }
        }
        if !self.hand(us).has(piece_type) {
            return Err(IllegalMove::NotInHand {
                color: us,
                piece_type,
            });
        }
        if self.piece_at(to).is_some() {
            return Err(IllegalMove::DropOnOccupied(to));
        }

        self.hands[us.index()].remove(piece_type);
        self.board[to.index()] = Some(Piece::new(us, piece_type));
        Ok(())
    }

    fn apply_normal(&mut self, from: Square, to: Square, promote: bool) -> Result<(), IllegalMove> {
        let us = self.side_to_move;

        let moving = self.piece_at(from).ok_or(IllegalMove::EmptyOrigin(from))?;
        if moving.color != us {
            return Err(IllegalMove::OpponentPiece(from));
        }
        let captured = self.piece_at(to);
        if captured.is_some_and(|pc| pc.color == us) {
            return Err(IllegalMove::OwnPieceAtDestination(to));
        }
        let base = moving.piece_type.unpromote();
        if promote && !base.can_promote() {
            return Err(IllegalMove::CannotPromote(base));
        }

        // ここから先は失敗しない
        if let Some(captured) = captured {
            self.hands[us.index()].add(captured.piece_type.unpromote());
        }
        let must_promote = base == PieceType::Pawn && to.is_promotion_rank(us);
        let piece_type = match base.promote() {
            Some(promoted) if promote || must_promote => promoted,
            _ => moving.piece_type,
        };
        self.board[from.index()] = None;
        self.board[to.index()] = Some(Piece::new(us, piece_type));
        Ok(())
    }

    fn has_unpromoted_pawn_on_file(&self, color: Color, file: u8) -> bool {
        let pawn = Piece::new(color, PieceType::Pawn);
        (0..Square::RANKS)
            .filter_map(|rank| Square::new(file, rank))
            .any(|sq| self.piece_at(sq) == Some(pawn))
    }
}
