//! SFEN の読み書き（5x5 盤）

use super::PositionState;
use crate::error::SfenError;
use crate::types::{Color, Piece, PieceType, Square};

impl PositionState {
    /// SFEN 文字列（`<盤面> <手番> <手駒> [手数]`）から局面を設定する
    ///
    /// 解析に失敗した場合は局面を変更しない。
    pub fn set_sfen(&mut self, sfen: &str) -> Result<(), SfenError> {
        let mut fields = sfen.split_whitespace();
        let board = fields.next().ok_or(SfenError::MissingField("board"))?;
        let turn = fields.next().ok_or(SfenError::MissingField("side to move"))?;
        let hands = fields.next().ok_or(SfenError::MissingField("hands"))?;
        let ply = fields.next();

        let mut pos = PositionState::empty();
        parse_board(&mut pos, board)?;
        pos.side_to_move =
            Color::from_sfen(turn).ok_or_else(|| SfenError::InvalidTurn(turn.to_string()))?;
        parse_hands(&mut pos, hands)?;
        if let Some(ply) = ply {
            pos.ply = ply
                .parse::<u32>()
                .map_err(|_| SfenError::InvalidPly(ply.to_string()))?;
        }

        *self = pos;
        Ok(())
    }

    /// SFEN 文字列に変換
    pub fn to_sfen(&self) -> String {
        let mut rows = Vec::with_capacity(Square::RANKS as usize);
        for row in 0..Square::RANKS as usize {
            let mut line = String::new();
            let mut empty = 0;
            for col in 0..Square::FILES as usize {
                let piece = Square::from_grid(row, col).and_then(|sq| self.piece_at(sq));
                match piece {
                    Some(pc) => {
                        if empty > 0 {
                            line.push_str(&empty.to_string());
                            empty = 0;
                        }
                        line.push_str(&pc.to_sfen());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                line.push_str(&empty.to_string());
            }
            rows.push(line);
        }

        let mut hands = String::new();
        for color in [Color::Black, Color::White] {
            for (pt, count) in self.hand(color).iter() {
                if count > 1 {
                    hands.push_str(&count.to_string());
                }
                hands.push_str(&Piece::new(color, pt).to_sfen());
            }
        }
        if hands.is_empty() {
            hands.push('-');
        }

        format!(
            "{} {} {} {}",
            rows.join("/"),
            self.side_to_move.to_sfen_char(),
            hands,
            self.ply
        )
    }
}

fn parse_board(pos: &mut PositionState, board: &str) -> Result<(), SfenError> {
    let rows: Vec<&str> = board.split('/').collect();
    if rows.len() != Square::RANKS as usize {
        return Err(SfenError::InvalidBoard(format!(
            "expected {} ranks, found {}",
            Square::RANKS,
            rows.len()
        )));
    }

    for (row, line) in rows.iter().enumerate() {
        let mut col = 0usize;
        let mut promoted = false;
        for c in line.chars() {
            if c == '+' {
                promoted = true;
                continue;
            }
            if let Some(n) = c.to_digit(10) {
                if promoted {
                    return Err(SfenError::InvalidPiece('+'));
                }
                col += n as usize;
                continue;
            }
            let mut piece = Piece::from_sfen_char(c).ok_or(SfenError::InvalidPiece(c))?;
            if promoted {
                piece.piece_type = piece.piece_type.promote().ok_or(SfenError::InvalidPiece(c))?;
                promoted = false;
            }
            let sq = Square::from_grid(row, col).ok_or_else(|| {
                SfenError::InvalidBoard(format!("rank {} overflows: {line}", row + 1))
            })?;
            pos.put_piece(sq, piece);
            col += 1;
        }
        if promoted || col != Square::FILES as usize {
            return Err(SfenError::InvalidBoard(format!(
                "rank {} must span {} files: {line}",
                row + 1,
                Square::FILES
            )));
        }
    }
    Ok(())
}

fn parse_hands(pos: &mut PositionState, hands: &str) -> Result<(), SfenError> {
    if hands == "-" {
        return Ok(());
    }
    let mut count: u32 = 0;
    for c in hands.chars() {
        if let Some(d) = c.to_digit(10) {
            count = count * 10 + d;
            if count > u8::MAX as u32 {
                return Err(SfenError::InvalidHand(hands.to_string()));
            }
            continue;
        }
        let piece = Piece::from_sfen_char(c).ok_or(SfenError::InvalidPiece(c))?;
        if piece.piece_type == PieceType::King {
            return Err(SfenError::InvalidHand(hands.to_string()));
        }
        let n = if count == 0 { 1 } else { count as u8 };
        let current = pos.hand(piece.color).count(piece.piece_type);
        pos.set_hand_count(piece.color, piece.piece_type, current.saturating_add(n));
        count = 0;
    }
    if count != 0 {
        return Err(SfenError::InvalidHand(hands.to_string()));
    }
    Ok(())
}
