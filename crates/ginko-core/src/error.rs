//! ルールエンジンのエラー型

use crate::types::{Color, PieceType, Square};

/// 指し手が受理できない理由
///
/// いずれの場合も局面は変更されない。
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IllegalMove {
    #[error("malformed move string: {0:?}")]
    Malformed(String),

    #[error("drop target {0} is occupied")]
    DropOnOccupied(Square),

    #[error("pawn cannot be dropped on the last rank ({0})")]
    PawnDropOnLastRank(Square),

    #[error("{color} already has an unpromoted pawn on file {file}")]
    DoublePawn { color: Color, file: u8 },

    #[error("{color} has no {piece_type} in hand")]
    NotInHand { color: Color, piece_type: PieceType },

    #[error("no piece on {0}")]
    EmptyOrigin(Square),

    #[error("piece on {0} belongs to the opponent")]
    OpponentPiece(Square),

    #[error("destination {0} is occupied by the mover's own piece")]
    OwnPieceAtDestination(Square),

    #[error("{0} cannot promote")]
    CannotPromote(PieceType),
}

/// SFEN 文字列の解析エラー
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SfenError {
    #[error("sfen is missing the {0} field")]
    MissingField(&'static str),

    #[error("invalid board in sfen: {0}")]
    InvalidBoard(String),

    #[error("invalid piece character {0:?} in sfen")]
    InvalidPiece(char),

    #[error("invalid side to move {0:?} in sfen")]
    InvalidTurn(String),

    #[error("invalid hand in sfen: {0}")]
    InvalidHand(String),

    #[error("invalid ply in sfen: {0:?}")]
    InvalidPly(String),
}
