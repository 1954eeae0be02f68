//! 升目（Square）

use super::Color;

/// 升目（0-24）
///
/// 配置: SQ_1a=0, SQ_1b=1, ..., SQ_1e=4, SQ_2a=5, ...
/// 筋は 1..=5、段は `a`..=`e`（0..=4）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Square(u8);

impl Square {
    /// 升目の数
    pub const NUM: usize = 25;

    /// 筋・段の数
    pub const FILES: u8 = 5;
    pub const RANKS: u8 = 5;

    /// 筋（1..=5）と段インデックス（0..=4）から生成
    #[inline]
    pub const fn new(file: u8, rank: u8) -> Option<Square> {
        if file >= 1 && file <= Self::FILES && rank < Self::RANKS {
            Some(Square((file - 1) * Self::RANKS + rank))
        } else {
            None
        }
    }

    /// 筋（1..=5）
    #[inline]
    pub const fn file(self) -> u8 {
        self.0 / Self::RANKS + 1
    }

    /// 段インデックス（0 = `a` .. 4 = `e`）
    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 % Self::RANKS
    }

    /// インデックスとして使用
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// 盤面グリッド（row = 段, col = 5 - 筋）から生成
    #[inline]
    pub const fn from_grid(row: usize, col: usize) -> Option<Square> {
        if row >= Self::RANKS as usize || col >= Self::FILES as usize {
            return None;
        }
        Square::new(Self::FILES - col as u8, row as u8)
    }

    /// 盤面グリッド座標 (row, col) に変換
    #[inline]
    pub const fn to_grid(self) -> (usize, usize) {
        (self.rank() as usize, (Self::FILES - self.file()) as usize)
    }

    /// 指定手番の成り段かどうか（先手は `a` 段、後手は `e` 段）
    #[inline]
    pub const fn is_promotion_rank(self, color: Color) -> bool {
        match color {
            Color::Black => self.rank() == 0,
            Color::White => self.rank() == Self::RANKS - 1,
        }
    }

    /// USI形式の文字列（"2b"等）に変換
    pub fn to_usi(self) -> String {
        format!("{}{}", self.file(), (b'a' + self.rank()) as char)
    }

    /// USI形式の文字列からSquareに変換（ちょうど2文字）
    pub fn from_usi(s: &str) -> Option<Square> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].checked_sub(b'0')?;
        let rank = bytes[1].checked_sub(b'a')?;
        Square::new(file, rank)
    }

    /// 全ての升を返すイテレータ
    pub fn all() -> impl Iterator<Item = Square> {
        (0..Self::NUM as u8).map(Square)
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.file(), (b'a' + self.rank()) as char)
    }
}
