//! 手駒（Hand）

use super::PieceType;

/// 手駒（生駒ごとの枚数）
///
/// 添字は [`PieceType::hand_index`]。玉を取られた局面も表現できるよう King も数える。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hand([u8; PieceType::BASE_NUM]);

impl Hand {
    /// 空の手駒
    pub const EMPTY: Hand = Hand([0; PieceType::BASE_NUM]);

    /// 駒種の枚数を取得（成駒は生駒として数える）
    #[inline]
    pub const fn count(self, pt: PieceType) -> u8 {
        self.0[pt.hand_index()]
    }

    /// 駒種を持っているか
    #[inline]
    pub const fn has(self, pt: PieceType) -> bool {
        self.count(pt) > 0
    }

    /// 1枚加える
    #[inline]
    pub fn add(&mut self, pt: PieceType) {
        let slot = &mut self.0[pt.hand_index()];
        *slot = slot.saturating_add(1);
    }

    /// 1枚減らす（0枚なら false を返して何もしない）
    #[inline]
    pub fn remove(&mut self, pt: PieceType) -> bool {
        let slot = &mut self.0[pt.hand_index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    /// 枚数を直接設定
    #[inline]
    pub fn set(&mut self, pt: PieceType, count: u8) {
        self.0[pt.hand_index()] = count;
    }

    /// 手駒が空か
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0.iter().all(|&n| n == 0)
    }

    /// 1枚以上ある駒種を表示順に列挙
    pub fn iter(self) -> impl Iterator<Item = (PieceType, u8)> {
        PieceType::HAND_ORDER
            .into_iter()
            .map(move |pt| (pt, self.count(pt)))
            .filter(|&(_, n)| n > 0)
    }
}
