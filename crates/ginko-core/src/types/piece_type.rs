//! 駒種（PieceType）

/// 駒種（先後の区別なし）
///
/// 5五将棋には香・桂がない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PieceType {
    // 生駒
    Pawn = 0,
    Silver = 1,
    Gold = 2,
    Bishop = 3,
    Rook = 4,
    King = 5,
    // 成駒
    ProPawn = 6,
    ProSilver = 7,
    Horse = 8,  // 成角
    Dragon = 9, // 成飛
}

impl PieceType {
    /// 生駒の数（持ち駒の添字範囲。玉を取った場合も数えられるよう King を含む）
    pub const BASE_NUM: usize = 6;

    /// 持ち駒の表示・SFEN 出力順（飛角金銀歩、最後に玉）
    pub const HAND_ORDER: [PieceType; 6] = [
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Gold,
        PieceType::Silver,
        PieceType::Pawn,
        PieceType::King,
    ];

    /// 成れるかどうか
    #[inline]
    pub const fn can_promote(self) -> bool {
        matches!(
            self,
            PieceType::Pawn | PieceType::Silver | PieceType::Bishop | PieceType::Rook
        )
    }

    /// 成り駒を返す（成れない場合はNone）
    #[inline]
    pub const fn promote(self) -> Option<PieceType> {
        match self {
            PieceType::Pawn => Some(PieceType::ProPawn),
            PieceType::Silver => Some(PieceType::ProSilver),
            PieceType::Bishop => Some(PieceType::Horse),
            PieceType::Rook => Some(PieceType::Dragon),
            _ => None,
        }
    }

    /// 生駒を返す（既に生駒の場合はそのまま）
    #[inline]
    pub const fn unpromote(self) -> PieceType {
        match self {
            PieceType::ProPawn => PieceType::Pawn,
            PieceType::ProSilver => PieceType::Silver,
            PieceType::Horse => PieceType::Bishop,
            PieceType::Dragon => PieceType::Rook,
            _ => self,
        }
    }

    /// 成駒かどうか
    #[inline]
    pub const fn is_promoted(self) -> bool {
        self as u8 >= PieceType::ProPawn as u8
    }

    /// 持ち駒配列の添字（生駒に戻してから引く）
    #[inline]
    pub const fn hand_index(self) -> usize {
        self.unpromote() as usize
    }

    /// USI の駒文字（生駒のみ、大文字）
    #[inline]
    pub const fn base_char(self) -> char {
        match self.unpromote() {
            PieceType::Pawn => 'P',
            PieceType::Silver => 'S',
            PieceType::Gold => 'G',
            PieceType::Bishop => 'B',
            PieceType::Rook => 'R',
            _ => 'K',
        }
    }

    /// USI の駒文字（大文字）から生駒を得る
    pub const fn from_base_char(c: char) -> Option<PieceType> {
        match c {
            'P' => Some(PieceType::Pawn),
            'S' => Some(PieceType::Silver),
            'G' => Some(PieceType::Gold),
            'B' => Some(PieceType::Bishop),
            'R' => Some(PieceType::Rook),
            'K' => Some(PieceType::King),
            _ => None,
        }
    }
}

impl std::fmt::Display for PieceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_promoted() {
            write!(f, "+{}", self.base_char())
        } else {
            write!(f, "{}", self.base_char())
        }
    }
}
