use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants;

/// Type alias for chip amounts. The vendor feed reports chips as signed
/// integers, and a few validity checks depend on seeing negatives rather
/// than silently wrapping them.
pub type Chips = i64;

/// Type alias for vendor-assigned player ids. `-1` marks an empty seat.
pub type PlayerId = i64;

/// Type alias for vendor-assigned hand ids. Negative values are used
/// locally for provisional ids before the terminal event reveals the
/// real one.
pub type HandId = i64;

/// Type alias for seat positions at the table.
pub type SeatIndex = usize;

/// Seat position relative to the blinds: BB=-2, SB=-1, BTN=0, then
/// ascending away from the button (CO=1, HJ=2, ...).
pub type Position = i8;

/// Marker for an empty seat in the dealt seat array.
pub const EMPTY_SEAT: PlayerId = -1;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Spade,
    Heart,
    Diamond,
    Club,
}

impl Suit {
    #[must_use]
    pub fn from_index(idx: u8) -> Self {
        match idx % 4 {
            0 => Self::Spade,
            1 => Self::Heart,
            2 => Self::Diamond,
            _ => Self::Club,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spade => "s",
            Self::Heart => "h",
            Self::Diamond => "d",
            Self::Club => "c",
        };
        write!(f, "{repr}")
    }
}

/// A card is a single integer id in `0..52`: rank = id / 4 (deuce through
/// ace), suit = id % 4. This is the encoding the vendor feed uses, kept
/// as-is so records round-trip without translation.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub u8);

impl Card {
    /// Rank index `0..13`, where 0 is a deuce and 12 an ace.
    #[must_use]
    pub fn rank_index(self) -> u8 {
        self.0 / 4
    }

    /// Suit index `0..4` (s, h, d, c).
    #[must_use]
    pub fn suit_index(self) -> u8 {
        self.0 % 4
    }

    #[must_use]
    pub fn suit(self) -> Suit {
        Suit::from_index(self.suit_index())
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0 < constants::DECK_SIZE
    }

    /// Single-character rank token (2-9, T, J, Q, K, A).
    #[must_use]
    pub fn rank_char(self) -> char {
        b"23456789TJQKA"[self.rank_index() as usize] as char
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank_char(), self.suit())
    }
}

/// A betting street, plus the synthetic terminal showdown phase used for
/// record and log purposes only (it never arrives on the wire).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Street {
    /// Map a wire street code to a street. Showdown has no wire code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Preflop),
            1 => Some(Self::Flop),
            2 => Some(Self::Turn),
            3 => Some(Self::River),
            _ => None,
        }
    }

    /// Cumulative community cards once this street is fully dealt.
    #[must_use]
    pub fn board_len(self) -> usize {
        match self {
            Self::Preflop => 0,
            Self::Flop => constants::FLOP_SIZE,
            Self::Turn => 4,
            Self::River | Self::Showdown => constants::BOARD_SIZE,
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Preflop => "Preflop",
            Self::Flop => "Flop",
            Self::Turn => "Turn",
            Self::River => "River",
            Self::Showdown => "Showdown",
        };
        write!(f, "{repr}")
    }
}

/// Player action categories as the vendor feed codes them.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ActionKind {
    Check,
    Bet,
    Fold,
    Call,
    Raise,
    AllIn,
}

impl ActionKind {
    /// Map a wire action code to a kind.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Check),
            1 => Some(Self::Bet),
            2 => Some(Self::Fold),
            3 => Some(Self::Call),
            4 => Some(Self::Raise),
            5 => Some(Self::AllIn),
            _ => None,
        }
    }

    /// Whether the action increases the amount others must match.
    #[must_use]
    pub fn is_aggressive(self) -> bool {
        matches!(self, Self::Bet | Self::Raise | Self::AllIn)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Check => "check",
            Self::Bet => "bet",
            Self::Fold => "fold",
            Self::Call => "call",
            Self::Raise => "raise",
            Self::AllIn => "all-in",
        };
        write!(f, "{repr}")
    }
}
