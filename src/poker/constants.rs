//! Table and deck bounds shared across the crate.

/// Smallest table the vendor's client ever deals.
pub const MIN_SEATS: usize = 2;

/// Largest table the vendor's client ever deals.
pub const MAX_SEATS: usize = 10;

/// Community cards on a full board.
pub const BOARD_SIZE: usize = 5;

/// Hole cards dealt to each player.
pub const HOLE_CARD_COUNT: usize = 2;

/// Community cards revealed on the flop.
pub const FLOP_SIZE: usize = 3;

/// Number of distinct card ids (0..52).
pub const DECK_SIZE: u8 = 52;
