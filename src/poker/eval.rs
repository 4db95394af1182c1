//! Hand-strength evaluation for 5 to 7 card sets.
//!
//! The evaluator is pure and deterministic: per-rank counts, per-suit counts,
//! and per-suit rank bitmasks are built in one pass, then categories are
//! tested from strongest to weakest. Straights fall out of a 5-bit sliding
//! window over the 13-bit rank-presence mask, with the wheel (A-2-3-4-5)
//! handled as a 5-high special case.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entities::Card;

/// The nine standard hand categories. A royal flush is the top straight
/// flush, not a category of its own.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum HandCategory {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl HandCategory {
    /// Number of rank nibbles packed into this category's tiebreak value.
    fn tiebreak_width(self) -> u32 {
        match self {
            Self::HighCard | Self::Flush => 5,
            Self::OnePair => 4,
            Self::TwoPair | Self::ThreeOfAKind => 3,
            Self::FullHouse | Self::FourOfAKind => 2,
            Self::Straight | Self::StraightFlush => 1,
        }
    }
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "a pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "a straight",
            Self::Flush => "a flush",
            Self::FullHouse => "a full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "a straight flush",
        };
        write!(f, "{repr}")
    }
}

/// A fully evaluated hand: category plus a tiebreak value that orders hands
/// within the same category. Tiebreaks are packed rank nibbles, most
/// significant first, and are only meaningful between equal categories -
/// the derived ordering stays correct because category dominates.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HandRank {
    pub category: HandCategory,
    pub tiebreak: u32,
}

impl HandRank {
    fn new(category: HandCategory, ranks: &[u8]) -> Self {
        debug_assert_eq!(ranks.len() as u32, category.tiebreak_width());
        let tiebreak = ranks.iter().fold(0u32, |acc, &r| (acc << 4) | u32::from(r));
        Self { category, tiebreak }
    }

    /// The i-th packed rank nibble, most significant first.
    fn rank_at(self, i: u32) -> u8 {
        let width = self.category.tiebreak_width();
        ((self.tiebreak >> (4 * (width - 1 - i))) & 0xF) as u8
    }

    /// Showdown phrasing in the style third-party hand-history importers
    /// expect, e.g. "a full house, Aces full of Kings".
    #[must_use]
    pub fn phrase(self) -> String {
        match self.category {
            HandCategory::HighCard => format!("high card {}", rank_name(self.rank_at(0))),
            HandCategory::OnePair => format!("a pair of {}", rank_plural(self.rank_at(0))),
            HandCategory::TwoPair => format!(
                "two pair, {} and {}",
                rank_plural(self.rank_at(0)),
                rank_plural(self.rank_at(1))
            ),
            HandCategory::ThreeOfAKind => {
                format!("three of a kind, {}", rank_plural(self.rank_at(0)))
            }
            HandCategory::Straight => format!("a straight, {}", straight_span(self.rank_at(0))),
            HandCategory::Flush => format!("a flush, {} high", rank_name(self.rank_at(0))),
            HandCategory::FullHouse => format!(
                "a full house, {} full of {}",
                rank_plural(self.rank_at(0)),
                rank_plural(self.rank_at(1))
            ),
            HandCategory::FourOfAKind => {
                format!("four of a kind, {}", rank_plural(self.rank_at(0)))
            }
            HandCategory::StraightFlush => {
                if self.rank_at(0) == ACE {
                    "a Royal Flush".to_string()
                } else {
                    format!("a straight flush, {}", straight_span(self.rank_at(0)))
                }
            }
        }
    }
}

/// Rank index of an ace (0 is a deuce).
const ACE: u8 = 12;

/// Rank index of a five, the high card of a wheel straight.
const FIVE: u8 = 3;

/// Rank-presence mask of a wheel: A-2-3-4-5.
const WHEEL_MASK: u16 = 0b1_0000_0000_1111;

/// Evaluate a set of 5 to 7 distinct cards into its best 5-card hand.
///
/// The result is order-invariant in its input. Lengths outside 5..=7 are a
/// programming error, not a data error, and panic rather than truncate.
#[must_use]
pub fn evaluate(cards: &[Card]) -> HandRank {
    assert!(
        (5..=7).contains(&cards.len()),
        "evaluate expects 5 to 7 cards, got {}",
        cards.len()
    );

    let mut rank_counts = [0u8; 13];
    let mut suit_counts = [0u8; 4];
    let mut suit_masks = [0u16; 4];
    let mut rank_mask: u16 = 0;
    for card in cards {
        let r = card.rank_index() as usize;
        let s = card.suit_index() as usize;
        rank_counts[r] += 1;
        suit_counts[s] += 1;
        suit_masks[s] |= 1 << r;
        rank_mask |= 1 << r;
    }

    let flush_suit = suit_counts.iter().position(|&n| n >= 5);

    if let Some(s) = flush_suit
        && let Some(high) = straight_high(suit_masks[s])
    {
        return HandRank::new(HandCategory::StraightFlush, &[high]);
    }

    if let Some(quad) = highest_with_count(&rank_counts, 4) {
        let kicker = top_ranks_excluding(rank_mask, &[quad], 1)[0];
        return HandRank::new(HandCategory::FourOfAKind, &[quad, kicker]);
    }

    let trips = highest_with_count(&rank_counts, 3);
    if let Some(t) = trips {
        // A second set of trips doubles as the pair of a full house.
        let pair = (0..13u8)
            .rev()
            .find(|&r| r != t && rank_counts[r as usize] >= 2);
        if let Some(p) = pair {
            return HandRank::new(HandCategory::FullHouse, &[t, p]);
        }
    }

    if let Some(s) = flush_suit {
        let ranks = top_ranks(suit_masks[s], 5);
        return HandRank::new(HandCategory::Flush, &ranks);
    }

    if let Some(high) = straight_high(rank_mask) {
        return HandRank::new(HandCategory::Straight, &[high]);
    }

    if let Some(t) = trips {
        let kickers = top_ranks_excluding(rank_mask, &[t], 2);
        return HandRank::new(HandCategory::ThreeOfAKind, &[t, kickers[0], kickers[1]]);
    }

    let mut pairs = (0..13u8).rev().filter(|&r| rank_counts[r as usize] >= 2);
    if let Some(hi) = pairs.next() {
        if let Some(lo) = pairs.next() {
            // With 7 cards a third pair can still supply the best kicker.
            let kicker = top_ranks_excluding(rank_mask, &[hi, lo], 1)[0];
            return HandRank::new(HandCategory::TwoPair, &[hi, lo, kicker]);
        }
        let kickers = top_ranks_excluding(rank_mask, &[hi], 3);
        return HandRank::new(
            HandCategory::OnePair,
            &[hi, kickers[0], kickers[1], kickers[2]],
        );
    }

    HandRank::new(HandCategory::HighCard, &top_ranks(rank_mask, 5))
}

/// High rank index of the best straight in a rank-presence mask, if any.
fn straight_high(mask: u16) -> Option<u8> {
    for high in (4..=12u8).rev() {
        let window = 0b11111 << (high - 4);
        if mask & window == window {
            return Some(high);
        }
    }
    if mask & WHEEL_MASK == WHEEL_MASK {
        return Some(FIVE);
    }
    None
}

/// Highest rank appearing exactly `n` times, or with at least `n` for trips
/// (quads are tested first, so a looser match is safe there).
fn highest_with_count(counts: &[u8; 13], n: u8) -> Option<u8> {
    (0..13u8).rev().find(|&r| counts[r as usize] >= n)
}

/// Top `n` set ranks of a mask, descending.
fn top_ranks(mask: u16, n: usize) -> Vec<u8> {
    (0..13u8)
        .rev()
        .filter(|&r| mask & (1 << r) != 0)
        .take(n)
        .collect()
}

/// Top `n` set ranks of a mask, descending, skipping `excluded`.
fn top_ranks_excluding(mask: u16, excluded: &[u8], n: usize) -> Vec<u8> {
    (0..13u8)
        .rev()
        .filter(|&r| mask & (1 << r) != 0 && !excluded.contains(&r))
        .take(n)
        .collect()
}

fn rank_name(idx: u8) -> &'static str {
    const NAMES: [&str; 13] = [
        "Deuce", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Jack", "Queen",
        "King", "Ace",
    ];
    NAMES[idx as usize]
}

fn rank_plural(idx: u8) -> &'static str {
    const NAMES: [&str; 13] = [
        "Deuces", "Threes", "Fours", "Fives", "Sixes", "Sevens", "Eights", "Nines", "Tens",
        "Jacks", "Queens", "Kings", "Aces",
    ];
    NAMES[idx as usize]
}

/// "Ten to Ace" span text for straights; the wheel runs Ace to Five.
fn straight_span(high: u8) -> String {
    if high == FIVE {
        "Ace to Five".to_string()
    } else {
        format!("{} to {}", rank_name(high - 4), rank_name(high))
    }
}
