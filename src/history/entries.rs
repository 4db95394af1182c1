//! Structured hand-history log entries.
//!
//! Every rendered line is paired with typed fields (actor, kind, amount,
//! street) so the formatter's backward scans - raise deltas, uncalled-bet
//! reconstruction, summary outcomes - read structured data and never
//! re-parse their own rendered text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::poker::{Chips, HandId, PlayerId, SeatIndex, Street};

/// What section of the hand history a line belongs to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum EntryCategory {
    Header,
    Seat,
    Action,
    Street,
    Showdown,
    Summary,
    /// Reserved for host-injected notices; the formatter itself never
    /// emits these.
    System,
}

/// Typed kind for lines that represent chips going in or a player response.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum EntryKind {
    Ante,
    SmallBlind,
    BigBlind,
    Check,
    Bet,
    Fold,
    Call,
    Raise,
    AllIn,
}

impl EntryKind {
    /// Whether this entry's amount is the actor's cumulative wager total
    /// for the street. Antes go straight to the pot and never count.
    #[must_use]
    pub fn carries_wager_total(self) -> bool {
        matches!(
            self,
            Self::SmallBlind | Self::BigBlind | Self::Bet | Self::Call | Self::Raise | Self::AllIn
        )
    }

    /// Whether this entry raises the amount others must match. The big
    /// blind post is the standing preflop aggression, so it counts.
    #[must_use]
    pub fn is_aggressive(self) -> bool {
        matches!(self, Self::BigBlind | Self::Bet | Self::Raise | Self::AllIn)
    }
}

/// One immutable rendered line of hand history.
///
/// Entries carry a provisional (negative) hand id until the terminal event
/// reveals the real one; at that point the formatter rewrites every entry
/// of the hand in place and replaces them in the sink in one call.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LogEntry {
    pub category: EntryCategory,
    pub hand_id: HandId,
    pub at: DateTime<Utc>,
    pub text: String,
    pub street: Option<Street>,
    pub seat: Option<SeatIndex>,
    pub player: Option<PlayerId>,
    pub kind: Option<EntryKind>,
    pub amount: Option<Chips>,
}

impl LogEntry {
    /// A plain line with no actor or amount attached.
    #[must_use]
    pub fn line(
        category: EntryCategory,
        hand_id: HandId,
        at: DateTime<Utc>,
        text: String,
    ) -> Self {
        Self {
            category,
            hand_id,
            at,
            text,
            street: None,
            seat: None,
            player: None,
            kind: None,
            amount: None,
        }
    }

    /// Whether the entry still carries a provisional id.
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.hand_id < 0
    }
}

/// The text-log sink the formatter drives. Rendering and storage of the
/// visible log are the sink's concern.
pub trait HistorySink {
    /// Append freshly emitted entries for the in-progress hand.
    fn append(&mut self, entries: &[LogEntry]) -> anyhow::Result<()>;

    /// Replace every entry previously appended under `hand_id` (the
    /// provisional id) with the finalized set. Called exactly once per
    /// hand, at close.
    fn replace_by_hand_id(&mut self, hand_id: HandId, entries: &[LogEntry]) -> anyhow::Result<()>;

    /// Drop everything; the host is switching sessions.
    fn clear(&mut self) -> anyhow::Result<()>;

    /// Drop all entries still carrying a provisional id; the hand they
    /// belong to will never complete.
    fn remove_incomplete(&mut self) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wager_total_kinds() {
        assert!(EntryKind::SmallBlind.carries_wager_total());
        assert!(EntryKind::BigBlind.carries_wager_total());
        assert!(EntryKind::Bet.carries_wager_total());
        assert!(EntryKind::Call.carries_wager_total());
        assert!(EntryKind::Raise.carries_wager_total());
        assert!(EntryKind::AllIn.carries_wager_total());
        assert!(!EntryKind::Ante.carries_wager_total());
        assert!(!EntryKind::Check.carries_wager_total());
        assert!(!EntryKind::Fold.carries_wager_total());
    }

    #[test]
    fn test_aggressive_kinds_include_big_blind() {
        assert!(EntryKind::BigBlind.is_aggressive());
        assert!(EntryKind::Bet.is_aggressive());
        assert!(EntryKind::Raise.is_aggressive());
        assert!(EntryKind::AllIn.is_aggressive());
        assert!(!EntryKind::SmallBlind.is_aggressive());
        assert!(!EntryKind::Call.is_aggressive());
    }

    #[test]
    fn test_provisional_ids_are_negative() {
        let entry = LogEntry::line(
            EntryCategory::Header,
            -4,
            Utc::now(),
            "header".to_string(),
        );
        assert!(entry.is_provisional());
    }
}
