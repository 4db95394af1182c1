//! Collaborator surfaces the core consumes but does not own: the session
//! descriptor, the seat-assignment directory, and the shared hole-card
//! cache for real-time display consumers.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::poker::constants::HOLE_CARD_COUNT;
use crate::poker::{Card, HandId, PlayerId};

/// What kind of battle a session is. Drives the hand-history header token.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum SessionKind {
    Tournament,
    Cash,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Tournament => "tournament",
            Self::Cash => "cash",
        };
        write!(f, "{repr}")
    }
}

/// Identity of the table session a hand belongs to. Owned by the host;
/// handed to both state machines at construction.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SessionDescriptor {
    /// Overlay-local session id, stable across reconnects to the same table.
    pub id: Uuid,
    /// Vendor battle/tournament number, display only.
    pub battle_id: i64,
    pub kind: SessionKind,
    /// Display name of the table or event.
    pub name: String,
}

impl SessionDescriptor {
    #[must_use]
    pub fn new(battle_id: i64, kind: SessionKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            battle_id,
            kind,
            name: name.into(),
        }
    }
}

/// Name and ladder rank for one player, as the seat-assignment collaborator
/// knows them.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatInfo {
    pub name: String,
    pub rank: u32,
}

/// Resolves player ids to display info. Implemented outside the core by the
/// component that watches seat-assignment traffic; lookups may miss when
/// that traffic lags, and consumers fall back to a generic label.
pub trait SeatDirectory {
    fn lookup(&self, player: PlayerId) -> Option<SeatInfo>;
}

/// Fallback label for a player id the directory cannot resolve.
#[must_use]
pub fn fallback_name(player: PlayerId) -> String {
    format!("Player{player}")
}

/// Bounded cache of revealed hole cards, keyed by hand and player.
///
/// Real-time display consumers read this from their own threads, so it is
/// shared by [`HoleCardCacheHandle`] rather than owned by either state
/// machine. Eviction is oldest-first at a fixed capacity; a re-inserted key
/// refreshes its cards without growing the cache.
#[derive(Debug)]
pub struct HoleCardCache {
    capacity: usize,
    order: VecDeque<(HandId, PlayerId)>,
    cards: HashMap<(HandId, PlayerId), [Card; HOLE_CARD_COUNT]>,
}

/// Shared handle display consumers and the formatter hold on the cache.
pub type HoleCardCacheHandle = Arc<Mutex<HoleCardCache>>;

impl HoleCardCache {
    /// Create a cache holding at most `capacity` entries. A zero capacity
    /// is allowed and makes every insert a no-op.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            cards: HashMap::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn into_handle(self) -> HoleCardCacheHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn insert(&mut self, hand: HandId, player: PlayerId, cards: [Card; HOLE_CARD_COUNT]) {
        if self.capacity == 0 {
            return;
        }
        let key = (hand, player);
        if self.cards.insert(key, cards).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.cards.remove(&oldest);
            }
        }
    }

    #[must_use]
    pub fn get(&self, hand: HandId, player: PlayerId) -> Option<[Card; HOLE_CARD_COUNT]> {
        self.cards.get(&(hand, player)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === SessionDescriptor Tests ===

    #[test]
    fn test_session_descriptor_ids_are_unique() {
        let a = SessionDescriptor::new(9001, SessionKind::Tournament, "Main Event");
        let b = SessionDescriptor::new(9001, SessionKind::Tournament, "Main Event");
        assert_ne!(a.id, b.id);
        assert_eq!(a.battle_id, b.battle_id);
    }

    #[test]
    fn test_fallback_name() {
        assert_eq!(fallback_name(42), "Player42");
    }

    // === HoleCardCache Tests ===

    #[test]
    fn test_cache_insert_and_get() {
        let mut cache = HoleCardCache::with_capacity(4);
        cache.insert(100, 1, [Card(48), Card(49)]);
        assert_eq!(cache.get(100, 1), Some([Card(48), Card(49)]));
        assert_eq!(cache.get(100, 2), None);
    }

    #[test]
    fn test_cache_evicts_oldest_first() {
        let mut cache = HoleCardCache::with_capacity(2);
        cache.insert(1, 1, [Card(0), Card(1)]);
        cache.insert(1, 2, [Card(2), Card(3)]);
        cache.insert(2, 1, [Card(4), Card(5)]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1, 1), None);
        assert!(cache.get(1, 2).is_some());
        assert!(cache.get(2, 1).is_some());
    }

    #[test]
    fn test_cache_reinsert_does_not_grow() {
        let mut cache = HoleCardCache::with_capacity(2);
        cache.insert(1, 1, [Card(0), Card(1)]);
        cache.insert(1, 1, [Card(8), Card(9)]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1, 1), Some([Card(8), Card(9)]));
    }

    #[test]
    fn test_zero_capacity_cache_stays_empty() {
        let mut cache = HoleCardCache::with_capacity(0);
        cache.insert(1, 1, [Card(0), Card(1)]);
        assert!(cache.is_empty());
    }
}
