//! Tagged event records as the transport layer hands them over.
//!
//! The wire format itself is decoded upstream; what arrives here is an
//! envelope with a numeric tag, a shape version, a locally-assigned receipt
//! timestamp, and a still-untyped body. The schema guard turns envelopes
//! into [`FeedEvent`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::poker::{Chips, HandId, PlayerId};

/// Numeric event tags the core understands. Anything else is carried as
/// [`FeedEvent::Unknown`] and skipped by subscribers.
pub mod tags {
    /// A new hand was dealt: seats, blinds, hero hole cards.
    pub const HAND_DEALT: u16 = 0x0310;
    /// Community cards for a street were revealed.
    pub const STREET_DEALT: u16 = 0x0312;
    /// A player acted.
    pub const ACTION_TAKEN: u16 = 0x0313;
    /// The hand resolved: real hand id, final board, results.
    pub const HAND_CLOSED: u16 = 0x0315;
}

/// Per-seat status codes delivered with each street.
pub mod status {
    /// No player in the seat.
    pub const EMPTY: u8 = 0;
    /// Player folded earlier in the hand.
    pub const FOLDED: u8 = 1;
    /// Player is still contesting the pot.
    pub const LIVE: u8 = 2;
    /// Player is all-in but still contesting the pot.
    pub const ALL_IN: u8 = 3;

    #[must_use]
    pub fn is_live(code: u8) -> bool {
        code == LIVE || code == ALL_IN
    }
}

/// Highest payload shape version this build knows how to validate. Older
/// shapes only ever gained fields, so anything at or below this is accepted;
/// newer versions are rejected rather than half-read.
pub const SUPPORTED_VERSION: u16 = 2;

/// One decoded-but-unvalidated record from the vendor feed.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RawEvent {
    /// Numeric event type assigned by the vendor.
    pub tag: u16,
    /// Shape version of the body for this tag.
    pub version: u16,
    /// Receipt timestamp assigned locally by the transport.
    pub received_at: DateTime<Utc>,
    /// Untyped body; the schema guard extracts the tag's shape from it.
    pub body: Value,
}

/// Body of a *hand-dealt* event. Seat data arrives as parallel arrays
/// indexed by seat number, the vendor's native layout.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HandDealtBody {
    /// Player id per seat, `-1` for an empty seat.
    pub seat_players: Vec<PlayerId>,
    /// Remaining stack per seat, after blinds and antes went in.
    pub seat_stacks: Vec<Chips>,
    /// Chips each seat already has in front of it this street.
    pub seat_wagers: Vec<Chips>,
    pub button_seat: u8,
    pub small_blind_seat: u8,
    pub big_blind_seat: u8,
    pub small_blind: Chips,
    pub big_blind: Chips,
    #[serde(default)]
    pub ante: Chips,
    /// The seat whose hole cards the client can see, when any.
    pub hero_seat: Option<u8>,
    /// Hero hole cards as raw card ids; empty when spectating.
    #[serde(default)]
    pub hero_cards: Vec<u8>,
}

/// Body of a *street-dealt* event.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StreetDealtBody {
    /// Wire street code, 0..=3.
    pub street: u8,
    /// The incremental slice of community cards for this street, not the
    /// cumulative board.
    pub cards: Vec<u8>,
    /// Status code per seat, aligned with the dealt seat array.
    pub seat_status: Vec<u8>,
}

/// Body of an *action-taken* event.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ActionTakenBody {
    pub seat: u8,
    /// Wire action kind code, 0..=5.
    pub kind: u8,
    /// The actor's cumulative wager total for the current street after
    /// this action.
    pub amount: Chips,
    /// Main pot snapshot after the action.
    pub pot: Chips,
    #[serde(default)]
    pub side_pots: Vec<Chips>,
    /// Street code as reported by the vendor. Observed to lag at street
    /// boundaries; consumers derive the street from the last street-dealt
    /// event instead and never read this field.
    pub street: u8,
}

/// One surviving entrant in a *hand-closed* event.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HandResultBody {
    pub seat: u8,
    pub player_id: PlayerId,
    /// Amount collected from the pot; zero for showdown losers.
    pub won: Chips,
    /// Revealed hole cards; empty when the player mucked.
    #[serde(default)]
    pub hole_cards: Vec<u8>,
}

/// Body of a *hand-closed* event.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HandClosedBody {
    /// The real, vendor-assigned hand id.
    pub hand_id: HandId,
    /// Final community board, cumulative.
    #[serde(default)]
    pub board: Vec<u8>,
    /// Main pot.
    pub pot: Chips,
    #[serde(default)]
    pub side_pots: Vec<Chips>,
    /// Entrants that reached the end of the hand.
    pub results: Vec<HandResultBody>,
}

impl HandClosedBody {
    /// Main pot plus all side pots.
    #[must_use]
    pub fn total_pot(&self) -> Chips {
        self.pot + self.side_pots.iter().sum::<Chips>()
    }
}

/// A validated, typed feed event. Every variant carries the envelope's
/// receipt timestamp; unknown tags survive as a skippable catch-all rather
/// than failing the stream.
#[derive(Clone, Debug)]
pub enum FeedEvent {
    HandDealt {
        at: DateTime<Utc>,
        body: HandDealtBody,
    },
    StreetDealt {
        at: DateTime<Utc>,
        body: StreetDealtBody,
    },
    ActionTaken {
        at: DateTime<Utc>,
        body: ActionTakenBody,
    },
    HandClosed {
        at: DateTime<Utc>,
        body: HandClosedBody,
    },
    Unknown {
        tag: u16,
    },
}
