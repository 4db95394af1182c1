//! The completed-hand record set pushed to the statistics sink.
//!
//! None of these exist until a hand's terminal event arrives and the
//! validity predicate holds; they are immutable once emitted, and the
//! working state that produced them is discarded immediately after.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::poker::{ActionKind, Card, Chips, HandId, PlayerId, Position, Street};
use crate::session::SessionDescriptor;

/// One completed hand.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Hand {
    /// Vendor-assigned id from the terminal event.
    pub id: HandId,
    /// Approximate start time - the receipt timestamp of the deal event.
    pub started_at: DateTime<Utc>,
    /// Player id per seat as dealt, `-1` for empty seats.
    pub seat_players: Vec<PlayerId>,
    /// Players that collected chips, in result-delivery order.
    pub winners: Vec<PlayerId>,
    pub small_blind: Chips,
    pub big_blind: Chips,
    /// The session this hand was observed in.
    pub session: SessionDescriptor,
}

/// One street of a completed hand. Owned by its [`Hand`]; never mutated
/// once the next street begins.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Phase {
    pub hand_id: HandId,
    pub street: Street,
    /// Players still contesting the pot at this street, sorted by seat
    /// number.
    pub live_players: Vec<PlayerId>,
    /// Cumulative community cards; monotonically non-decreasing in length
    /// across a hand's phases.
    pub board: Vec<Card>,
}

/// One player action within a completed hand.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Action {
    pub hand_id: HandId,
    pub street: Street,
    pub player: PlayerId,
    pub kind: ActionKind,
    /// The actor's cumulative street wager total after the action.
    pub amount: Chips,
    /// Main pot snapshot after the action.
    pub pot: Chips,
    pub side_pots: Vec<Chips>,
    /// Seat position relative to the blinds (BB=-2, SB=-1, BTN=0, ...).
    pub position: Position,
    /// Hand-wide index, strictly increasing from 0.
    pub index: u32,
    /// Index within this street, strictly increasing from 0.
    pub phase_action_index: u32,
    /// Index among this player's actions within this street.
    pub player_phase_action_index: u32,
    /// Aggressive actions this street before this one. Preflop counts the
    /// forced big blind as an implicit raise, so the count starts at 1.
    pub raise_count: u32,
}

/// Receives each completed hand. Persistence is the sink's responsibility,
/// not the core's.
pub trait HandSink {
    fn on_hand_completed(
        &mut self,
        hand: Hand,
        actions: Vec<Action>,
        phases: Vec<Phase>,
    ) -> anyhow::Result<()>;
}
