//! Per-hand accumulation of the event feed into normalized records.
//!
//! The aggregator is a two-state machine: waiting for a deal, or inside a
//! hand. Working state lives only between the deal and the terminal event;
//! a hand that never closes validly is discarded without output.

use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;

use super::models::{Action, Hand, HandSink, Phase};
use crate::feed::dispatch::FeedSubscriber;
use crate::feed::errors::{ProcessError, ProcessErrorKind};
use crate::feed::events::{
    ActionTakenBody, FeedEvent, HandClosedBody, HandDealtBody, StreetDealtBody, status,
};
use crate::poker::{ActionKind, Card, Chips, PlayerId, Position, SeatIndex, Street};
use crate::session::SessionDescriptor;

/// Working state for the hand currently being accumulated. Never persisted;
/// reset on every new deal and on session boundaries.
#[derive(Debug)]
struct HandAggregationState {
    started_at: DateTime<Utc>,
    seat_players: Vec<PlayerId>,
    positions: HashMap<PlayerId, Position>,
    small_blind: Chips,
    big_blind: Chips,
    phases: Vec<Phase>,
    actions: Vec<Action>,
}

impl HandAggregationState {
    /// Whether the accumulated hand is well-formed enough to emit.
    fn is_valid(&self) -> bool {
        self.seat_players.iter().any(|&p| p >= 0)
            && !self.positions.is_empty()
            && !self.actions.is_empty()
            && self.phases.first().map(|p| p.street) == Some(Street::Preflop)
            && self.small_blind >= 0
            && self.big_blind >= 0
    }
}

#[derive(Debug)]
enum AggregatorState {
    AwaitingHand,
    InHand(Box<HandAggregationState>),
}

/// Stateful accumulator that turns one hand's events into a
/// `(Hand, Action[], Phase[])` record and pushes it to the sink.
pub struct HandAggregator<S: HandSink> {
    session: SessionDescriptor,
    sink: S,
    state: AggregatorState,
}

impl<S: HandSink> HandAggregator<S> {
    #[must_use]
    pub fn new(session: SessionDescriptor, sink: S) -> Self {
        Self {
            session,
            sink,
            state: AggregatorState::AwaitingHand,
        }
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn on_hand_dealt(&mut self, at: DateTime<Utc>, body: &HandDealtBody) {
        if matches!(self.state, AggregatorState::InHand(_)) {
            debug!("new deal arrived with a hand open; discarding the incomplete hand");
        }
        let positions = derive_positions(&body.seat_players, body.big_blind_seat as SeatIndex);
        let live_players: Vec<PlayerId> = body
            .seat_players
            .iter()
            .copied()
            .filter(|&p| p >= 0)
            .collect();
        self.state = AggregatorState::InHand(Box::new(HandAggregationState {
            started_at: at,
            seat_players: body.seat_players.clone(),
            positions,
            small_blind: body.small_blind,
            big_blind: body.big_blind,
            phases: vec![Phase {
                hand_id: 0,
                street: Street::Preflop,
                live_players,
                board: Vec::new(),
            }],
            actions: Vec::new(),
        }));
    }

    fn on_street_dealt(&mut self, body: &StreetDealtBody) {
        let AggregatorState::InHand(hand) = &mut self.state else {
            debug!("street dealt with no hand open; ignoring");
            return;
        };
        let Some(street) = Street::from_code(body.street) else {
            return;
        };
        // The delivered slice is incremental; the phase keeps the board
        // cumulative.
        let mut board = hand.phases.last().map(|p| p.board.clone()).unwrap_or_default();
        board.extend(body.cards.iter().map(|&id| Card(id)));
        // The live set is derived from the delivered statuses, not copied:
        // filter to still-live seats, map to player ids, seat order.
        let live_players: Vec<PlayerId> = body
            .seat_status
            .iter()
            .enumerate()
            .filter(|&(_, &code)| status::is_live(code))
            .filter_map(|(seat, _)| hand.seat_players.get(seat).copied())
            .filter(|&p| p >= 0)
            .collect();
        hand.phases.push(Phase {
            hand_id: 0,
            street,
            live_players,
            board,
        });
    }

    fn on_action_taken(&mut self, body: &ActionTakenBody) -> Result<(), ProcessError> {
        let AggregatorState::InHand(hand) = &mut self.state else {
            debug!("action with no hand open; ignoring");
            return Ok(());
        };
        let seat = body.seat as SeatIndex;
        let player = match hand.seat_players.get(seat).copied() {
            Some(p) if p >= 0 => p,
            _ => {
                let entries = hand.actions.len();
                return Err(ProcessError {
                    stream: "aggregator",
                    hand: None,
                    entries,
                    kind: ProcessErrorKind::UnresolvedSeat { seat },
                });
            }
        };
        // The street comes from the last recorded street-dealt event. The
        // street field on the action event itself lags at phase boundaries
        // and is never read.
        let Some(street) = hand.phases.last().map(|p| p.street) else {
            let entries = hand.actions.len();
            return Err(ProcessError {
                stream: "aggregator",
                hand: None,
                entries,
                kind: ProcessErrorKind::NoOpenStreet,
            });
        };
        let Some(&position) = hand.positions.get(&player) else {
            let entries = hand.actions.len();
            return Err(ProcessError {
                stream: "aggregator",
                hand: None,
                entries,
                kind: ProcessErrorKind::UnpositionedPlayer { player },
            });
        };
        let Some(kind) = ActionKind::from_code(body.kind) else {
            return Ok(());
        };

        let index = hand.actions.len() as u32;
        let on_street = |a: &&Action| a.street == street;
        let phase_action_index = hand.actions.iter().filter(on_street).count() as u32;
        let player_phase_action_index = hand
            .actions
            .iter()
            .filter(|a| a.street == street && a.player == player)
            .count() as u32;
        let mut raise_count = hand
            .actions
            .iter()
            .filter(|a| a.street == street && a.kind.is_aggressive())
            .count() as u32;
        if street == Street::Preflop {
            // The forced big blind counts as the first preflop raise.
            raise_count += 1;
        }

        hand.actions.push(Action {
            hand_id: 0,
            street,
            player,
            kind,
            amount: body.amount,
            pot: body.pot,
            side_pots: body.side_pots.clone(),
            position,
            index,
            phase_action_index,
            player_phase_action_index,
            raise_count,
        });
        Ok(())
    }

    fn on_hand_closed(&mut self, body: &HandClosedBody) -> Result<(), ProcessError> {
        let state = std::mem::replace(&mut self.state, AggregatorState::AwaitingHand);
        let AggregatorState::InHand(mut hand) = state else {
            debug!("hand close with no hand open; ignoring");
            return Ok(());
        };

        // Two or more survivors mean a showdown happened; record it as a
        // synthetic terminal phase over the final board.
        if body.results.len() > 1 {
            let mut survivors: Vec<_> = body.results.iter().collect();
            survivors.sort_by_key(|r| r.seat);
            hand.phases.push(Phase {
                hand_id: 0,
                street: Street::Showdown,
                live_players: survivors.iter().map(|r| r.player_id).collect(),
                board: body.board.iter().map(|&id| Card(id)).collect(),
            });
        }

        if !hand.is_valid() {
            debug!("hand {} failed validity; discarding without output", body.hand_id);
            return Ok(());
        }

        for phase in &mut hand.phases {
            phase.hand_id = body.hand_id;
        }
        for action in &mut hand.actions {
            action.hand_id = body.hand_id;
        }
        let record = Hand {
            id: body.hand_id,
            started_at: hand.started_at,
            seat_players: hand.seat_players,
            winners: body
                .results
                .iter()
                .filter(|r| r.won > 0)
                .map(|r| r.player_id)
                .collect(),
            small_blind: hand.small_blind,
            big_blind: hand.big_blind,
            session: self.session.clone(),
        };
        let entries = hand.actions.len();
        self.sink
            .on_hand_completed(record, hand.actions, hand.phases)
            .map_err(|e| ProcessError {
                stream: "aggregator",
                hand: Some(body.hand_id),
                entries,
                kind: ProcessErrorKind::Sink(e),
            })
    }
}

impl<S: HandSink> FeedSubscriber for HandAggregator<S> {
    fn name(&self) -> &'static str {
        "aggregator"
    }

    fn on_event(&mut self, event: &FeedEvent) -> Result<(), ProcessError> {
        match event {
            FeedEvent::HandDealt { at, body } => {
                self.on_hand_dealt(*at, body);
                Ok(())
            }
            FeedEvent::StreetDealt { body, .. } => {
                self.on_street_dealt(body);
                Ok(())
            }
            FeedEvent::ActionTaken { body, .. } => self.on_action_taken(body),
            FeedEvent::HandClosed { body, .. } => self.on_hand_closed(body),
            FeedEvent::Unknown { .. } => Ok(()),
        }
    }

    fn on_session_end(&mut self) -> Result<(), ProcessError> {
        if matches!(self.state, AggregatorState::InHand(_)) {
            debug!("session ended mid-hand; discarding the incomplete hand");
        }
        self.state = AggregatorState::AwaitingHand;
        Ok(())
    }
}

/// Rotate the dealt seat order to start immediately after the big-blind
/// seat, reverse it, and assign position = index - 2. This reproduces the
/// blind convention (BB=-2, SB=-1, BTN=0, then ascending) without a
/// feed-provided position field.
fn derive_positions(
    seat_players: &[PlayerId],
    big_blind_seat: SeatIndex,
) -> HashMap<PlayerId, Position> {
    let occupied: Vec<(SeatIndex, PlayerId)> = seat_players
        .iter()
        .enumerate()
        .filter(|&(_, &p)| p >= 0)
        .map(|(seat, &p)| (seat, p))
        .collect();
    let Some(bb_index) = occupied.iter().position(|&(seat, _)| seat == big_blind_seat) else {
        return HashMap::new();
    };
    let count = occupied.len();
    let mut rotated: Vec<PlayerId> = (1..=count)
        .map(|offset| occupied[(bb_index + offset) % count].1)
        .collect();
    rotated.reverse();
    rotated
        .into_iter()
        .enumerate()
        .map(|(i, p)| (p, i as Position - 2))
        .collect()
}
