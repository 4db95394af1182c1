//! Per-tag shape validation for incoming feed events.
//!
//! Extraction is strict but not coercive: a missing or mistyped field
//! rejects the event, while fields the vendor added since this build are
//! ignored. Semantic checks (card ranges, array alignment, seat bounds)
//! run after extraction so a rejection always names a concrete reason.

use serde::de::DeserializeOwned;

use super::errors::SchemaError;
use super::events::{
    ActionTakenBody, FeedEvent, HandClosedBody, HandDealtBody, RawEvent, StreetDealtBody,
    SUPPORTED_VERSION, status, tags,
};
use crate::poker::constants::{BOARD_SIZE, DECK_SIZE, HOLE_CARD_COUNT, MAX_SEATS, MIN_SEATS};
use crate::poker::{ActionKind, Chips, Street};

/// Validates each tagged event against its tag's known shape.
///
/// Unknown tags come back as [`FeedEvent::Unknown`] - the vendor ships many
/// event types this core has no use for, and none of them may abort the
/// stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct SchemaGuard;

impl SchemaGuard {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate one envelope and type its body.
    pub fn decode(&self, raw: &RawEvent) -> Result<FeedEvent, SchemaError> {
        match raw.tag {
            tags::HAND_DEALT => {
                let body: HandDealtBody = extract(raw)?;
                validate_hand_dealt(raw.tag, &body)?;
                Ok(FeedEvent::HandDealt {
                    at: raw.received_at,
                    body,
                })
            }
            tags::STREET_DEALT => {
                let body: StreetDealtBody = extract(raw)?;
                validate_street_dealt(raw.tag, &body)?;
                Ok(FeedEvent::StreetDealt {
                    at: raw.received_at,
                    body,
                })
            }
            tags::ACTION_TAKEN => {
                let body: ActionTakenBody = extract(raw)?;
                validate_action_taken(raw.tag, &body)?;
                Ok(FeedEvent::ActionTaken {
                    at: raw.received_at,
                    body,
                })
            }
            tags::HAND_CLOSED => {
                let body: HandClosedBody = extract(raw)?;
                validate_hand_closed(raw.tag, &body)?;
                Ok(FeedEvent::HandClosed {
                    at: raw.received_at,
                    body,
                })
            }
            tag => Ok(FeedEvent::Unknown { tag }),
        }
    }
}

fn extract<T: DeserializeOwned>(raw: &RawEvent) -> Result<T, SchemaError> {
    if raw.version > SUPPORTED_VERSION {
        return Err(SchemaError::UnsupportedVersion {
            tag: raw.tag,
            version: raw.version,
            supported: SUPPORTED_VERSION,
        });
    }
    serde_json::from_value(raw.body.clone()).map_err(|source| SchemaError::Malformed {
        tag: raw.tag,
        source,
    })
}

fn validate_hand_dealt(tag: u16, body: &HandDealtBody) -> Result<(), SchemaError> {
    let seats = body.seat_players.len();
    if !(MIN_SEATS..=MAX_SEATS).contains(&seats) {
        return Err(SchemaError::invalid(tag, format!("{seats} seats dealt")));
    }
    if body.seat_stacks.len() != seats || body.seat_wagers.len() != seats {
        return Err(SchemaError::invalid(
            tag,
            "seat stack/wager arrays misaligned with the seat array",
        ));
    }
    for (name, seat) in [
        ("button", body.button_seat),
        ("small blind", body.small_blind_seat),
        ("big blind", body.big_blind_seat),
    ] {
        let idx = seat as usize;
        if idx >= seats || body.seat_players[idx] < 0 {
            return Err(SchemaError::invalid(
                tag,
                format!("{name} seat {seat} is not an occupied seat"),
            ));
        }
    }
    check_amounts(tag, &[body.small_blind, body.big_blind, body.ante])?;
    check_amounts(tag, &body.seat_stacks)?;
    check_amounts(tag, &body.seat_wagers)?;
    if let Some(hero) = body.hero_seat
        && hero as usize >= seats
    {
        return Err(SchemaError::invalid(
            tag,
            format!("hero seat {hero} out of range"),
        ));
    }
    if !body.hero_cards.is_empty() && body.hero_cards.len() != HOLE_CARD_COUNT {
        return Err(SchemaError::invalid(
            tag,
            format!("{} hero hole cards", body.hero_cards.len()),
        ));
    }
    check_cards(tag, &body.hero_cards)
}

fn validate_street_dealt(tag: u16, body: &StreetDealtBody) -> Result<(), SchemaError> {
    if Street::from_code(body.street).is_none() {
        return Err(SchemaError::invalid(
            tag,
            format!("street code {}", body.street),
        ));
    }
    if body.cards.len() > BOARD_SIZE {
        return Err(SchemaError::invalid(
            tag,
            format!("{} community cards in one delivery", body.cards.len()),
        ));
    }
    check_cards(tag, &body.cards)?;
    if !(MIN_SEATS..=MAX_SEATS).contains(&body.seat_status.len()) {
        return Err(SchemaError::invalid(
            tag,
            format!("{} seat statuses", body.seat_status.len()),
        ));
    }
    if let Some(&code) = body.seat_status.iter().find(|&&c| c > status::ALL_IN) {
        return Err(SchemaError::invalid(
            tag,
            format!("seat status code {code}"),
        ));
    }
    Ok(())
}

fn validate_action_taken(tag: u16, body: &ActionTakenBody) -> Result<(), SchemaError> {
    if body.seat as usize >= MAX_SEATS {
        return Err(SchemaError::invalid(
            tag,
            format!("seat {} out of range", body.seat),
        ));
    }
    if ActionKind::from_code(body.kind).is_none() {
        return Err(SchemaError::invalid(
            tag,
            format!("action kind code {}", body.kind),
        ));
    }
    // The street code is validated even though consumers derive the street
    // themselves; a bad code still signals a protocol change worth rejecting.
    if Street::from_code(body.street).is_none() {
        return Err(SchemaError::invalid(
            tag,
            format!("street code {}", body.street),
        ));
    }
    check_amounts(tag, &[body.amount, body.pot])?;
    check_amounts(tag, &body.side_pots)
}

fn validate_hand_closed(tag: u16, body: &HandClosedBody) -> Result<(), SchemaError> {
    if body.results.is_empty() {
        return Err(SchemaError::invalid(tag, "no result entries"));
    }
    if body.board.len() > BOARD_SIZE {
        return Err(SchemaError::invalid(
            tag,
            format!("{} board cards", body.board.len()),
        ));
    }
    check_cards(tag, &body.board)?;
    check_amounts(tag, &[body.pot])?;
    check_amounts(tag, &body.side_pots)?;
    for result in &body.results {
        if result.seat as usize >= MAX_SEATS {
            return Err(SchemaError::invalid(
                tag,
                format!("result seat {} out of range", result.seat),
            ));
        }
        if result.player_id < 0 {
            return Err(SchemaError::invalid(
                tag,
                format!("result player id {}", result.player_id),
            ));
        }
        if result.won < 0 {
            return Err(SchemaError::invalid(
                tag,
                format!("negative winnings {}", result.won),
            ));
        }
        if !result.hole_cards.is_empty() && result.hole_cards.len() != HOLE_CARD_COUNT {
            return Err(SchemaError::invalid(
                tag,
                format!("{} revealed hole cards", result.hole_cards.len()),
            ));
        }
        check_cards(tag, &result.hole_cards)?;
    }
    Ok(())
}

fn check_amounts(tag: u16, amounts: &[Chips]) -> Result<(), SchemaError> {
    match amounts.iter().find(|&&a| a < 0) {
        Some(a) => Err(SchemaError::invalid(tag, format!("negative amount {a}"))),
        None => Ok(()),
    }
}

/// Card ids must be in deck range and distinct within one delivery.
fn check_cards(tag: u16, cards: &[u8]) -> Result<(), SchemaError> {
    let mut seen = [false; DECK_SIZE as usize];
    for &id in cards {
        if id >= DECK_SIZE {
            return Err(SchemaError::invalid(tag, format!("card id {id}")));
        }
        if seen[id as usize] {
            return Err(SchemaError::invalid(tag, format!("duplicate card id {id}")));
        }
        seen[id as usize] = true;
    }
    Ok(())
}
