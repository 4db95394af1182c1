//! End-to-end pipeline tests: raw tagged events through the schema guard
//! and dispatcher into both state machines at once.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hand_tracker::feed::events::tags;
use hand_tracker::history::{HandHistoryFormatter, HistorySink, LogEntry};
use hand_tracker::poker::{HandId, PlayerId};
use hand_tracker::session::{SeatDirectory, SeatInfo, SessionDescriptor, SessionKind};
use hand_tracker::tracker::{Action, Hand, HandAggregator, HandSink, Phase};
use hand_tracker::{FeedDispatcher, RawEvent};

// ============================================================================
// Shared test doubles - the dispatcher owns the subscribers, so the sinks
// hand their data out through shared handles.
// ============================================================================

type CompletedHands = Arc<Mutex<Vec<(Hand, Vec<Action>, Vec<Phase>)>>>;

#[derive(Clone, Default)]
struct SharedHandSink {
    completed: CompletedHands,
}

impl HandSink for SharedHandSink {
    fn on_hand_completed(
        &mut self,
        hand: Hand,
        actions: Vec<Action>,
        phases: Vec<Phase>,
    ) -> anyhow::Result<()> {
        self.completed.lock().unwrap().push((hand, actions, phases));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct SharedHistorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    removed_incomplete: Arc<Mutex<usize>>,
}

impl HistorySink for SharedHistorySink {
    fn append(&mut self, entries: &[LogEntry]) -> anyhow::Result<()> {
        self.entries.lock().unwrap().extend_from_slice(entries);
        Ok(())
    }

    fn replace_by_hand_id(&mut self, hand_id: HandId, entries: &[LogEntry]) -> anyhow::Result<()> {
        let mut visible = self.entries.lock().unwrap();
        visible.retain(|e| e.hand_id != hand_id);
        visible.extend_from_slice(entries);
        Ok(())
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }

    fn remove_incomplete(&mut self) -> anyhow::Result<()> {
        self.entries.lock().unwrap().retain(|e| !e.is_provisional());
        *self.removed_incomplete.lock().unwrap() += 1;
        Ok(())
    }
}

struct MapDirectory(HashMap<PlayerId, &'static str>);

impl SeatDirectory for MapDirectory {
    fn lookup(&self, player: PlayerId) -> Option<SeatInfo> {
        self.0.get(&player).map(|name| SeatInfo {
            name: (*name).to_string(),
            rank: 1,
        })
    }
}

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 3, 22, 30, 0).unwrap()
}

fn raw(tag: u16, body: serde_json::Value) -> RawEvent {
    RawEvent {
        tag,
        version: 1,
        received_at: at(),
        body,
    }
}

fn pipeline() -> (FeedDispatcher, CompletedHands, SharedHistorySink) {
    let session = SessionDescriptor::new(9001, SessionKind::Tournament, "Nightly 9001");
    let hand_sink = SharedHandSink::default();
    let completed = Arc::clone(&hand_sink.completed);
    let history_sink = SharedHistorySink::default();
    let directory = MapDirectory(
        [(301, "Dan"), (302, "Eve"), (303, "Frank")]
            .into_iter()
            .collect(),
    );

    let mut dispatcher = FeedDispatcher::new();
    dispatcher.subscribe(Box::new(HandAggregator::new(session.clone(), hand_sink)));
    dispatcher.subscribe(Box::new(HandHistoryFormatter::new(
        session,
        directory,
        history_sink.clone(),
    )));
    (dispatcher, completed, history_sink)
}

fn deal_raw() -> RawEvent {
    raw(
        tags::HAND_DEALT,
        json!({
            "seat_players": [301, 302, 303],
            "seat_stacks": [10_000, 4_950, 9_900],
            "seat_wagers": [0, 50, 100],
            "button_seat": 0,
            "small_blind_seat": 1,
            "big_blind_seat": 2,
            "small_blind": 50,
            "big_blind": 100,
        }),
    )
}

fn action_raw(seat: u8, kind: u8, amount: i64, pot: i64) -> RawEvent {
    raw(
        tags::ACTION_TAKEN,
        json!({
            "seat": seat,
            "kind": kind,
            "amount": amount,
            "pot": pot,
            "street": 0,
        }),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_full_hand_reaches_both_sinks() {
    let (mut dispatcher, completed, history) = pipeline();

    assert!(dispatcher.push(&deal_raw()).is_empty());
    assert!(dispatcher.push(&action_raw(0, 2, 0, 150)).is_empty());
    assert!(dispatcher.push(&action_raw(1, 2, 0, 150)).is_empty());
    assert!(
        dispatcher
            .push(&raw(
                tags::HAND_CLOSED,
                json!({
                    "hand_id": 555_001,
                    "pot": 100,
                    "results": [{"seat": 2, "player_id": 303, "won": 100}],
                }),
            ))
            .is_empty()
    );

    let completed = completed.lock().unwrap();
    assert_eq!(completed.len(), 1);
    let (hand, actions, phases) = &completed[0];
    assert_eq!(hand.id, 555_001);
    assert_eq!(hand.winners, vec![303]);
    assert_eq!(actions.len(), 2);
    assert_eq!(phases.len(), 1);

    let entries = history.entries.lock().unwrap();
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|e| e.hand_id == 555_001));
    assert!(
        entries
            .iter()
            .any(|e| e.text.starts_with("PokerStars Hand #555001:"))
    );
    assert!(entries.iter().any(|e| e.text.contains("doesn't show hand")));
}

#[test]
fn test_malformed_and_unknown_events_do_not_disturb_the_hand() {
    let (mut dispatcher, completed, _history) = pipeline();

    dispatcher.push(&deal_raw());
    // A malformed action (missing fields) and an unknown tag arrive
    // mid-hand; both are skipped without touching either machine.
    assert!(
        dispatcher
            .push(&raw(tags::ACTION_TAKEN, json!({"seat": 0})))
            .is_empty()
    );
    assert!(
        dispatcher
            .push(&raw(0x0999, json!({"payload": [1, 2, 3]})))
            .is_empty()
    );
    dispatcher.push(&action_raw(0, 2, 0, 150));
    dispatcher.push(&action_raw(1, 2, 0, 150));
    dispatcher.push(&raw(
        tags::HAND_CLOSED,
        json!({
            "hand_id": 555_002,
            "pot": 100,
            "results": [{"seat": 2, "player_id": 303, "won": 100}],
        }),
    ));

    let completed = completed.lock().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].1.len(), 2, "only the valid actions count");
}

#[test]
fn test_session_end_cleans_up_both_machines() {
    let (mut dispatcher, completed, history) = pipeline();

    dispatcher.push(&deal_raw());
    dispatcher.push(&action_raw(0, 3, 100, 250));
    assert!(dispatcher.end_session().is_empty());

    assert!(completed.lock().unwrap().is_empty());
    assert_eq!(*history.removed_incomplete.lock().unwrap(), 1);
    assert!(history.entries.lock().unwrap().is_empty());

    // The next hand on the same dispatcher starts clean.
    dispatcher.push(&deal_raw());
    dispatcher.push(&action_raw(0, 2, 0, 150));
    dispatcher.push(&action_raw(1, 2, 0, 150));
    dispatcher.push(&raw(
        tags::HAND_CLOSED,
        json!({
            "hand_id": 555_003,
            "pot": 100,
            "results": [{"seat": 2, "player_id": 303, "won": 100}],
        }),
    ));
    assert_eq!(completed.lock().unwrap().len(), 1);
    assert_eq!(completed.lock().unwrap()[0].0.id, 555_003);
}
