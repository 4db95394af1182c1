//! The hand-history formatter state machine.
//!
//! A second, independent consumer of the event feed that reproduces a fixed
//! third-party text convention line by line. It shares no state with the
//! aggregator; both can fail or reset without touching the other. All lines
//! carry a provisional id until the terminal event reveals the real one,
//! then the whole hand is rewritten in place through the sink.

use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;

use super::entries::{EntryCategory, EntryKind, HistorySink, LogEntry};
use crate::feed::dispatch::FeedSubscriber;
use crate::feed::errors::{ProcessError, ProcessErrorKind};
use crate::feed::events::{
    ActionTakenBody, FeedEvent, HandClosedBody, HandDealtBody, HandResultBody, StreetDealtBody,
};
use crate::poker::constants::HOLE_CARD_COUNT;
use crate::poker::{
    ActionKind, Card, Chips, HandId, HandRank, PlayerId, SeatIndex, Street, evaluate,
};
use crate::session::{
    HoleCardCacheHandle, SeatDirectory, SeatInfo, SessionDescriptor, fallback_name,
};

/// Render a card list the way the dialect brackets them: `Ah Kd 2c`.
fn card_list(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Working state for the hand currently being written.
struct HandHistoryState {
    provisional_id: HandId,
    entries: Vec<LogEntry>,
    /// Cumulative community cards.
    board: Vec<Card>,
    /// The last street opened by a street-dealt event (or synthesis).
    /// Action lines are tagged with this, never with the street code on the
    /// action event itself.
    street: Street,
    /// Which of flop/turn/river already have their reveal line.
    streets_emitted: [bool; 3],
    seat_players: Vec<PlayerId>,
    /// Name and rank per occupied seat, cached from the seat-assignment
    /// collaborator at deal time.
    seat_infos: HashMap<SeatIndex, SeatInfo>,
    button_seat: SeatIndex,
    small_blind_seat: SeatIndex,
    big_blind_seat: SeatIndex,
    big_blind: Chips,
}

impl HandHistoryState {
    fn display_name(&self, seat: SeatIndex) -> String {
        match self.seat_infos.get(&seat) {
            Some(info) => info.name.clone(),
            None => fallback_name(self.seat_players.get(seat).copied().unwrap_or(-1)),
        }
    }

    fn name_of_player(&self, player: PlayerId) -> String {
        self.seat_players
            .iter()
            .position(|&p| p == player)
            .map_or_else(|| fallback_name(player), |seat| self.display_name(seat))
    }

    /// Last cumulative wager total placed on `street`, by anyone.
    fn last_wager_total(&self, street: Street) -> Option<Chips> {
        self.entries
            .iter()
            .rev()
            .find(|e| {
                e.street == Some(street) && e.kind.is_some_and(EntryKind::carries_wager_total)
            })
            .and_then(|e| e.amount)
    }

    /// Actor and total of the last aggressive entry on `street`.
    fn last_aggressor(&self, street: Street) -> Option<(PlayerId, Chips)> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.street == Some(street) && e.kind.is_some_and(EntryKind::is_aggressive))
            .and_then(|e| Some((e.player?, e.amount?)))
    }

    /// Largest wager total any seat other than `player` placed on `street`.
    fn max_wager_by_other(&self, street: Street, player: PlayerId) -> Chips {
        self.entries
            .iter()
            .filter(|e| {
                e.street == Some(street)
                    && e.player.is_some()
                    && e.player != Some(player)
                    && e.kind.is_some_and(EntryKind::carries_wager_total)
            })
            .filter_map(|e| e.amount)
            .max()
            .unwrap_or(0)
    }

    /// The street a player folded on, if they folded.
    fn fold_street(&self, player: PlayerId) -> Option<Street> {
        self.entries
            .iter()
            .find(|e| e.player == Some(player) && e.kind == Some(EntryKind::Fold))
            .and_then(|e| e.street)
    }

    /// Reveal lines for every street the cumulative board now covers but
    /// which has no line yet. Covers both live streets and the terminal
    /// synthesis of an all-in runout.
    fn street_reveal_lines(&mut self, at: DateTime<Utc>) -> Vec<LogEntry> {
        let mut lines = Vec::new();
        for (i, street) in [Street::Flop, Street::Turn, Street::River].into_iter().enumerate() {
            if self.streets_emitted[i] || self.board.len() < street.board_len() {
                continue;
            }
            let text = match street {
                Street::Flop => format!("*** FLOP *** [{}]", card_list(&self.board[..3])),
                Street::Turn => format!(
                    "*** TURN *** [{}] [{}]",
                    card_list(&self.board[..3]),
                    self.board[3]
                ),
                _ => format!(
                    "*** RIVER *** [{}] [{}]",
                    card_list(&self.board[..4]),
                    self.board[4]
                ),
            };
            let mut entry = LogEntry::line(EntryCategory::Street, self.provisional_id, at, text);
            entry.street = Some(street);
            lines.push(entry);
            self.streets_emitted[i] = true;
            self.street = street;
        }
        lines
    }
}

/// Stateful writer that turns one hand's events into hand-history text.
pub struct HandHistoryFormatter<S: HistorySink, D: SeatDirectory> {
    session: SessionDescriptor,
    directory: D,
    sink: S,
    hole_cards: Option<HoleCardCacheHandle>,
    next_provisional: HandId,
    state: Option<HandHistoryState>,
}

impl<S: HistorySink, D: SeatDirectory> HandHistoryFormatter<S, D> {
    #[must_use]
    pub fn new(session: SessionDescriptor, directory: D, sink: S) -> Self {
        Self {
            session,
            directory,
            sink,
            hole_cards: None,
            next_provisional: -1,
            state: None,
        }
    }

    /// Attach the shared hole-card cache; revealed showdown cards are
    /// inserted for real-time consumers.
    #[must_use]
    pub fn with_hole_card_cache(mut self, cache: HoleCardCacheHandle) -> Self {
        self.hole_cards = Some(cache);
        self
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Drop the in-progress hand and wipe the visible log; used when the
    /// host attaches to a different session.
    pub fn reset(&mut self) -> Result<(), ProcessError> {
        self.state = None;
        self.sink
            .clear()
            .map_err(|e| self.sink_error(ProcessErrorKind::Sink(e)))
    }

    fn sink_error(&self, kind: ProcessErrorKind) -> ProcessError {
        ProcessError {
            stream: "formatter",
            hand: self.state.as_ref().map(|s| s.provisional_id),
            entries: self.state.as_ref().map_or(0, |s| s.entries.len()),
            kind,
        }
    }

    /// Record freshly built lines in the working state and push them to the
    /// sink incrementally.
    fn push_lines(&mut self, lines: Vec<LogEntry>) -> Result<(), ProcessError> {
        if lines.is_empty() {
            return Ok(());
        }
        if let Some(state) = self.state.as_mut() {
            state.entries.extend(lines.iter().cloned());
        }
        self.sink
            .append(&lines)
            .map_err(|e| self.sink_error(ProcessErrorKind::Sink(e)))
    }

    fn on_hand_dealt(
        &mut self,
        at: DateTime<Utc>,
        body: &HandDealtBody,
    ) -> Result<(), ProcessError> {
        if self.state.take().is_some() {
            debug!("new deal with a hand still open; removing its incomplete entries");
            self.sink
                .remove_incomplete()
                .map_err(|e| self.sink_error(ProcessErrorKind::Sink(e)))?;
        }

        let provisional_id = self.next_provisional;
        self.next_provisional -= 1;

        let mut seat_infos = HashMap::new();
        for (seat, &player) in body.seat_players.iter().enumerate() {
            if player >= 0 {
                let info = self.directory.lookup(player).unwrap_or_else(|| SeatInfo {
                    name: fallback_name(player),
                    rank: 0,
                });
                seat_infos.insert(seat, info);
            }
        }

        let state = HandHistoryState {
            provisional_id,
            entries: Vec::new(),
            board: Vec::new(),
            street: Street::Preflop,
            streets_emitted: [false; 3],
            seat_players: body.seat_players.clone(),
            seat_infos,
            button_seat: body.button_seat as SeatIndex,
            small_blind_seat: body.small_blind_seat as SeatIndex,
            big_blind_seat: body.big_blind_seat as SeatIndex,
            big_blind: body.big_blind,
        };

        let ts = at.format("%Y/%m/%d %H:%M:%S");
        let header = match self.session.kind {
            crate::session::SessionKind::Tournament => format!(
                "PokerStars Hand #{provisional_id}: Tournament #{}, Hold'em No Limit ({}/{}) - {ts}",
                self.session.battle_id, body.small_blind, body.big_blind
            ),
            crate::session::SessionKind::Cash => format!(
                "PokerStars Hand #{provisional_id}:  Hold'em No Limit ({}/{}) - {ts}",
                body.small_blind, body.big_blind
            ),
        };
        let mut lines = vec![
            LogEntry::line(EntryCategory::Header, provisional_id, at, header),
            LogEntry::line(
                EntryCategory::Header,
                provisional_id,
                at,
                format!(
                    "Table '{}' {}-max Seat #{} is the button",
                    self.session.name,
                    body.seat_players.len(),
                    state.button_seat + 1
                ),
            ),
        ];

        for (seat, &player) in body.seat_players.iter().enumerate() {
            if player < 0 {
                continue;
            }
            // The seat line shows the pre-ante total, reconstructed as the
            // remaining stack plus whatever is already in front of the seat.
            let chips = body.seat_stacks[seat] + body.seat_wagers[seat];
            let mut entry = LogEntry::line(
                EntryCategory::Seat,
                provisional_id,
                at,
                format!("Seat {}: {} ({} in chips)", seat + 1, state.display_name(seat), chips),
            );
            entry.seat = Some(seat);
            entry.player = Some(player);
            lines.push(entry);
        }

        if body.ante > 0 {
            for (seat, &player) in body.seat_players.iter().enumerate() {
                if player < 0 {
                    continue;
                }
                let mut entry = LogEntry::line(
                    EntryCategory::Action,
                    provisional_id,
                    at,
                    format!("{}: posts the ante {}", state.display_name(seat), body.ante),
                );
                entry.street = Some(Street::Preflop);
                entry.seat = Some(seat);
                entry.player = Some(player);
                entry.kind = Some(EntryKind::Ante);
                entry.amount = Some(body.ante);
                lines.push(entry);
            }
        }

        for (seat, kind, label, amount) in [
            (
                state.small_blind_seat,
                EntryKind::SmallBlind,
                "small blind",
                body.small_blind,
            ),
            (
                state.big_blind_seat,
                EntryKind::BigBlind,
                "big blind",
                body.big_blind,
            ),
        ] {
            let Some(&player) = state.seat_players.get(seat) else {
                continue;
            };
            if player < 0 {
                continue;
            }
            let mut entry = LogEntry::line(
                EntryCategory::Action,
                provisional_id,
                at,
                format!("{}: posts {label} {amount}", state.display_name(seat)),
            );
            entry.street = Some(Street::Preflop);
            entry.seat = Some(seat);
            entry.player = Some(player);
            entry.kind = Some(kind);
            entry.amount = Some(amount);
            lines.push(entry);
        }

        let mut marker = LogEntry::line(
            EntryCategory::Street,
            provisional_id,
            at,
            "*** HOLE CARDS ***".to_string(),
        );
        marker.street = Some(Street::Preflop);
        lines.push(marker);

        if let Some(hero) = body.hero_seat
            && body.hero_cards.len() == HOLE_CARD_COUNT
        {
            let cards: Vec<Card> = body.hero_cards.iter().map(|&id| Card(id)).collect();
            let mut entry = LogEntry::line(
                EntryCategory::Street,
                provisional_id,
                at,
                format!(
                    "Dealt to {} [{}]",
                    state.display_name(hero as SeatIndex),
                    card_list(&cards)
                ),
            );
            entry.street = Some(Street::Preflop);
            entry.seat = Some(hero as SeatIndex);
            lines.push(entry);
        }

        self.state = Some(state);
        self.push_lines(lines)
    }

    fn on_street_dealt(
        &mut self,
        at: DateTime<Utc>,
        body: &StreetDealtBody,
    ) -> Result<(), ProcessError> {
        let Some(state) = self.state.as_mut() else {
            debug!("street dealt with no hand open; ignoring");
            return Ok(());
        };
        state.board.extend(body.cards.iter().map(|&id| Card(id)));
        let lines = state.street_reveal_lines(at);
        self.push_lines(lines)
    }

    fn on_action_taken(
        &mut self,
        at: DateTime<Utc>,
        body: &ActionTakenBody,
    ) -> Result<(), ProcessError> {
        let Some(state) = self.state.as_ref() else {
            debug!("action with no hand open; ignoring");
            return Ok(());
        };
        let seat = body.seat as SeatIndex;
        let player = match state.seat_players.get(seat).copied() {
            Some(p) if p >= 0 => p,
            _ => {
                return Err(ProcessError {
                    stream: "formatter",
                    hand: Some(state.provisional_id),
                    entries: state.entries.len(),
                    kind: ProcessErrorKind::UnresolvedSeat { seat },
                });
            }
        };
        let Some(kind) = ActionKind::from_code(body.kind) else {
            return Ok(());
        };
        let name = state.display_name(seat);
        let street = state.street;
        let amount = body.amount;

        let (text, entry_kind, entry_amount) = match kind {
            ActionKind::Check => (format!("{name}: checks"), EntryKind::Check, None),
            ActionKind::Fold => (format!("{name}: folds"), EntryKind::Fold, None),
            ActionKind::Bet => (
                format!("{name}: bets {amount}"),
                EntryKind::Bet,
                Some(amount),
            ),
            ActionKind::Call => (
                format!("{name}: calls {amount}"),
                EntryKind::Call,
                Some(amount),
            ),
            ActionKind::Raise => {
                // The raise delta is reconstructed from the last wagered
                // total on this street, falling back to the big blind.
                let last = state.last_wager_total(street).unwrap_or(state.big_blind);
                (
                    format!("{name}: raises {} to {amount}", amount - last),
                    EntryKind::Raise,
                    Some(amount),
                )
            }
            ActionKind::AllIn => {
                let text = match state.last_wager_total(street) {
                    None => format!("{name}: bets {amount} and is all-in"),
                    Some(last) if amount > last => {
                        format!("{name}: raises {} to {amount} and is all-in", amount - last)
                    }
                    Some(_) => format!("{name}: calls {amount} and is all-in"),
                };
                (text, EntryKind::AllIn, Some(amount))
            }
        };

        let mut entry = LogEntry::line(EntryCategory::Action, state.provisional_id, at, text);
        entry.street = Some(street);
        entry.seat = Some(seat);
        entry.player = Some(player);
        entry.kind = Some(entry_kind);
        entry.amount = entry_amount;
        self.push_lines(vec![entry])
    }

    fn on_hand_closed(
        &mut self,
        at: DateTime<Utc>,
        body: &HandClosedBody,
    ) -> Result<(), ProcessError> {
        let Some(mut state) = self.state.take() else {
            debug!("hand close with no hand open; ignoring");
            return Ok(());
        };
        let provisional_id = state.provisional_id;

        // The terminal board is authoritative; adopting it lets the reveal
        // synthesis below emit any street line the feed skipped.
        if body.board.len() > state.board.len() {
            state.board = body.board.iter().map(|&id| Card(id)).collect();
        }
        let mut lines = state.street_reveal_lines(at);

        // Evaluate every shown hand once; showdown ordering and the summary
        // both need the ranks.
        let shown: Vec<(&HandResultBody, Vec<Card>, Option<HandRank>)> = body
            .results
            .iter()
            .filter(|r| r.hole_cards.len() == HOLE_CARD_COUNT)
            .map(|r| {
                let cards: Vec<Card> = r.hole_cards.iter().map(|&id| Card(id)).collect();
                let mut full = cards.clone();
                full.extend_from_slice(&state.board);
                let rank = (5..=7).contains(&full.len()).then(|| evaluate(&full));
                (r, cards, rank)
            })
            .collect();
        let showdown_happened = !shown.is_empty();

        if showdown_happened {
            let mut entry = LogEntry::line(
                EntryCategory::Showdown,
                provisional_id,
                at,
                "*** SHOW DOWN ***".to_string(),
            );
            entry.street = Some(Street::Showdown);
            lines.push(entry);

            let mut ordered: Vec<_> = shown.iter().collect();
            ordered.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.seat.cmp(&b.0.seat)));
            for (result, cards, rank) in ordered {
                let name = state.display_name(result.seat as SeatIndex);
                let text = match rank {
                    Some(rank) => {
                        format!("{name}: shows [{}] ({})", card_list(cards), rank.phrase())
                    }
                    None => format!("{name}: shows [{}]", card_list(cards)),
                };
                let mut entry =
                    LogEntry::line(EntryCategory::Showdown, provisional_id, at, text);
                entry.street = Some(Street::Showdown);
                entry.seat = Some(result.seat as SeatIndex);
                entry.player = Some(result.player_id);
                lines.push(entry);

                if let Some(cache) = &self.hole_cards
                    && let Ok(mut cache) = cache.lock()
                {
                    cache.insert(body.hand_id, result.player_id, [cards[0], cards[1]]);
                }
            }
            let mut muckers: Vec<_> = body
                .results
                .iter()
                .filter(|r| r.hole_cards.len() != HOLE_CARD_COUNT)
                .collect();
            muckers.sort_by_key(|r| r.seat);
            for result in muckers {
                let name = state.display_name(result.seat as SeatIndex);
                let mut entry = LogEntry::line(
                    EntryCategory::Showdown,
                    provisional_id,
                    at,
                    format!("{name}: mucks hand"),
                );
                entry.street = Some(Street::Showdown);
                entry.seat = Some(result.seat as SeatIndex);
                entry.player = Some(result.player_id);
                lines.push(entry);
            }
        } else if let Some((aggressor, total)) = state.last_aggressor(state.street) {
            // Nobody showed: the hand ended on folds, and the closing wager
            // was only partially matched. Return the unmatched part before
            // the collection line.
            let matched = state.max_wager_by_other(state.street, aggressor);
            let uncalled = total - matched;
            if uncalled > 0 {
                let mut entry = LogEntry::line(
                    EntryCategory::Showdown,
                    provisional_id,
                    at,
                    format!(
                        "Uncalled bet ({uncalled}) returned to {}",
                        state.name_of_player(aggressor)
                    ),
                );
                entry.player = Some(aggressor);
                entry.amount = Some(uncalled);
                lines.push(entry);
            }
        }

        for result in body.results.iter().filter(|r| r.won > 0) {
            let name = state.display_name(result.seat as SeatIndex);
            let mut entry = LogEntry::line(
                EntryCategory::Showdown,
                provisional_id,
                at,
                format!("{name} collected {} from pot", result.won),
            );
            entry.seat = Some(result.seat as SeatIndex);
            entry.player = Some(result.player_id);
            entry.amount = Some(result.won);
            lines.push(entry);
            if !showdown_happened {
                let mut entry = LogEntry::line(
                    EntryCategory::Showdown,
                    provisional_id,
                    at,
                    format!("{name}: doesn't show hand"),
                );
                entry.seat = Some(result.seat as SeatIndex);
                entry.player = Some(result.player_id);
                lines.push(entry);
            }
        }

        lines.push(LogEntry::line(
            EntryCategory::Summary,
            provisional_id,
            at,
            "*** SUMMARY ***".to_string(),
        ));
        lines.push(LogEntry::line(
            EntryCategory::Summary,
            provisional_id,
            at,
            format!("Total pot {} | Rake 0", body.total_pot()),
        ));
        if !state.board.is_empty() {
            lines.push(LogEntry::line(
                EntryCategory::Summary,
                provisional_id,
                at,
                format!("Board [{}]", card_list(&state.board)),
            ));
        }

        for (seat, &player) in state.seat_players.iter().enumerate() {
            if player < 0 {
                continue;
            }
            let mut label = format!("Seat {}: {}", seat + 1, state.display_name(seat));
            if seat == state.button_seat {
                label.push_str(" (button)");
            }
            if seat == state.small_blind_seat {
                label.push_str(" (small blind)");
            }
            if seat == state.big_blind_seat {
                label.push_str(" (big blind)");
            }
            let outcome = if let Some(street) = state.fold_street(player) {
                match street {
                    Street::Preflop => "folded before Flop".to_string(),
                    street => format!("folded on the {street}"),
                }
            } else if let Some((result, cards, rank)) =
                shown.iter().find(|(r, _, _)| r.player_id == player)
            {
                let with = rank.map(|r| format!(" with {}", r.phrase())).unwrap_or_default();
                if result.won > 0 {
                    format!("showed [{}] and won ({}){with}", card_list(cards), result.won)
                } else {
                    format!("showed [{}] and lost{with}", card_list(cards))
                }
            } else if let Some(result) = body.results.iter().find(|r| r.player_id == player) {
                if showdown_happened {
                    "mucked".to_string()
                } else if result.won > 0 {
                    format!("collected ({})", result.won)
                } else {
                    "mucked".to_string()
                }
            } else {
                "mucked".to_string()
            };
            let mut entry = LogEntry::line(
                EntryCategory::Summary,
                provisional_id,
                at,
                format!("{label} {outcome}"),
            );
            entry.seat = Some(seat);
            entry.player = Some(player);
            lines.push(entry);
        }

        // Finalize: every entry of the hand is rewritten in place with the
        // real id, including the header's placeholder substring, and the
        // sink swaps the provisional set for the final one in one call.
        state.entries.extend(lines);
        let provisional_token = format!("#{provisional_id}");
        let final_token = format!("#{}", body.hand_id);
        for entry in &mut state.entries {
            entry.hand_id = body.hand_id;
            if entry.text.contains(&provisional_token) {
                entry.text = entry.text.replace(&provisional_token, &final_token);
            }
        }
        let entries = state.entries;
        self.sink
            .replace_by_hand_id(provisional_id, &entries)
            .map_err(|e| ProcessError {
                stream: "formatter",
                hand: Some(body.hand_id),
                entries: entries.len(),
                kind: ProcessErrorKind::Sink(e),
            })
    }
}

impl<S: HistorySink, D: SeatDirectory> FeedSubscriber for HandHistoryFormatter<S, D> {
    fn name(&self) -> &'static str {
        "formatter"
    }

    fn on_event(&mut self, event: &FeedEvent) -> Result<(), ProcessError> {
        match event {
            FeedEvent::HandDealt { at, body } => self.on_hand_dealt(*at, body),
            FeedEvent::StreetDealt { at, body } => self.on_street_dealt(*at, body),
            FeedEvent::ActionTaken { at, body } => self.on_action_taken(*at, body),
            FeedEvent::HandClosed { at, body } => self.on_hand_closed(*at, body),
            FeedEvent::Unknown { .. } => Ok(()),
        }
    }

    fn on_session_end(&mut self) -> Result<(), ProcessError> {
        if self.state.take().is_some() {
            debug!("session ended mid-hand; removing its incomplete entries");
            return self
                .sink
                .remove_incomplete()
                .map_err(|e| self.sink_error(ProcessErrorKind::Sink(e)));
        }
        Ok(())
    }
}
