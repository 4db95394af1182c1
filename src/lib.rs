//! # Hand Tracker
//!
//! The analytic core of a poker-client overlay. It consumes the vendor's
//! live sequence of tagged protocol events describing a match and turns it
//! into three things:
//!
//! - normalized `(Hand, Action[], Phase[])` records for statistics,
//! - a byte-exact third-party-style hand-history text log,
//! - and the hand-strength evaluator both depend on.
//!
//! ## Architecture
//!
//! Events flow through a per-tag schema guard and fan out to two
//! independent state machines with disjoint mutable state:
//!
//! - [`tracker::HandAggregator`] accumulates one hand at a time and pushes
//!   a completed record to a [`tracker::HandSink`] when the hand closes
//!   validly; incomplete hands are discarded without output.
//! - [`history::HandHistoryFormatter`] writes hand-history text lines
//!   incrementally to a [`history::HistorySink`], rewriting them in place
//!   once the real hand id is known.
//!
//! Everything is single-threaded, push-based, and synchronous per event;
//! the caller drives one event at a time in arrival order. Transport
//! decoding, rendering, and persistence live outside this crate.
//!
//! ## Example
//!
//! ```no_run
//! use hand_tracker::feed::{FeedDispatcher, RawEvent};
//!
//! let mut dispatcher = FeedDispatcher::new();
//! // dispatcher.subscribe(...aggregator...);
//! // dispatcher.subscribe(...formatter...);
//! # let decoded_events: Vec<RawEvent> = vec![];
//! for event in &decoded_events {
//!     for error in dispatcher.push(event) {
//!         log::error!("event processing failed: {error}");
//!     }
//! }
//! ```

/// Feed handling - tagged events, schema validation, fan-out.
pub mod feed;
pub use feed::{FeedDispatcher, FeedSubscriber, ProcessError, RawEvent, SchemaGuard};

/// Poker domain primitives and the hand evaluator.
pub mod poker;
pub use poker::{Card, HandCategory, HandRank, Street, evaluate};

/// Collaborator surfaces: session descriptor, seat directory, hole-card
/// cache.
pub mod session;
pub use session::{HoleCardCache, SeatDirectory, SessionDescriptor, SessionKind};

/// Normalized hand records and the aggregation state machine.
pub mod tracker;
pub use tracker::{Action, Hand, HandAggregator, HandSink, Phase};

/// Hand-history text production.
pub mod history;
pub use history::{HandHistoryFormatter, HistorySink, LogEntry};
