//! Fan-out from the validated event stream to its consumers.
//!
//! The aggregator and the hand-history formatter are two independent
//! subscribers with disjoint state behind one dispatch point; a failure or
//! reset in one can never corrupt the other. Dispatch is synchronous and
//! strictly in arrival order - the dispatcher never reorders or buffers
//! beyond the event it was handed.

use log::{debug, error, warn};

use super::errors::ProcessError;
use super::events::{FeedEvent, RawEvent};
use super::schema::SchemaGuard;

/// A consumer of validated feed events.
pub trait FeedSubscriber {
    /// Stable name used in logs and error context.
    fn name(&self) -> &'static str;

    /// Apply one validated event. An error is fatal for this event only.
    fn on_event(&mut self, event: &FeedEvent) -> Result<(), ProcessError>;

    /// The session ended; any in-progress hand is incomplete and must be
    /// discarded without output.
    fn on_session_end(&mut self) -> Result<(), ProcessError>;
}

/// Guards and fans out raw events, one at a time, in arrival order.
pub struct FeedDispatcher {
    guard: SchemaGuard,
    subscribers: Vec<Box<dyn FeedSubscriber>>,
}

impl Default for FeedDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            guard: SchemaGuard::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn FeedSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Push one raw event through the guard and on to every subscriber.
    ///
    /// Schema rejections and unknown tags are skippable inputs and return an
    /// empty error list. Subscriber failures are collected per event so one
    /// subscriber's failure never starves the other of the event; the caller
    /// decides skip-vs-abort.
    pub fn push(&mut self, raw: &RawEvent) -> Vec<ProcessError> {
        let event = match self.guard.decode(raw) {
            Ok(FeedEvent::Unknown { tag }) => {
                debug!("skipping unknown event tag {tag:#06x}");
                return Vec::new();
            }
            Ok(event) => event,
            Err(err) => {
                warn!("dropping event: {err}");
                return Vec::new();
            }
        };
        self.subscribers
            .iter_mut()
            .filter_map(|subscriber| match subscriber.on_event(&event) {
                Ok(()) => None,
                Err(err) => {
                    error!("{} subscriber failed: {err}", subscriber.name());
                    Some(err)
                }
            })
            .collect()
    }

    /// Signal end-of-session to every subscriber.
    pub fn end_session(&mut self) -> Vec<ProcessError> {
        self.subscribers
            .iter_mut()
            .filter_map(|subscriber| match subscriber.on_session_end() {
                Ok(()) => None,
                Err(err) => {
                    error!("{} failed at session end: {err}", subscriber.name());
                    Some(err)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::events::tags;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    struct CountingSubscriber {
        seen: Arc<Mutex<usize>>,
        ended: Arc<Mutex<usize>>,
    }

    impl FeedSubscriber for CountingSubscriber {
        fn name(&self) -> &'static str {
            "counter"
        }

        fn on_event(&mut self, _event: &FeedEvent) -> Result<(), ProcessError> {
            *self.seen.lock().unwrap() += 1;
            Ok(())
        }

        fn on_session_end(&mut self) -> Result<(), ProcessError> {
            *self.ended.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn test_valid_events_reach_all_subscribers() {
        let seen_a = Arc::new(Mutex::new(0));
        let seen_b = Arc::new(Mutex::new(0));
        let ended = Arc::new(Mutex::new(0));
        let mut dispatcher = FeedDispatcher::new();
        dispatcher.subscribe(Box::new(CountingSubscriber {
            seen: Arc::clone(&seen_a),
            ended: Arc::clone(&ended),
        }));
        dispatcher.subscribe(Box::new(CountingSubscriber {
            seen: Arc::clone(&seen_b),
            ended: Arc::clone(&ended),
        }));

        let raw = RawEvent {
            tag: tags::ACTION_TAKEN,
            version: 1,
            received_at: Utc::now(),
            body: json!({"seat": 0, "kind": 0, "amount": 0, "pot": 150, "street": 0}),
        };
        let errors = dispatcher.push(&raw);
        assert!(errors.is_empty());
        assert_eq!(*seen_a.lock().unwrap(), 1);
        assert_eq!(*seen_b.lock().unwrap(), 1);

        dispatcher.end_session();
        assert_eq!(*ended.lock().unwrap(), 2);
    }

    #[test]
    fn test_rejected_event_is_skipped_not_fatal() {
        let seen = Arc::new(Mutex::new(0));
        let ended = Arc::new(Mutex::new(0));
        let mut dispatcher = FeedDispatcher::new();
        dispatcher.subscribe(Box::new(CountingSubscriber {
            seen: Arc::clone(&seen),
            ended: Arc::clone(&ended),
        }));

        let malformed = RawEvent {
            tag: tags::ACTION_TAKEN,
            version: 1,
            received_at: Utc::now(),
            body: json!({"seat": 0}),
        };
        assert!(dispatcher.push(&malformed).is_empty());
        assert_eq!(*seen.lock().unwrap(), 0);

        let unknown = RawEvent {
            tag: 0x0777,
            version: 1,
            received_at: Utc::now(),
            body: json!({}),
        };
        assert!(dispatcher.push(&unknown).is_empty());
        assert_eq!(*seen.lock().unwrap(), 0);
    }
}
