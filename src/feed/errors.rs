use thiserror::Error;

use crate::poker::HandId;

/// A single event failed shape validation for its tag. The event is
/// dropped and the stream continues; nothing downstream saw it.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("tag {tag:#06x} v{version} is newer than supported v{supported}")]
    UnsupportedVersion {
        tag: u16,
        version: u16,
        supported: u16,
    },
    #[error("tag {tag:#06x} body does not match its shape: {source}")]
    Malformed {
        tag: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("tag {tag:#06x} rejected: {reason}")]
    Invalid { tag: u16, reason: String },
}

impl SchemaError {
    pub(crate) fn invalid(tag: u16, reason: impl Into<String>) -> Self {
        Self::Invalid {
            tag,
            reason: reason.into(),
        }
    }
}

/// An unexpected internal failure while one subscriber applied one event.
///
/// Fatal for that event only: there is no retry, since re-delivering against
/// already-mutated state would corrupt it. The caller decides skip-vs-abort.
#[derive(Debug, Error)]
#[error("{stream} failed mid-event (hand {hand:?}, {entries} entries accumulated): {kind}")]
pub struct ProcessError {
    /// Which state machine failed ("aggregator" or "formatter").
    pub stream: &'static str,
    /// The hand being accumulated when the failure hit, if any.
    pub hand: Option<HandId>,
    /// How many actions/entries had been accumulated for context.
    pub entries: usize,
    #[source]
    pub kind: ProcessErrorKind,
}

#[derive(Debug, Error)]
pub enum ProcessErrorKind {
    #[error("seat {seat} resolves to no player")]
    UnresolvedSeat { seat: usize },
    #[error("player {player} has no table position")]
    UnpositionedPlayer { player: i64 },
    #[error("no open street to attach the action to")]
    NoOpenStreet,
    #[error("sink failure: {0}")]
    Sink(#[from] anyhow::Error),
}
