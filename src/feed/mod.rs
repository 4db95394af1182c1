//! Vendor feed handling - tagged raw events, per-tag schema validation, and
//! the fan-out point that drives the two downstream state machines.

pub mod dispatch;
pub mod errors;
pub mod events;
pub mod schema;

pub use dispatch::{FeedDispatcher, FeedSubscriber};
pub use errors::{ProcessError, ProcessErrorKind, SchemaError};
pub use events::{FeedEvent, RawEvent};
pub use schema::SchemaGuard;
