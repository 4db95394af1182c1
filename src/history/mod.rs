//! Hand-history text production: structured log entries, the text-log sink
//! contract, and the formatter state machine that drives them.

pub mod entries;
pub mod formatter;

pub use entries::{EntryCategory, EntryKind, HistorySink, LogEntry};
pub use formatter::HandHistoryFormatter;
