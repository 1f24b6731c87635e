//! Creation timestamps on records.

use crate::types::{Record, Timestamp};

/// Set `column` on `record` to the current local time, overwriting any old value.
///
/// Mutates the caller's record in place. Returns the timestamp written.
pub fn stamp(record: &mut Record, column: &str) -> Timestamp {
    stamp_at(record, column, Timestamp::now())
}

/// Like [`stamp`] with an explicit time.
pub fn stamp_at(record: &mut Record, column: &str, ts: Timestamp) -> Timestamp {
    record.insert(column, ts.to_string());
    tracing::debug!(column, %ts, "timestamped");
    ts
}
