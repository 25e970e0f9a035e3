//! Recent-activity list

use crate::types::Record;

/// Default length of the recent-activity list.
pub const RECENT_LIMIT: usize = 10;

/// The `n` newest records, newest first. Equal timestamps keep feed order.
pub fn top_recent(records: &[Record], n: usize) -> Vec<Record> {
    let mut sorted: Vec<&Record> = records.iter().collect();
    // sort_by is stable
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted.into_iter().take(n).cloned().collect()
}
