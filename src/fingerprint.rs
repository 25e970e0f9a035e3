//! Change detection between fetch cycles

use crate::types::Record;

/// Fingerprint of an empty record set.
pub const EMPTY_FINGERPRINT: &str = "empty";

/// Cheap summary of a record set: last timestamp plus record count.
///
/// Lossy on purpose. Two sets with the same length and the same tail
/// timestamp compare equal even if everything else differs; comparison stays
/// O(1) no matter how large the feed gets.
pub fn fingerprint(records: &[Record]) -> String {
    match records.last() {
        None => EMPTY_FINGERPRINT.to_string(),
        Some(last) => format!("{}:{}", last.timestamp, records.len()),
    }
}

/// Whether a freshly fetched set has to be rendered.
///
/// `previous` is `None` before the first render.
pub fn should_render(new: &str, previous: Option<&str>, forced: bool) -> bool {
    forced || previous != Some(new)
}
