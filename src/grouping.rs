//! Grouping of records by rounded coordinate

use crate::types::{MarkerGroup, Record};
use std::collections::HashMap;

/// Decimal places kept in a bucket key (about 0.1 m).
pub const KEY_PRECISION: usize = 6;

/// Bucket key of a coordinate. Exact match only, no proximity clustering.
pub fn bucket_key(latitude: f64, longitude: f64) -> String {
    format!(
        "{:.prec$},{:.prec$}",
        snap(latitude),
        snap(longitude),
        prec = KEY_PRECISION
    )
}

/// Rounds to the key precision. `+ 0.0` turns a rounded `-0.0` into `0.0`.
fn snap(value: f64) -> f64 {
    let scale = 10f64.powi(KEY_PRECISION as i32);
    (value * scale).round() / scale + 0.0
}

/// Partitions `records` into marker groups.
///
/// Groups come out in the order their key is first seen; members keep feed
/// order. Every record lands in exactly one group.
pub fn group(records: &[Record]) -> Vec<MarkerGroup> {
    let mut groups: Vec<MarkerGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::with_capacity(records.len());

    for record in records {
        let key = bucket_key(record.latitude, record.longitude);
        match index.get(&key) {
            Some(&i) => groups[i].push(record.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(MarkerGroup::new(key, record.clone()));
            }
        }
    }

    groups
}
