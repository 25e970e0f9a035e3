//! Data types shared by the refresh pipeline

use serde::Deserialize;

/// One reported sighting, as delivered by the feed.
///
/// Records are plain values: the feed is their only source and nothing assigns
/// them a local id. `date` is a display string and is not checked against
/// `timestamp`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    pub latitude: f64,
    pub longitude: f64,
    pub username: String,
    pub date: String,
    pub timestamp: i64,
    /// Free-text note left by the reporter.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Records sharing one rounded coordinate, drawn as a single marker.
///
/// Built only by [`crate::grouping::group`]. A group starts with one member and
/// can only grow, so it is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerGroup {
    key: String,
    members: Vec<Record>,
}

impl MarkerGroup {
    pub(crate) fn new(key: String, first: Record) -> Self {
        Self {
            key,
            members: vec![first],
        }
    }

    pub(crate) fn push(&mut self, record: Record) {
        self.members.push(record);
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// All members, in feed order.
    pub fn members(&self) -> &[Record] {
        &self.members
    }

    /// First member in feed order; used for placement and the popup baseline.
    pub fn representative(&self) -> &Record {
        &self.members[0]
    }

    /// Member with the largest timestamp. The earliest one wins a tie.
    pub fn most_recent(&self) -> &Record {
        let mut best = &self.members[0];
        for record in &self.members[1..] {
            if record.timestamp > best.timestamp {
                best = record;
            }
        }
        best
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }
}

/// Opaque id of a marker living on the map collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

/// Single report vs. several reports at the same spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Single,
    Cluster,
}

impl MarkerKind {
    pub fn color(self) -> &'static str {
        match self {
            MarkerKind::Single => "#1e88e5",
            MarkerKind::Cluster => "#e53935",
        }
    }
}

/// How a marker is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub kind: MarkerKind,
    pub radius: f64,
    /// Badge text; empty for single reports.
    pub label: String,
}
