//! Patrol sightings map - refresh engine
//!
//! Polls a JSON feed of patrol sightings and keeps a map and a recent-activity
//! list in sync with it:
//! fetch → fingerprint (skip if unchanged) → group by spot → replace markers + list.

pub mod config;
pub mod error;
pub mod feed;
pub mod fingerprint;
pub mod grouping;
pub mod map;
pub mod marker;
pub mod panel;
pub mod pipeline;
pub mod scheduler;
pub mod types;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;
