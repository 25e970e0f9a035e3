//! Marker reconciliation against the map widget

use crate::map::MapView;
use crate::types::{MarkerGroup, MarkerHandle, MarkerKind, MarkerStyle};

/// Padding applied around the markers when fitting the viewport.
pub const FIT_PADDING: f64 = 0.1;

const BASE_RADIUS: f64 = 8.0;
const RADIUS_PER_LOG: f64 = 4.0;
const MAX_RADIUS: f64 = 24.0;

/// Owns the markers currently on the map.
///
/// Every call to [`MarkerReconciler::reconcile`] replaces the whole set: old
/// markers go first, then new ones are added. No keyed diffing, so nothing
/// can be orphaned or drawn twice.
#[derive(Debug, Default)]
pub struct MarkerReconciler {
    live: Vec<MarkerHandle>,
}

impl MarkerReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers placed by the last reconcile.
    pub fn live(&self) -> &[MarkerHandle] {
        &self.live
    }

    /// Replaces the markers on `map` with one marker per group.
    ///
    /// # Arguments
    /// * `map` - widget receiving the changes
    /// * `groups` - this cycle's groups
    ///
    /// # Returns
    /// Handles of the markers now on the map, in group order.
    pub fn reconcile(&mut self, map: &mut dyn MapView, groups: &[MarkerGroup]) -> &[MarkerHandle] {
        for handle in self.live.drain(..) {
            map.remove_marker(handle);
        }

        for group in groups {
            let at = group.representative();
            let handle = map.add_marker(at.latitude, at.longitude, &marker_style(group.count()));
            map.bind_popup(handle, &popup_content(group));
            self.live.push(handle);
        }

        if !self.live.is_empty() {
            map.fit_bounds(&self.live, FIT_PADDING);
        }

        &self.live
    }
}

/// Style for a group of `count` reports.
///
/// Radius grows with `ln(count)` and stops at a ceiling, so a busy corner is
/// visibly bigger without covering the map.
pub fn marker_style(count: usize) -> MarkerStyle {
    let count = count.max(1);
    let radius = (BASE_RADIUS + RADIUS_PER_LOG * (count as f64).ln()).min(MAX_RADIUS);
    if count == 1 {
        MarkerStyle {
            kind: MarkerKind::Single,
            radius,
            label: String::new(),
        }
    } else {
        MarkerStyle {
            kind: MarkerKind::Cluster,
            radius,
            label: count.to_string(),
        }
    }
}

/// Plain-text popup for a group.
pub fn popup_content(group: &MarkerGroup) -> String {
    let first = group.representative();
    let mut lines = vec![format!("Patrol reported by {}", first.username)];
    if let Some(comment) = first.comment.as_deref().filter(|c| !c.is_empty()) {
        lines.push(comment.to_string());
    }
    lines.push(format!("Time: {}", first.date));

    if group.count() > 1 {
        let latest = group.most_recent();
        lines.push(format!("Reports here: {}", group.count()));
        lines.push(format!("Latest: {} by {}", latest.date, latest.username));
    }
    lines.join("\n")
}
