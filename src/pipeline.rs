//! Render side of a fetch cycle: change detection, grouping, markers, panel

use crate::error::FetchError;
use crate::fingerprint::{fingerprint, should_render};
use crate::grouping::group;
use crate::map::MapView;
use crate::marker::MarkerReconciler;
use crate::panel::top_recent;
use crate::types::Record;
use crate::ui::{Dashboard, Status};

/// What a cycle did with its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Rendered { markers: usize },
    Unchanged,
}

/// All state touched by the render side, owned in one place.
///
/// Only the scheduler task holds it, so the marker set and the last
/// fingerprint never change concurrently.
pub struct RefreshPipeline<M: MapView, D: Dashboard> {
    map: M,
    dashboard: D,
    reconciler: MarkerReconciler,
    fingerprint: Option<String>,
    recent_limit: usize,
}

impl<M: MapView, D: Dashboard> RefreshPipeline<M, D> {
    pub fn new(map: M, dashboard: D, recent_limit: usize) -> Self {
        Self {
            map,
            dashboard,
            reconciler: MarkerReconciler::new(),
            fingerprint: None,
            recent_limit,
        }
    }

    pub fn init_view(&mut self, latitude: f64, longitude: f64, zoom: u8) {
        self.map.set_view(latitude, longitude, zoom);
    }

    /// Applies one successful fetch.
    ///
    /// Markers and the recent list are only touched when the fingerprint moved
    /// or the cycle is forced. The status line is refreshed either way.
    pub fn apply(&mut self, records: &[Record], forced: bool, now_secs: u64) -> Applied {
        let next = fingerprint(records);
        if !should_render(&next, self.fingerprint.as_deref(), forced) {
            tracing::debug!(fingerprint = %next, "feed unchanged, render skipped");
            self.show_updated(records.len(), now_secs);
            return Applied::Unchanged;
        }

        let groups = group(records);
        let markers = self.reconciler.reconcile(&mut self.map, &groups).len();
        self.dashboard
            .show_recent(&top_recent(records, self.recent_limit));
        self.show_updated(records.len(), now_secs);

        tracing::info!(
            sightings = records.len(),
            markers,
            forced,
            fingerprint = %next,
            "map refreshed"
        );
        self.fingerprint = Some(next);
        Applied::Rendered { markers }
    }

    /// A manual cycle has started.
    pub fn loading(&mut self) {
        self.dashboard.show_status(&Status::Loading);
    }

    /// A manual cycle failed; tell the user once.
    pub fn failed(&mut self, error: &FetchError) {
        self.dashboard.show_status(&Status::Failed);
        self.dashboard
            .notify(&format!("Could not refresh: {}", error.cause()));
    }

    pub fn auto_refresh_changed(&mut self, enabled: bool) {
        self.dashboard.show_auto_refresh(enabled);
    }

    fn show_updated(&mut self, sightings: usize, at: u64) {
        let status = Status::Updated {
            sightings,
            markers: self.reconciler.live().len(),
            at,
        };
        self.dashboard.show_status(&status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record_at, MapCall, RecordingDashboard, RecordingMap};

    fn pipeline() -> (
        RefreshPipeline<RecordingMap, RecordingDashboard>,
        RecordingMap,
        RecordingDashboard,
    ) {
        let map = RecordingMap::default();
        let dashboard = RecordingDashboard::default();
        (
            RefreshPipeline::new(map.clone(), dashboard.clone(), 10),
            map,
            dashboard,
        )
    }

    #[test]
    fn test_empty_feed_clears_everything() {
        let (mut pipeline, map, dashboard) = pipeline();
        pipeline.apply(&[record_at(1.0, 1.0, 1), record_at(2.0, 2.0, 2)], false, 0);
        map.clear_calls();

        let applied = pipeline.apply(&[], false, 60);
        assert_eq!(applied, Applied::Rendered { markers: 0 });
        assert_eq!(map.live_count(), 0);
        assert_eq!(map.fit_count(), 0);
        assert!(!map.calls().iter().any(|c| matches!(c, MapCall::SetView(..))));
        assert_eq!(dashboard.log().recent.last(), Some(&Vec::new()));
    }

    #[test]
    fn test_single_sighting() {
        let (mut pipeline, map, dashboard) = pipeline();
        let mut record = record_at(55.7558, 37.6173, 1000);
        record.username = "u1".to_string();

        assert_eq!(
            pipeline.apply(&[record.clone()], false, 0),
            Applied::Rendered { markers: 1 }
        );
        assert_eq!(map.live_count(), 1);
        assert_eq!(dashboard.log().recent, vec![vec![record]]);
    }

    #[test]
    fn test_unchanged_feed_skips_render() {
        let (mut pipeline, map, dashboard) = pipeline();
        let records = vec![record_at(1.0, 1.0, 1), record_at(1.0, 1.0, 2)];

        assert_eq!(
            pipeline.apply(&records, false, 0),
            Applied::Rendered { markers: 1 }
        );
        map.clear_calls();
        assert_eq!(pipeline.apply(&records, false, 30), Applied::Unchanged);

        assert!(map.calls().is_empty());
        let log = dashboard.log();
        assert_eq!(log.recent.len(), 1);
        assert_eq!(log.statuses.len(), 2);
        assert_eq!(
            log.statuses[1],
            Status::Updated {
                sightings: 2,
                markers: 1,
                at: 30
            }
        );
    }

    #[test]
    fn test_forced_renders_anyway() {
        let (mut pipeline, _map, dashboard) = pipeline();
        let records = vec![record_at(1.0, 1.0, 1)];
        pipeline.apply(&records, false, 0);
        assert_eq!(
            pipeline.apply(&records, true, 1),
            Applied::Rendered { markers: 1 }
        );
        assert_eq!(dashboard.log().recent.len(), 2);
    }

    #[test]
    fn test_first_empty_feed_still_renders() {
        let (mut pipeline, _map, dashboard) = pipeline();
        assert_eq!(pipeline.apply(&[], false, 0), Applied::Rendered { markers: 0 });
        assert_eq!(pipeline.apply(&[], false, 1), Applied::Unchanged);
        assert_eq!(dashboard.log().recent.len(), 1);
    }

    #[test]
    fn test_failure_notifies() {
        let (mut pipeline, _map, dashboard) = pipeline();
        pipeline.failed(&FetchError::Status(reqwest::StatusCode::BAD_GATEWAY));
        let log = dashboard.log();
        assert_eq!(log.statuses, vec![Status::Failed]);
        assert_eq!(log.notices.len(), 1);
        assert!(log.notices[0].contains("502"));
    }
}
