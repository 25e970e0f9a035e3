//! Map widget seam

use crate::types::{MarkerHandle, MarkerStyle};
use std::collections::HashMap;

/// Operations the core needs from the map widget.
///
/// The widget draws; the core decides what is on it.
pub trait MapView: Send + 'static {
    fn set_view(&mut self, latitude: f64, longitude: f64, zoom: u8);
    fn add_marker(&mut self, latitude: f64, longitude: f64, style: &MarkerStyle) -> MarkerHandle;
    fn remove_marker(&mut self, handle: MarkerHandle);
    /// Fits the viewport around `handles`, growing the box by `padding` on each side.
    fn fit_bounds(&mut self, handles: &[MarkerHandle], padding: f64);
    fn bind_popup(&mut self, handle: MarkerHandle, content: &str);
}

/// Headless map: keeps the marker table in memory and logs every change.
#[derive(Debug, Default)]
pub struct ConsoleMap {
    next_id: u64,
    markers: HashMap<MarkerHandle, (f64, f64)>,
}

impl ConsoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Bounding box `(south, west, north, east)` of `handles`, grown by `padding`.
    fn bounds(&self, handles: &[MarkerHandle], padding: f64) -> Option<(f64, f64, f64, f64)> {
        let mut points = handles.iter().filter_map(|h| self.markers.get(h));
        let &(lat, lon) = points.next()?;
        let (mut south, mut west, mut north, mut east) = (lat, lon, lat, lon);
        for &(lat, lon) in points {
            south = south.min(lat);
            north = north.max(lat);
            west = west.min(lon);
            east = east.max(lon);
        }
        let dlat = (north - south) * padding;
        let dlon = (east - west) * padding;
        Some((south - dlat, west - dlon, north + dlat, east + dlon))
    }
}

impl MapView for ConsoleMap {
    fn set_view(&mut self, latitude: f64, longitude: f64, zoom: u8) {
        tracing::info!(latitude, longitude, zoom, "map view set");
    }

    fn add_marker(&mut self, latitude: f64, longitude: f64, style: &MarkerStyle) -> MarkerHandle {
        self.next_id += 1;
        let handle = MarkerHandle(self.next_id);
        self.markers.insert(handle, (latitude, longitude));
        tracing::debug!(
            id = handle.0,
            latitude,
            longitude,
            color = style.kind.color(),
            radius = style.radius,
            "marker added"
        );
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        if self.markers.remove(&handle).is_none() {
            tracing::warn!(id = handle.0, "removing unknown marker");
        }
    }

    fn fit_bounds(&mut self, handles: &[MarkerHandle], padding: f64) {
        if let Some((south, west, north, east)) = self.bounds(handles, padding) {
            tracing::info!(south, west, north, east, "viewport fitted");
        }
    }

    fn bind_popup(&mut self, handle: MarkerHandle, content: &str) {
        tracing::trace!(id = handle.0, content, "popup bound");
    }
}
