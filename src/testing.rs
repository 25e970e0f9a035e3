//! Fakes shared by the unit tests

use crate::error::FetchError;
use crate::feed::FeedSource;
use crate::map::MapView;
use crate::types::{MarkerHandle, MarkerStyle, Record};
use crate::ui::{Dashboard, Status};
use futures_util::future::{BoxFuture, FutureExt};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn record_at(latitude: f64, longitude: f64, timestamp: i64) -> Record {
    Record {
        latitude,
        longitude,
        username: format!("u{}", timestamp),
        date: "12:00".to_string(),
        timestamp,
        comment: None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapCall {
    SetView(f64, f64, u8),
    Add {
        handle: MarkerHandle,
        latitude: f64,
        longitude: f64,
        style: MarkerStyle,
    },
    Remove(MarkerHandle),
    Fit(Vec<MarkerHandle>, f64),
    Popup(MarkerHandle, String),
}

#[derive(Debug, Default)]
struct MapLog {
    next_id: u64,
    live: HashSet<MarkerHandle>,
    calls: Vec<MapCall>,
}

/// Map that records every call. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingMap {
    log: Arc<Mutex<MapLog>>,
}

impl RecordingMap {
    pub fn calls(&self) -> Vec<MapCall> {
        self.log.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.log.lock().unwrap().calls.clear();
    }

    pub fn live_count(&self) -> usize {
        self.log.lock().unwrap().live.len()
    }

    pub fn fit_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MapCall::Fit(..)))
            .count()
    }
}

impl MapView for RecordingMap {
    fn set_view(&mut self, latitude: f64, longitude: f64, zoom: u8) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(MapCall::SetView(latitude, longitude, zoom));
    }

    fn add_marker(&mut self, latitude: f64, longitude: f64, style: &MarkerStyle) -> MarkerHandle {
        let mut log = self.log.lock().unwrap();
        log.next_id += 1;
        let handle = MarkerHandle(log.next_id);
        log.live.insert(handle);
        log.calls.push(MapCall::Add {
            handle,
            latitude,
            longitude,
            style: style.clone(),
        });
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        let mut log = self.log.lock().unwrap();
        assert!(log.live.remove(&handle), "removed unknown marker {:?}", handle);
        log.calls.push(MapCall::Remove(handle));
    }

    fn fit_bounds(&mut self, handles: &[MarkerHandle], padding: f64) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(MapCall::Fit(handles.to_vec(), padding));
    }

    fn bind_popup(&mut self, handle: MarkerHandle, content: &str) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(MapCall::Popup(handle, content.to_string()));
    }
}

#[derive(Debug, Default, Clone)]
pub struct DashboardLog {
    pub statuses: Vec<Status>,
    pub recent: Vec<Vec<Record>>,
    pub auto_refresh: Vec<bool>,
    pub notices: Vec<String>,
}

/// Dashboard that records every push. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingDashboard {
    log: Arc<Mutex<DashboardLog>>,
}

impl RecordingDashboard {
    pub fn log(&self) -> DashboardLog {
        self.log.lock().unwrap().clone()
    }
}

impl Dashboard for RecordingDashboard {
    fn show_status(&mut self, status: &Status) {
        self.log.lock().unwrap().statuses.push(status.clone());
    }

    fn show_recent(&mut self, records: &[Record]) {
        self.log.lock().unwrap().recent.push(records.to_vec());
    }

    fn show_auto_refresh(&mut self, enabled: bool) {
        self.log.lock().unwrap().auto_refresh.push(enabled);
    }

    fn notify(&mut self, message: &str) {
        self.log.lock().unwrap().notices.push(message.to_string());
    }
}

/// Canned feed answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Records(Vec<Record>),
    Status(u16),
}

impl Reply {
    fn into_result(self) -> Result<Vec<Record>, FetchError> {
        match self {
            Reply::Records(records) => Ok(records),
            Reply::Status(code) => Err(FetchError::Status(
                reqwest::StatusCode::from_u16(code).unwrap(),
            )),
        }
    }
}

#[derive(Debug)]
struct Script {
    replies: VecDeque<(Duration, Reply)>,
    fallback: (Duration, Reply),
    calls: Vec<bool>,
}

/// Feed answering from a script, each answer after its own delay.
/// When the script runs out the fallback answer repeats.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSource {
    pub fn new(fallback: Reply) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                replies: VecDeque::new(),
                fallback: (Duration::ZERO, fallback),
                calls: Vec::new(),
            })),
        }
    }

    pub fn then(self, delay: Duration, reply: Reply) -> Self {
        self.script.lock().unwrap().replies.push_back((delay, reply));
        self
    }

    /// `force_refresh` flag of every fetch so far.
    pub fn calls(&self) -> Vec<bool> {
        self.script.lock().unwrap().calls.clone()
    }
}

impl FeedSource for ScriptedSource {
    fn fetch(&self, force_refresh: bool) -> BoxFuture<'static, Result<Vec<Record>, FetchError>> {
        let (delay, reply) = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(force_refresh);
            match script.replies.pop_front() {
                Some(next) => next,
                None => script.fallback.clone(),
            }
        };
        async move {
            tokio::time::sleep(delay).await;
            reply.into_result()
        }
        .boxed()
    }
}
