//! Feed client (network side of a fetch cycle)

use crate::error::{ClientError, FetchError};
use crate::types::Record;
use futures_util::future::{BoxFuture, FutureExt};
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

/// Query parameter carrying the cache-bust value.
pub const CACHE_BUST_PARAM: &str = "t";

/// Anything that can produce one batch of records.
///
/// The returned future owns everything it needs so the scheduler can keep it
/// across loop iterations.
pub trait FeedSource: Send + Sync + 'static {
    fn fetch(&self, force_refresh: bool) -> BoxFuture<'static, Result<Vec<Record>, FetchError>>;
}

/// HTTP client for the sightings feed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base: Url,
    timeout: Duration,
    cache_slot: Duration,
}

impl FeedClient {
    /// Builds the client.
    ///
    /// # Arguments
    /// * `feed_url` - fixed feed location
    /// * `timeout` - upper bound for one request, connect included
    /// * `cache_slot` - width of the time slot shared by non-forced requests
    pub fn new(feed_url: &str, timeout: Duration, cache_slot: Duration) -> Result<Self, ClientError> {
        let base = Url::parse(feed_url).map_err(|e| ClientError::InvalidUrl {
            url: feed_url.to_string(),
            reason: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base,
            timeout,
            cache_slot,
        })
    }

    /// Feed URL for a request issued at `now_ms`.
    pub fn request_url(&self, force_refresh: bool, now_ms: u64) -> Url {
        let mut url = self.base.clone();
        let bust = cache_buster(force_refresh, now_ms, self.cache_slot);
        url.query_pairs_mut()
            .append_pair(CACHE_BUST_PARAM, &bust.to_string());
        url
    }

    async fn get(http: reqwest::Client, url: Url, timeout: Duration) -> Result<Vec<Record>, FetchError> {
        let request_error = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout(timeout)
            } else {
                FetchError::Request(e)
            }
        };
        let response = http.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body = response.text().await.map_err(request_error)?;
        parse_feed(&body)
    }
}

impl FeedSource for FeedClient {
    fn fetch(&self, force_refresh: bool) -> BoxFuture<'static, Result<Vec<Record>, FetchError>> {
        let url = self.request_url(force_refresh, now_millis());
        tracing::debug!(%url, force_refresh, "fetching feed");
        Self::get(self.http.clone(), url, self.timeout).boxed()
    }
}

/// Cache-bust value for a request.
///
/// Forced requests use the current millisecond so every one is distinct.
/// Other requests are floored to the start of their slot, so calls landing in the
/// same slot hit the same URL and may be served from a shared cache.
pub fn cache_buster(force_refresh: bool, now_ms: u64, slot: Duration) -> u64 {
    if force_refresh {
        return now_ms;
    }
    let slot_ms = (slot.as_millis() as u64).max(1);
    now_ms - now_ms % slot_ms
}

/// Decodes a feed body.
///
/// A JSON array is the current format. An object is the older
/// `{"locations": [...]}` envelope, whose records use `lat`/`lon`/`time` and
/// may lack a timestamp.
pub fn parse_feed(body: &str) -> Result<Vec<Record>, FetchError> {
    if body.trim_start().starts_with('{') {
        let envelope: Envelope = serde_json::from_str(body)?;
        return Ok(envelope.locations.into_iter().map(Record::from).collect());
    }
    Ok(serde_json::from_str(body)?)
}

#[derive(Deserialize)]
struct Envelope {
    locations: Vec<LegacyRecord>,
}

#[derive(Deserialize)]
struct LegacyRecord {
    lat: f64,
    lon: f64,
    username: String,
    #[serde(default)]
    comment: Option<String>,
    time: String,
    #[serde(default)]
    timestamp: i64,
}

impl From<LegacyRecord> for Record {
    fn from(legacy: LegacyRecord) -> Self {
        Record {
            latitude: legacy.lat,
            longitude: legacy.lon,
            username: legacy.username,
            date: legacy.time,
            timestamp: legacy.timestamp,
            comment: legacy.comment,
        }
    }
}

fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
