//! Configuration via environment variables

use crate::error::ConfigError;
use crate::panel::RECENT_LIMIT;
use std::str::FromStr;
use std::time::Duration;

/// Runtime settings. Every field has a default; the environment only overrides.
#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    pub poll_interval: Duration,
    pub auto_refresh: bool,
    pub fetch_timeout: Duration,
    /// Width of the cache-bust slot used by non-forced fetches.
    pub cache_slot: Duration,
    pub recent_limit: usize,
    pub map_center: (f64, f64),
    pub map_zoom: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: "http://127.0.0.1:8080/api/dps-data".to_string(),
            poll_interval: Duration::from_secs(30),
            auto_refresh: true,
            fetch_timeout: Duration::from_secs(10),
            cache_slot: Duration::from_secs(30),
            recent_limit: RECENT_LIMIT,
            map_center: (55.7558, 37.6173),
            map_zoom: 12,
        }
    }
}

impl Config {
    /// Reads the process environment.
    ///
    /// # Errors
    /// `ConfigError::Invalid` when a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("FEED_URL") {
            config.feed_url = url;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(positive("POLL_INTERVAL_MS", ms)?);
        }
        if let Some(value) = lookup("AUTO_REFRESH") {
            config.auto_refresh = match value.as_str() {
                "1" | "true" | "on" => true,
                "0" | "false" | "off" => false,
                _ => return Err(invalid("AUTO_REFRESH", value, "expected 1 or 0")),
            };
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "FETCH_TIMEOUT_MS")? {
            config.fetch_timeout = Duration::from_millis(positive("FETCH_TIMEOUT_MS", ms)?);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "CACHE_SLOT_MS")? {
            config.cache_slot = Duration::from_millis(positive("CACHE_SLOT_MS", ms)?);
        }
        if let Some(limit) = parse_var::<usize>(&lookup, "RECENT_LIMIT")? {
            config.recent_limit = limit;
        }
        if let Some(value) = lookup("MAP_CENTER") {
            config.map_center = parse_center(&value)
                .ok_or_else(|| invalid("MAP_CENTER", value, "expected <lat>,<lon>"))?;
        }
        if let Some(zoom) = parse_var::<u8>(&lookup, "MAP_ZOOM")? {
            config.map_zoom = zoom;
        }

        Ok(config)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                let reason = e.to_string();
                Err(invalid(var, value, reason))
            }
        },
    }
}

fn positive(var: &'static str, ms: u64) -> Result<u64, ConfigError> {
    if ms == 0 {
        return Err(invalid(var, ms.to_string(), "must be greater than zero"));
    }
    Ok(ms)
}

fn parse_center(value: &str) -> Option<(f64, f64)> {
    let (lat, lon) = value.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    (lat.is_finite() && lon.is_finite()).then_some((lat, lon))
}

fn invalid(var: &'static str, value: String, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        value,
        reason: reason.into(),
    }
}
