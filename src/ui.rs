//! Dashboard sinks (status line, recent list, notifications)

use crate::types::Record;
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::io::Write;

/// Status line contents.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Loading,
    Updated {
        sightings: usize,
        markers: usize,
        /// Seconds since the Unix epoch.
        at: u64,
    },
    Failed,
}

/// One-way pushes from the core to whatever shows the dashboard.
pub trait Dashboard: Send + 'static {
    fn show_status(&mut self, status: &Status);
    fn show_recent(&mut self, records: &[Record]);
    fn show_auto_refresh(&mut self, enabled: bool);
    /// User-visible error, e.g. a failed manual refresh.
    fn notify(&mut self, message: &str);
}

/// `HH:MM:SS` wall-clock time in the local zone for an epoch timestamp in seconds.
pub fn clock_time(epoch_secs: u64) -> String {
    format_clock(epoch_secs, &Local)
}

/// `HH:MM:SS` for an epoch timestamp in `tz`. Out-of-range timestamps show as `--:--:--`.
pub fn format_clock<Tz>(epoch_secs: u64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    i64::try_from(epoch_secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|at| at.with_timezone(tz).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

pub fn status_line(status: &Status) -> String {
    status_line_in(status, &Local)
}

/// Status line with the time shown in `tz`.
pub fn status_line_in<Tz>(status: &Status, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match status {
        Status::Loading => "Loading...".to_string(),
        Status::Updated {
            sightings,
            markers,
            at,
        } => format!(
            "Sightings: {} | Markers: {} | {}",
            sightings,
            markers,
            format_clock(*at, tz)
        ),
        Status::Failed => "Load failed".to_string(),
    }
}

/// Dashboard printed to the terminal.
pub struct ConsoleDashboard<W: Write + Send + 'static> {
    out: W,
}

impl ConsoleDashboard<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write + Send + 'static> ConsoleDashboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "dashboard output failed");
        }
    }
}

impl<W: Write + Send + 'static> Dashboard for ConsoleDashboard<W> {
    fn show_status(&mut self, status: &Status) {
        let text = format!("[status] {}", status_line(status));
        self.line(&text);
    }

    fn show_recent(&mut self, records: &[Record]) {
        if records.is_empty() {
            self.line("[recent] no reports");
            return;
        }
        self.line("[recent]");
        for record in records {
            let text = format!(
                "  {} {:<16} {:.5}, {:.5}",
                record.date, record.username, record.latitude, record.longitude
            );
            self.line(&text);
        }
    }

    fn show_auto_refresh(&mut self, enabled: bool) {
        let text = format!("[auto-refresh] {}", if enabled { "on" } else { "off" });
        self.line(&text);
    }

    fn notify(&mut self, message: &str) {
        let text = format!("[error] {}", message);
        self.line(&text);
    }
}
