//! Patrol map - headless console front-end
//!
//! Polls the sightings feed, keeps an in-memory map in sync with it and prints the
//! dashboard (status line, recent reports) to stdout. Logs go to stderr.
//!
//! Commands on stdin:
//!   r | refresh           forced refresh
//!   auto on [ms]          start polling (default interval from POLL_INTERVAL_MS)
//!   auto off              stop polling
//!   q | quit              exit (Ctrl-C works too)
//!
//! Usage:
//!   FEED_URL=https://example.org/api/dps-data ./target/release/patrol-map
//!   POLL_INTERVAL_MS=10000 AUTO_REFRESH=0 RUST_LOG=debug ./target/release/patrol-map

use patrol_map::config::Config;
use patrol_map::feed::FeedClient;
use patrol_map::map::ConsoleMap;
use patrol_map::pipeline::RefreshPipeline;
use patrol_map::scheduler::{Scheduler, SchedulerHandle};
use patrol_map::ui::ConsoleDashboard;
use std::io::BufRead;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// A line typed on stdin.
#[derive(Debug, Clone, PartialEq)]
enum ConsoleCommand {
    Refresh,
    AutoRefresh { enabled: bool, interval: Duration },
    Quit,
}

/// Parses one stdin line. `None` for blank or unknown input.
fn parse_command(line: &str, default_interval: Duration) -> Option<ConsoleCommand> {
    let mut words = line.split_whitespace();
    match (words.next()?, words.next(), words.next()) {
        ("r" | "refresh", None, None) => Some(ConsoleCommand::Refresh),
        ("q" | "quit", None, None) => Some(ConsoleCommand::Quit),
        ("auto", Some("off"), None) => Some(ConsoleCommand::AutoRefresh {
            enabled: false,
            interval: default_interval,
        }),
        ("auto", Some("on"), ms) => {
            let interval = match ms {
                None => default_interval,
                Some(ms) => Duration::from_millis(ms.parse().ok().filter(|&ms: &u64| ms > 0)?),
            };
            Some(ConsoleCommand::AutoRefresh {
                enabled: true,
                interval,
            })
        }
        _ => None,
    }
}

fn dispatch(handle: &SchedulerHandle, command: ConsoleCommand) -> anyhow::Result<bool> {
    match command {
        ConsoleCommand::Refresh => handle.manual_refresh()?,
        ConsoleCommand::AutoRefresh { enabled, interval } => {
            handle.set_auto_refresh(enabled, interval)?
        }
        ConsoleCommand::Quit => return Ok(false),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ========================================================================
    // Logging and configuration
    // ========================================================================

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        feed = %config.feed_url,
        poll_ms = config.poll_interval.as_millis() as u64,
        auto_refresh = config.auto_refresh,
        "starting patrol map"
    );

    // ========================================================================
    // Pipeline and scheduler
    // ========================================================================

    let client = FeedClient::new(&config.feed_url, config.fetch_timeout, config.cache_slot)?;
    let mut pipeline = RefreshPipeline::new(
        ConsoleMap::new(),
        ConsoleDashboard::stdout(),
        config.recent_limit,
    );
    let (lat, lon) = config.map_center;
    pipeline.init_view(lat, lon, config.map_zoom);

    let (scheduler, handle) = Scheduler::new(client, pipeline, config.fetch_timeout);
    let task = tokio::spawn(scheduler.run());

    handle.manual_refresh()?;
    if config.auto_refresh {
        handle.set_auto_refresh(true, config.poll_interval)?;
    }

    // ========================================================================
    // Console triggers
    // ========================================================================

    // Blocking stdin reads live on their own thread so shutdown never waits on them
    let (line_tx, mut lines) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.recv(), if stdin_open => match line {
                // keep running detached from a terminal; Ctrl-C still stops us
                None => stdin_open = false,
                Some(line) => match parse_command(&line, config.poll_interval) {
                    Some(command) => {
                        if !dispatch(&handle, command)? {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => tracing::warn!(input = %line.trim(), "unknown command"),
                },
            },
        }
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    handle.shutdown()?;
    task.await?;
    tracing::info!("bye");
    Ok(())
}
