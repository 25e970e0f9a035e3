//! Refresh scheduling: manual and periodic fetch cycles
//!
//! One task owns the feed source, the render pipeline and the polling timer.
//! Each fetch cycle gets a sequence number; only the response of the most
//! recently issued cycle is applied, and at most one fetch runs at a time.

use crate::error::{FetchError, SchedulerError};
use crate::feed::FeedSource;
use crate::map::MapView;
use crate::pipeline::RefreshPipeline;
use crate::types::Record;
use crate::ui::Dashboard;
use futures_util::future::{BoxFuture, FutureExt};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

// ============================================================================
// Cycle bookkeeping
// ============================================================================

/// What started a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Timer,
    Manual,
}

impl Trigger {
    /// Manual cycles bypass change detection and every cache.
    pub fn forced(self) -> bool {
        matches!(self, Trigger::Manual)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    pub seq: u64,
    pub trigger: Trigger,
}

/// Answer to a cycle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Nothing in flight; fetch now.
    Start(Cycle),
    /// Waits for the in-flight cycle, whose response is now stale.
    Queued(Cycle),
    /// A manual cycle is already waiting; this request rides along with it.
    Coalesced,
    /// Timer tick while a cycle is in flight.
    Skipped,
}

/// Outcome of finishing a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finished {
    /// The finished cycle is still the latest issued; its result may be applied.
    pub current: bool,
    /// Queued cycle that is now in flight.
    pub next: Option<Cycle>,
}

/// Sequence-number state machine behind the scheduler.
///
/// Invariants: at most one cycle in flight, at most one queued, and a queued
/// cycle always carries the highest sequence number.
#[derive(Debug, Default)]
pub struct CycleTracker {
    last_seq: u64,
    in_flight: Option<Cycle>,
    pending: Option<Cycle>,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> Option<Cycle> {
        self.in_flight
    }

    pub fn pending(&self) -> Option<Cycle> {
        self.pending
    }

    pub fn request(&mut self, trigger: Trigger) -> Admission {
        if self.in_flight.is_none() {
            let cycle = self.issue(trigger);
            self.in_flight = Some(cycle);
            return Admission::Start(cycle);
        }
        match trigger {
            Trigger::Timer => Admission::Skipped,
            Trigger::Manual if self.pending.is_some() => Admission::Coalesced,
            Trigger::Manual => {
                let cycle = self.issue(trigger);
                self.pending = Some(cycle);
                Admission::Queued(cycle)
            }
        }
    }

    /// Marks cycle `seq` as resolved and promotes the queued cycle, if any.
    pub fn finish(&mut self, seq: u64) -> Finished {
        if self.in_flight.map(|c| c.seq) != Some(seq) {
            return Finished {
                current: false,
                next: None,
            };
        }
        let next = self.pending.take();
        self.in_flight = next;
        Finished {
            current: seq == self.last_seq,
            next,
        }
    }

    fn issue(&mut self, trigger: Trigger) -> Cycle {
        self.last_seq += 1;
        Cycle {
            seq: self.last_seq,
            trigger,
        }
    }
}

// ============================================================================
// Scheduler task
// ============================================================================

/// Polling state as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Polling(Duration),
}

#[derive(Debug)]
enum Command {
    Refresh,
    AutoRefresh { enabled: bool, interval: Duration },
    Shutdown,
}

/// Cheap, cloneable control surface of a running [`Scheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SchedulerState>,
}

impl SchedulerHandle {
    /// Requests a forced refresh.
    pub fn manual_refresh(&self) -> Result<(), SchedulerError> {
        self.send(Command::Refresh)
    }

    /// Starts, stops or re-times periodic polling.
    pub fn set_auto_refresh(&self, enabled: bool, interval: Duration) -> Result<(), SchedulerError> {
        self.send(Command::AutoRefresh { enabled, interval })
    }

    pub fn shutdown(&self) -> Result<(), SchedulerError> {
        self.send(Command::Shutdown)
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    fn send(&self, command: Command) -> Result<(), SchedulerError> {
        self.commands
            .send(command)
            .map_err(|_| SchedulerError::Stopped)
    }
}

type CycleFuture = BoxFuture<'static, (Cycle, Result<Vec<Record>, FetchError>)>;

/// Drives fetch cycles and feeds their results to the render pipeline.
pub struct Scheduler<S: FeedSource, M: MapView, D: Dashboard> {
    source: S,
    pipeline: RefreshPipeline<M, D>,
    tracker: CycleTracker,
    timer: Option<Interval>,
    in_flight: Option<CycleFuture>,
    fetch_timeout: Duration,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<SchedulerState>,
}

impl<S: FeedSource, M: MapView, D: Dashboard> Scheduler<S, M, D> {
    /// Creates an idle scheduler and its handle. Nothing runs until [`Scheduler::run`].
    ///
    /// # Arguments
    /// * `source` - where records come from
    /// * `pipeline` - render side, owned by the scheduler from now on
    /// * `fetch_timeout` - bound on a single fetch, whatever the source
    pub fn new(
        source: S,
        pipeline: RefreshPipeline<M, D>,
        fetch_timeout: Duration,
    ) -> (Self, SchedulerHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SchedulerState::Idle);
        let scheduler = Self {
            source,
            pipeline,
            tracker: CycleTracker::new(),
            timer: None,
            in_flight: None,
            fetch_timeout,
            commands: command_rx,
            state: state_tx,
        };
        let handle = SchedulerHandle {
            commands: command_tx,
            state: state_rx,
        };
        (scheduler, handle)
    }

    /// Runs until shut down or until every handle is dropped.
    ///
    /// An in-flight fetch is abandoned on shutdown.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Refresh) => self.request(Trigger::Manual),
                    Some(Command::AutoRefresh { enabled, interval }) => {
                        self.set_auto_refresh(enabled, interval)
                    }
                    Some(Command::Shutdown) | None => break,
                },
                (cycle, result) = next_completion(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.complete(cycle, result);
                }
                () = next_tick(&mut self.timer) => self.request(Trigger::Timer),
            }
        }
        tracing::info!("refresh scheduler stopped");
    }

    fn request(&mut self, trigger: Trigger) {
        match self.tracker.request(trigger) {
            Admission::Start(cycle) => self.start(cycle),
            Admission::Queued(cycle) => {
                tracing::debug!(seq = cycle.seq, "manual refresh queued behind in-flight cycle");
            }
            Admission::Coalesced => {
                tracing::debug!("manual refresh already queued");
            }
            Admission::Skipped => {
                tracing::debug!("timer tick skipped, cycle still in flight");
            }
        }
    }

    fn start(&mut self, cycle: Cycle) {
        tracing::debug!(seq = cycle.seq, trigger = ?cycle.trigger, "fetch cycle started");
        if cycle.trigger == Trigger::Manual {
            self.pipeline.loading();
        }

        let fetch = self.source.fetch(cycle.trigger.forced());
        let timeout = self.fetch_timeout;
        self.in_flight = Some(
            async move {
                let result = match tokio::time::timeout(timeout, fetch).await {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout(timeout)),
                };
                (cycle, result)
            }
            .boxed(),
        );
    }

    fn complete(&mut self, cycle: Cycle, result: Result<Vec<Record>, FetchError>) {
        let finished = self.tracker.finish(cycle.seq);

        if !finished.current {
            tracing::debug!(seq = cycle.seq, "stale response discarded");
        } else {
            match result {
                Ok(records) => {
                    self.pipeline
                        .apply(&records, cycle.trigger.forced(), now_secs());
                }
                Err(e) => match cycle.trigger {
                    Trigger::Timer => {
                        tracing::warn!(seq = cycle.seq, error = %e, "scheduled refresh failed");
                    }
                    Trigger::Manual => {
                        tracing::warn!(seq = cycle.seq, error = %e, "manual refresh failed");
                        self.pipeline.failed(&e);
                    }
                },
            }
        }

        if let Some(next) = finished.next {
            self.start(next);
        }
    }

    /// Swaps the timer in one step; never leaves two timers armed.
    /// Leaves any in-flight fetch alone.
    fn set_auto_refresh(&mut self, enabled: bool, interval: Duration) {
        if self.timer.take().is_some() {
            tracing::debug!("polling timer cancelled");
        }

        let state = if enabled {
            let interval = interval.max(MIN_INTERVAL);
            let mut timer = tokio::time::interval_at(Instant::now() + interval, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.timer = Some(timer);
            tracing::info!(interval_ms = interval.as_millis() as u64, "auto-refresh on");
            SchedulerState::Polling(interval)
        } else {
            tracing::info!("auto-refresh off");
            SchedulerState::Idle
        };

        self.state.send_replace(state);
        self.pipeline.auto_refresh_changed(enabled);
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn next_completion(
    in_flight: &mut Option<CycleFuture>,
) -> (Cycle, Result<Vec<Record>, FetchError>) {
    match in_flight {
        Some(fetch) => fetch.await,
        None => std::future::pending().await,
    }
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
