use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{ACTIVE_END_HOUR, ACTIVE_START_HOUR};
use crate::monitor::{CheckOutcome, Monitor};
use crate::notifier::{report_error, Notifier};

/// Inclusive range of local hours during which ticks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveHours {
    pub start: u32,
    pub end: u32,
}

impl ActiveHours {
    pub fn contains(&self, hour: u32) -> bool {
        (self.start..=self.end).contains(&hour)
    }
}

impl Default for ActiveHours {
    fn default() -> Self {
        Self {
            start: ACTIVE_START_HOUR,
            end: ACTIVE_END_HOUR,
        }
    }
}

/// Immutable settings owned by one periodic task.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub period: Duration,
    pub active_hours: ActiveHours,
    /// Timezone the active hours are evaluated in.
    pub offset: FixedOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Local hour outside the active window; the monitor was not called.
    OutsideActiveHours,
    Completed(CheckOutcome),
    /// The monitor failed; the fault was handed to the notifier error path.
    Failed,
}

/// One monitor on a fixed period. Ticks run back to back inside the task, so a
/// slow tick delays the next one instead of overlapping it.
pub struct PeriodicTask {
    config: TaskConfig,
    monitor: Arc<dyn Monitor>,
    notifier: Arc<dyn Notifier>,
    clock: fn() -> DateTime<Utc>,
}

impl PeriodicTask {
    pub fn new(config: TaskConfig, monitor: Arc<dyn Monitor>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            monitor,
            notifier,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn name(&self) -> &'static str {
        self.monitor.name()
    }

    /// Run the monitor regardless of the active window.
    pub async fn run_once(&self) -> TickOutcome {
        match self.monitor.check().await {
            Ok(outcome) => {
                debug!(task = self.name(), ?outcome, "[Scheduler] tick complete");
                TickOutcome::Completed(outcome)
            }
            Err(e) if e.is_unrecognized_shape() => {
                warn!(task = self.name(), "[Scheduler] unrecognized page, skipping tick");
                TickOutcome::Completed(CheckOutcome::NoData)
            }
            Err(e) => {
                report_error(self.notifier.as_ref(), self.name(), &e).await;
                TickOutcome::Failed
            }
        }
    }

    /// One scheduled tick evaluated at `now`.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> TickOutcome {
        let hour = now.with_timezone(&self.config.offset).hour();
        if !self.config.active_hours.contains(hour) {
            debug!(task = self.name(), hour, "[Scheduler] outside active hours");
            return TickOutcome::OutsideActiveHours;
        }
        self.run_once().await
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        // Startup run sits outside the periodic schedule.
        self.run_once().await;

        let period = self.config.period;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick_at((self.clock)()).await;
                }
                _ = shutdown.changed() => break,
            }
        }
        info!(task = self.name(), "[Scheduler] task stopped");
    }
}

/// Owns the running periodic tasks. Nothing is shared between them.
pub struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl Scheduler {
    pub fn start(tasks: Vec<PeriodicTask>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handles = tasks
            .into_iter()
            .map(|task| {
                let name = task.name();
                info!(
                    task = name,
                    period_secs = task.config.period.as_secs_f64(),
                    "[Scheduler] starting {name} every {:?} ({:02}:00-{:02}:59)",
                    task.config.period,
                    task.config.active_hours.start,
                    task.config.active_hours.end,
                );
                let rx = shutdown_rx.clone();
                (name, tokio::spawn(task.run(rx)))
            })
            .collect();
        Self { shutdown_tx, handles }
    }

    pub fn task_count(&self) -> usize {
        self.handles.len()
    }

    /// Signal every task to stop and wait for them to finish their current tick.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let (names, handles): (Vec<_>, Vec<_>) = self.handles.into_iter().unzip();
        let results = futures_util::future::join_all(handles).await;
        for (name, res) in names.into_iter().zip(results) {
            if let Err(e) = res {
                warn!(task = name, "[Scheduler] task ended abnormally: {e}");
            }
        }
    }
}
