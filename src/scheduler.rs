use crate::clock::Clock;
use crate::error::CouponError;
use crate::pipeline::{Pipeline, RunReport};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of a scheduled run: `Idle → Running → Succeeded | Failed → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Work the scheduler triggers on every tick.
#[async_trait]
pub trait ScheduledJob: Send {
    async fn run(&mut self) -> Result<RunReport, CouponError>;
}

#[async_trait]
impl ScheduledJob for Pipeline {
    async fn run(&mut self) -> Result<RunReport, CouponError> {
        self.run_once().await
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub runs: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Ticks that came due while a run was still in progress.
    pub skipped_ticks: u64,
}

/// Fixed-interval trigger. Runs never overlap: ticks that elapse during a
/// run are skipped, not queued.
pub struct Scheduler {
    interval: Duration,
    run_on_start: bool,
    clock: Arc<dyn Clock>,
    state: RunState,
    last_outcome: Option<RunState>,
    stats: SchedulerStats,
}

impl Scheduler {
    pub fn new(interval: Duration, run_on_start: bool, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval: interval.max(Duration::from_secs(1)),
            run_on_start,
            clock,
            state: RunState::Idle,
            last_outcome: None,
            stats: SchedulerStats::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// `Succeeded` or `Failed` for the most recent run.
    pub fn last_outcome(&self) -> Option<RunState> {
        self.last_outcome
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Trigger `job` every interval until `max_cycles` runs have happened,
    /// or forever when `None`. A failed run never stops the loop; an
    /// interval that runs past the representable date range does.
    pub async fn run(&mut self, job: &mut dyn ScheduledJob, max_cycles: Option<u64>) {
        let step = TimeDelta::from_std(self.interval).unwrap_or(TimeDelta::MAX);
        let mut next_tick = self.clock.now();
        if !self.run_on_start {
            let Some(first) = next_tick.checked_add_signed(step) else {
                tracing::error!(interval_secs = self.interval.as_secs(), "interval out of range");
                return;
            };
            next_tick = first;
        }

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            run_on_start = self.run_on_start,
            "scheduler started"
        );

        loop {
            if max_cycles.is_some_and(|max| self.stats.runs >= max) {
                break;
            }

            self.clock.sleep_until(next_tick).await;
            self.run_cycle(job).await;

            let now = self.clock.now();
            let Some(tick) = next_tick_after(next_tick, step, now, &mut self.stats) else {
                tracing::error!(
                    interval_secs = self.interval.as_secs(),
                    "next run is past the end of the calendar, stopping"
                );
                break;
            };
            next_tick = tick;
            tracing::debug!(next_run = %next_tick, "next run scheduled");
        }
    }

    async fn run_cycle(&mut self, job: &mut dyn ScheduledJob) {
        self.transition(RunState::Running);
        self.stats.runs += 1;

        let outcome = match job.run().await {
            Ok(report) => {
                self.stats.succeeded += 1;
                tracing::debug!(?report, "run succeeded");
                RunState::Succeeded
            }
            Err(e) => {
                self.stats.failed += 1;
                tracing::error!("run failed, retrying next interval: {e}");
                RunState::Failed
            }
        };

        self.transition(outcome);
        self.last_outcome = Some(outcome);
        self.transition(RunState::Idle);
    }

    fn transition(&mut self, to: RunState) {
        tracing::debug!(from = %self.state, to = %to, "scheduler state");
        self.state = to;
    }
}

/// First tick after `previous` that is not before `now`. Ticks passed over
/// are counted as skipped. `None` once the date range runs out.
fn next_tick_after(
    previous: DateTime<Utc>,
    step: TimeDelta,
    now: DateTime<Utc>,
    stats: &mut SchedulerStats,
) -> Option<DateTime<Utc>> {
    let mut tick = previous.checked_add_signed(step)?;
    while tick < now {
        tick = tick.checked_add_signed(step)?;
        stats.skipped_ticks += 1;
        tracing::warn!("run overran its interval, skipping tick");
    }
    Some(tick)
}
