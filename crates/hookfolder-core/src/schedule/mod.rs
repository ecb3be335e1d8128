//! One-shot deferred job scheduler.
//!
//! Each accepted delivery gets its own [`ScheduledJob`] and its own tokio
//! task. The task sleeps for the configured delay, drives the job through
//! `Armed -> Fired -> Disposed` via [`ScheduledJob::advance`], runs the
//! registered handler exactly once, and removes the job from the live table.
//!
//! Jobs live only in memory and are lost on restart. Only a process whose
//! role is [`SchedulerRole::Coordinator`] arms timers.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use dashmap::DashMap;
use futures_util::FutureExt;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;

use hookfolder_types::config::SchedulerRole;
use hookfolder_types::job::{JobState, ScheduledJob, Transition};
use hookfolder_types::webhook::IssuePayload;

use crate::action::ActionRegistry;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur while arming a job.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// No handler is registered for the action.
    #[error("no handler registered for action '{0}'")]
    UnknownAction(String),

    /// Delay cannot be represented as a wall-clock offset.
    #[error("invalid delay: {0}")]
    InvalidDelay(String),
}

/// Convert `delay` to a wall-clock offset, rejecting values chrono cannot
/// represent. Callers validate configured delays with this at startup.
pub fn check_delay(delay: Duration) -> Result<TimeDelta, SchedulerError> {
    let offset =
        TimeDelta::from_std(delay).map_err(|e| SchedulerError::InvalidDelay(e.to_string()))?;
    Utc::now()
        .checked_add_signed(offset)
        .ok_or_else(|| SchedulerError::InvalidDelay(format!("{delay:?} overflows")))?;
    Ok(offset)
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Returned to the caller for each armed job.
#[derive(Debug)]
pub struct ScheduledJobHandle {
    pub id: String,
    pub action: String,
    pub fires_at: DateTime<Utc>,
    task: JoinHandle<()>,
}

impl ScheduledJobHandle {
    /// Wait until the job has fired and been disposed (or was aborted).
    pub async fn disposed(self) {
        let _ = self.task.await;
    }
}

// ---------------------------------------------------------------------------
// DeferredScheduler
// ---------------------------------------------------------------------------

/// Options fixed at construction time.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Default delay between acceptance and firing.
    pub delay: Duration,
    /// Timezone used only when rendering fire times in logs.
    pub display_timezone: Tz,
    pub role: SchedulerRole,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(60),
            display_timezone: chrono_tz::America::New_York,
            role: SchedulerRole::Coordinator,
        }
    }
}

struct LiveJob {
    job: ScheduledJob,
    abort: Option<AbortHandle>,
}

/// Arms one-shot timers that invoke registered action handlers.
pub struct DeferredScheduler {
    actions: Arc<ActionRegistry>,
    options: SchedulerOptions,
    jobs: Arc<DashMap<String, LiveJob>>,
    sequence: AtomicU64,
}

impl DeferredScheduler {
    pub fn new(actions: Arc<ActionRegistry>, options: SchedulerOptions) -> Self {
        Self {
            actions,
            options,
            jobs: Arc::new(DashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn role(&self) -> SchedulerRole {
        self.options.role
    }

    pub fn delay(&self) -> Duration {
        self.options.delay
    }

    /// Arm a job with the default delay. See [`schedule_after`](Self::schedule_after).
    pub fn schedule(
        &self,
        delivery_id: &str,
        action: &str,
        payload: IssuePayload,
    ) -> Result<Option<ScheduledJobHandle>, SchedulerError> {
        self.schedule_after(delivery_id, action, payload, self.options.delay)
    }

    /// Arm a one-shot job that runs `action`'s handler with `payload` after `delay`.
    ///
    /// Returns `Ok(None)` on a replica: the delivery is acknowledged but only
    /// the coordinator arms timers. Must be called within a tokio runtime.
    pub fn schedule_after(
        &self,
        delivery_id: &str,
        action: &str,
        payload: IssuePayload,
        delay: Duration,
    ) -> Result<Option<ScheduledJobHandle>, SchedulerError> {
        if !self.actions.contains(action) {
            return Err(SchedulerError::UnknownAction(action.to_string()));
        }

        if self.options.role != SchedulerRole::Coordinator {
            tracing::info!(
                delivery_id,
                action,
                "replica process, not arming timer"
            );
            return Ok(None);
        }

        let offset = check_delay(delay)?;
        let armed_at = Utc::now();
        let fires_at = armed_at
            .checked_add_signed(offset)
            .ok_or_else(|| SchedulerError::InvalidDelay(format!("{delay:?} overflows")))?;

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let id = format!("{delivery_id}-{seq}");
        let issue = payload.issue.as_ref().map(|i| i.number);
        let job = ScheduledJob::arm(&id, action, payload, armed_at, fires_at);

        // Register before spawning so the task always finds its entry.
        self.jobs.insert(id.clone(), LiveJob { job, abort: None });

        let task = tokio::spawn(run_job(
            id.clone(),
            delay,
            armed_at,
            Arc::clone(&self.actions),
            Arc::clone(&self.jobs),
        ));
        if let Some(mut live) = self.jobs.get_mut(&id) {
            live.abort = Some(task.abort_handle());
        }

        tracing::info!(
            job_id = %id,
            action,
            issue = ?issue,
            fires_at = %display_fire_time(fires_at, self.options.display_timezone),
            "scheduled job"
        );

        Ok(Some(ScheduledJobHandle {
            id,
            action: action.to_string(),
            fires_at,
            task,
        }))
    }

    /// Snapshot of jobs that have not yet been disposed.
    pub fn jobs(&self) -> Vec<ScheduledJob> {
        self.jobs.iter().map(|entry| entry.job.clone()).collect()
    }

    /// Number of jobs that have not yet been disposed.
    pub fn live_count(&self) -> usize {
        self.jobs.len()
    }

    /// Abort all pending timers and drop their jobs.
    ///
    /// Pending work is lost, same as a restart.
    pub fn shutdown(&self) {
        let pending = self.jobs.len();
        for entry in self.jobs.iter() {
            if let Some(abort) = &entry.abort {
                abort.abort();
            }
        }
        self.jobs.clear();
        if pending > 0 {
            tracing::warn!(pending, "scheduler shut down with pending jobs");
        }
    }
}

/// Render a fire time in `tz` for logs, e.g. `2026-07-01 12:00:00 EDT`.
fn display_fire_time(fires_at: DateTime<Utc>, tz: Tz) -> String {
    fires_at.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

/// Timer task body for one job.
async fn run_job(
    id: String,
    delay: Duration,
    armed_at: DateTime<Utc>,
    actions: Arc<ActionRegistry>,
    jobs: Arc<DashMap<String, LiveJob>>,
) {
    let started = Instant::now();
    tokio::time::sleep(delay).await;

    // Wall time as seen by the timer: armed_at plus elapsed monotonic time.
    let now = TimeDelta::from_std(started.elapsed())
        .ok()
        .and_then(|elapsed| armed_at.checked_add_signed(elapsed))
        .unwrap_or_else(Utc::now);

    let fired = {
        let Some(mut live) = jobs.get_mut(&id) else {
            return;
        };
        match live.job.advance(now) {
            Transition::Fire => Some((live.job.action.clone(), live.job.payload.clone())),
            _ => None,
        }
    };

    let Some((action, payload)) = fired else {
        tracing::warn!(job_id = %id, "timer woke before fire time, dropping job");
        jobs.remove(&id);
        return;
    };

    match actions.get(&action) {
        Some(handler) => {
            tracing::info!(job_id = %id, %action, "firing job");
            match AssertUnwindSafe(handler.run(payload)).catch_unwind().await {
                Ok(Ok(())) => tracing::info!(job_id = %id, %action, "job completed"),
                Ok(Err(e)) => tracing::error!(job_id = %id, %action, error = %e, "job failed"),
                Err(_) => tracing::error!(job_id = %id, %action, "job handler panicked"),
            }
        }
        None => tracing::error!(job_id = %id, %action, "handler disappeared before firing"),
    }

    if let Some((_, mut live)) = jobs.remove(&id) {
        let transition = live.job.advance(now);
        debug_assert_eq!(transition, Transition::Dispose);
        debug_assert_eq!(live.job.state(), JobState::Disposed);
        tracing::debug!(job_id = %id, "job disposed");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
