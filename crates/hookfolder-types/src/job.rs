//! Deferred job lifecycle types.
//!
//! A [`ScheduledJob`] moves through `Armed -> Fired -> Disposed` exactly once.
//! All state changes go through [`ScheduledJob::advance`], which takes the
//! current time as an argument so the lifecycle can be exercised without
//! sleeping.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::webhook::IssuePayload;

/// Lifecycle state of a deferred job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting for its fire time.
    Armed,
    /// Handler has been (or is being) invoked.
    Fired,
    /// Terminal. Resources released; never re-armed.
    Disposed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Armed => write!(f, "armed"),
            JobState::Fired => write!(f, "fired"),
            JobState::Disposed => write!(f, "disposed"),
        }
    }
}

/// What the caller must do after a call to [`ScheduledJob::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Still armed; fire time not reached.
    Wait,
    /// Just moved to `Fired`: run the handler now.
    Fire,
    /// Just moved to `Disposed`: release the job.
    Dispose,
    /// Already disposed; nothing to do.
    Idle,
}

/// One deferred action bound to one delivery.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    /// Derived from the delivery id.
    pub id: String,
    /// Action name whose handler will run.
    pub action: String,
    pub payload: IssuePayload,
    pub armed_at: DateTime<Utc>,
    pub fires_at: DateTime<Utc>,
    state: JobState,
}

impl ScheduledJob {
    /// Create a job in the `Armed` state.
    pub fn arm(
        id: impl Into<String>,
        action: impl Into<String>,
        payload: IssuePayload,
        armed_at: DateTime<Utc>,
        fires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            payload,
            armed_at,
            fires_at,
            state: JobState::Armed,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// The single transition function.
    ///
    /// - `Armed` before `fires_at` stays `Armed` ([`Transition::Wait`]).
    /// - `Armed` at or after `fires_at` becomes `Fired` ([`Transition::Fire`]).
    /// - `Fired` becomes `Disposed` ([`Transition::Dispose`]).
    /// - `Disposed` never changes ([`Transition::Idle`]).
    pub fn advance(&mut self, now: DateTime<Utc>) -> Transition {
        match self.state {
            JobState::Armed if now < self.fires_at => Transition::Wait,
            JobState::Armed => {
                self.state = JobState::Fired;
                Transition::Fire
            }
            JobState::Fired => {
                self.state = JobState::Disposed;
                Transition::Dispose
            }
            JobState::Disposed => Transition::Idle,
        }
    }
}
