//! Business logic for hookfolder.
//!
//! Verifies and classifies inbound GitHub webhooks, arms one-shot deferred
//! jobs for accepted deliveries, and provisions folders through the
//! [`provision::FolderStore`] port. Depends only on `hookfolder-types`; the
//! Drive-backed store lives in `hookfolder-infra`.

pub mod action;
pub mod pipeline;
pub mod provision;
pub mod schedule;
pub mod webhook;
