//! Shared domain types for hookfolder.
//!
//! Contains the webhook, scheduling, and folder types used across the
//! workspace, plus configuration structs and the error enums returned by the
//! core and infrastructure layers.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod folder;
pub mod job;
pub mod webhook;
