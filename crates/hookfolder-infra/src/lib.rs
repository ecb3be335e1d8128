//! Infrastructure layer for hookfolder.
//!
//! Implements the `FolderStore` port from `hookfolder-core` against the
//! Google Drive v3 REST API (service-account authentication included), and
//! loads `hookfolder.toml` with environment overrides.

pub mod config;
pub mod drive;
