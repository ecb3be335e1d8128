//! Google Drive v3 folder store.

pub mod auth;
pub mod client;
mod types;

pub use auth::{AccessTokenSource, ServiceAccountKey, ServiceAccountTokenSource, StaticToken};
pub use client::DriveFolderStore;
