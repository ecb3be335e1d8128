//! Webhook authentication and event filtering.

pub mod classifier;
pub mod signature;

pub use classifier::EventClassifier;
pub use signature::{sign, verify};
