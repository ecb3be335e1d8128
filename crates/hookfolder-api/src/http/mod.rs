//! HTTP layer: the webhook receiver and a health probe.

pub mod handlers;
pub mod router;
