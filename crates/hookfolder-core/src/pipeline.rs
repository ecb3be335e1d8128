//! Per-request webhook pipeline.
//!
//! Sequences content-type check -> JSON parse -> classification -> scheduling
//! for one delivery and turns the result into a status code and plain-text
//! body. Transport-agnostic: the HTTP layer only converts headers in and the
//! [`PipelineResponse`] out.

use std::sync::Arc;

use hookfolder_types::webhook::{IssuePayload, Outcome, WebhookHeaders, WRONG_CONTENT_TYPE_MESSAGE};

use crate::action::ActionRegistry;
use crate::schedule::{DeferredScheduler, SchedulerError};
use crate::webhook::EventClassifier;

/// Failures that surface as `500 Error occurred: ...`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// One inbound delivery as received.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub headers: WebhookHeaders,
    /// Body bytes exactly as transmitted.
    pub body: Vec<u8>,
}

/// Status and plain-text body to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResponse {
    pub status: u16,
    pub body: String,
}

impl PipelineResponse {
    fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

impl From<&Outcome> for PipelineResponse {
    fn from(outcome: &Outcome) -> Self {
        Self::new(outcome.status(), outcome.message())
    }
}

impl From<&PipelineError> for PipelineResponse {
    fn from(err: &PipelineError) -> Self {
        Self::new(500, format!("Error occurred: {err}"))
    }
}

/// Verifier -> classifier -> scheduler composition.
pub struct WebhookPipeline {
    classifier: EventClassifier,
    actions: Arc<ActionRegistry>,
    scheduler: Arc<DeferredScheduler>,
}

impl WebhookPipeline {
    pub fn new(
        classifier: EventClassifier,
        actions: Arc<ActionRegistry>,
        scheduler: Arc<DeferredScheduler>,
    ) -> Self {
        Self {
            classifier,
            actions,
            scheduler,
        }
    }

    pub fn classifier(&self) -> &EventClassifier {
        &self.classifier
    }

    pub fn scheduler(&self) -> &DeferredScheduler {
        &self.scheduler
    }

    /// Process one delivery. Must be called within a tokio runtime.
    pub fn handle(&self, request: &InboundRequest) -> PipelineResponse {
        let delivery_id = request.headers.delivery_id.as_deref().unwrap_or("-");

        if !request.headers.is_json() {
            tracing::warn!(
                delivery_id,
                content_type = ?request.headers.content_type,
                "rejected non-JSON webhook"
            );
            return PipelineResponse::new(500, WRONG_CONTENT_TYPE_MESSAGE);
        }

        match self.process(request) {
            Ok(outcome) => {
                match &outcome {
                    Outcome::Accepted { action, .. } => {
                        tracing::info!(delivery_id, %action, "webhook accepted");
                    }
                    o if o.is_soft_accept() => {
                        tracing::info!(delivery_id, outcome = ?o, "webhook skipped");
                    }
                    o => {
                        tracing::warn!(delivery_id, outcome = ?o, "webhook rejected");
                    }
                }
                PipelineResponse::from(&outcome)
            }
            Err(err) => {
                tracing::error!(delivery_id, error = %err, "webhook processing failed");
                PipelineResponse::from(&err)
            }
        }
    }

    fn process(&self, request: &InboundRequest) -> Result<Outcome, PipelineError> {
        let value: serde_json::Value = serde_json::from_slice(&request.body)?;
        let payload = IssuePayload::from_value(value);

        let outcome =
            self.classifier
                .classify(&request.headers, &request.body, &payload, &self.actions);

        if let Outcome::Accepted {
            action,
            delivery_id,
        } = &outcome
        {
            self.scheduler.schedule(delivery_id, action, payload)?;
        }

        Ok(outcome)
    }
}
