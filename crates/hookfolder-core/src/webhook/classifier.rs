//! Event classification.
//!
//! Decides, from headers, raw body, and payload, whether a delivery should be
//! scheduled. Checks run in a fixed order and the first failing check wins:
//!
//! 1. signature header present
//! 2. event header present
//! 3. event is `issues` (soft-accept otherwise)
//! 4. delivery header present
//! 5. signature matches
//! 6. `action` has a registered handler (soft-accept otherwise)

use secrecy::{ExposeSecret, SecretString};

use hookfolder_types::webhook::{
    IssuePayload, Outcome, SignatureAlgorithm, WebhookHeaders, SUPPORTED_EVENT,
};

use super::signature;
use crate::action::ActionRegistry;

/// Classifies deliveries against one webhook secret.
pub struct EventClassifier {
    secret: SecretString,
    algorithm: SignatureAlgorithm,
}

impl EventClassifier {
    pub fn new(secret: SecretString, algorithm: SignatureAlgorithm) -> Self {
        Self { secret, algorithm }
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    pub fn classify(
        &self,
        headers: &WebhookHeaders,
        raw_body: &[u8],
        payload: &IssuePayload,
        actions: &ActionRegistry,
    ) -> Outcome {
        let Some(sig) = headers.signature.as_deref() else {
            return Outcome::MissingSignature;
        };

        let Some(event) = headers.event_type.as_deref() else {
            return Outcome::MissingEventType;
        };

        if event != SUPPORTED_EVENT {
            return Outcome::UnsupportedEventType(event.to_string());
        }

        let Some(delivery_id) = headers.delivery_id.as_deref() else {
            return Outcome::MissingDeliveryId;
        };

        let secret = self.secret.expose_secret().as_bytes();
        if !signature::verify(self.algorithm, secret, raw_body, Some(sig)) {
            return Outcome::SignatureMismatch;
        }

        match payload.action.as_deref() {
            Some(action) if actions.contains(action) => Outcome::Accepted {
                action: action.to_string(),
                delivery_id: delivery_id.to_string(),
            },
            other => Outcome::UnsupportedAction(other.unwrap_or_default().to_string()),
        }
    }
}
