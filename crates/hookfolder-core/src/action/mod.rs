//! Action handlers and the registry that maps action names to them.
//!
//! The registry is built once at startup and shared read-only. The set of
//! registered names doubles as the classifier's list of supported actions.

mod provision_issue;

pub use provision_issue::{issue_folder_name, ProvisionIssueFolder};

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use hookfolder_types::error::ActionError;
use hookfolder_types::webhook::IssuePayload;

/// A unit of deferred work triggered by an issue action.
///
/// The returned future is `'static` so the scheduler can run it on its own
/// task after the HTTP response has been sent. Handlers own their error
/// reporting: the scheduler only logs what comes back.
pub trait ActionHandler: Send + Sync {
    fn run(&self, payload: IssuePayload) -> BoxFuture<'static, Result<(), ActionError>>;
}

impl<F, Fut> ActionHandler for F
where
    F: Fn(IssuePayload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
{
    fn run(&self, payload: IssuePayload) -> BoxFuture<'static, Result<(), ActionError>> {
        Box::pin(self(payload))
    }
}

/// Name -> handler mapping.
#[derive(Default, Clone)]
pub struct ActionRegistry {
    handlers: BTreeMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `action`, replacing any previous handler.
    pub fn register(&mut self, action: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        let action = action.into();
        tracing::debug!(%action, "registered action handler");
        self.handlers.insert(action, handler);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, action: impl Into<String>, handler: Arc<dyn ActionHandler>) -> Self {
        self.register(action, handler);
        self
    }

    pub fn get(&self, action: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(action).cloned()
    }

    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Registered action names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> Arc<dyn ActionHandler> {
        Arc::new(|_payload: IssuePayload| async { Ok::<(), ActionError>(()) })
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ActionRegistry::new().with("opened", noop());
        assert!(registry.contains("opened"));
        assert!(!registry.contains("closed"));
        assert!(registry.get("opened").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = ActionRegistry::new()
            .with("reopened", noop())
            .with("closed", noop())
            .with("opened", noop());
        assert_eq!(registry.names(), vec!["closed", "opened", "reopened"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = ActionRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("opened").is_none());
    }

    #[tokio::test]
    async fn test_closure_handler_receives_payload() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let handler: Arc<dyn ActionHandler> = Arc::new(move |payload: IssuePayload| {
            let seen = seen.clone();
            async move {
                assert_eq!(payload.action.as_deref(), Some("opened"));
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let payload = IssuePayload::from_value(serde_json::json!({"action": "opened"}));
        handler.run(payload).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
