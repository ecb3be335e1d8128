use thiserror::Error;

/// Errors from the remote folder store (used by the `FolderStore` trait in hookfolder-core).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("remote store returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("folder not found: {0}")]
    NotFound(String),
}

/// Errors from folder provisioning.
///
/// Absence is not an error: lookups return `Ok(None)` so callers can tell
/// "not found" apart from "lookup failed".
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("folder name must not be empty")]
    EmptyName,

    #[error("remote store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised inside a fired action handler.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("payload is missing field '{0}'")]
    MissingField(&'static str),

    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    #[error("{0}")]
    Other(String),
}
