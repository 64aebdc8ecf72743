//! Error types for dialog-core.

use thiserror::Error;

/// Result type for dialog operations.
pub type DialogResult<T> = std::result::Result<T, DialogError>;

/// Errors surfaced by the dialog layer.
#[derive(Error, Debug)]
pub enum DialogError {
    /// The message cannot drive this dialog operation (wrong kind, wrong
    /// method, unsupported response).
    #[error("invalid message for dialog operation: {0}")]
    InvalidMessage(String),

    /// A header the operation relies on is absent or unusable.
    #[error("missing dialog header: {0}")]
    MissingHeader(String),

    /// Protocol violation, e.g. a mid-dialog CSeq decrease.
    #[error("dialog protocol error: {0}")]
    Protocol(String),

    /// Completion validation failed; the dialog state was not changed.
    #[error("dialog validation failed: {0}")]
    ValidationFailed(String),

    /// The dialog is not in a state that permits the operation.
    #[error("dialog is {0}")]
    WrongState(&'static str),

    /// The final response tore the dialog down.
    #[error("dialog rejected with status {0}")]
    Rejected(u16),

    /// An underlying message-parsing error.
    #[error(transparent)]
    Core(#[from] sipkit_sip_core::Error),
}

impl DialogError {
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        DialogError::InvalidMessage(what.into())
    }

    pub(crate) fn missing(what: impl Into<String>) -> Self {
        DialogError::MissingHeader(what.into())
    }

    pub(crate) fn protocol(what: impl Into<String>) -> Self {
        DialogError::Protocol(what.into())
    }

    pub(crate) fn validation(what: impl Into<String>) -> Self {
        DialogError::ValidationFailed(what.into())
    }
}
