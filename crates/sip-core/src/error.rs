use thiserror::Error;

/// A type alias for handling `Result`s with `Error`
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in SIP message handling
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Null-equivalent or wrong-kind handle, e.g. asking a response for its
    /// request method, or re-adding a branch parameter that already exists.
    #[error("invalid argument")]
    InvalidArgument,

    /// Parse-level inconsistency. Also raised by typed accessors whose
    /// underlying value was marked bad during parsing, so callers can tell
    /// "header absent" from "header malformed".
    #[error("malformed SIP input: {0}")]
    BadProtocol(String),

    /// A header the accessor relies on is not present in the message.
    #[error("missing header: {0}")]
    MissingHeader(String),

    /// Attempt to mutate a message that has been handed to the transport.
    #[error("message is no longer modifiable")]
    NotModifiable,

    /// The start line could not be classified as a request or a response.
    #[error("invalid start line")]
    InvalidStartLine,

    /// Invalid SIP URI
    #[error("invalid SIP URI: {0}")]
    InvalidUri(String),
}

impl Error {
    pub(crate) fn bad(what: impl Into<String>) -> Self {
        Error::BadProtocol(what.into())
    }

    pub(crate) fn missing(name: impl Into<String>) -> Self {
        Error::MissingHeader(name.into())
    }
}
