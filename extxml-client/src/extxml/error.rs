//! ExtXML error types.

use thiserror::Error;

/// Errors surfaced while talking the ExtXML protocol.
#[derive(Debug, Error)]
pub enum ExtXmlError {
    /// Caller input violates a protocol constraint.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The response document violates the protocol contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A response element no converter is registered for. Carries a
    /// dump of the offending payload for diagnostic inspection.
    #[error("unknown element <{tag}>")]
    UnknownElement { tag: String, dump: String },

    /// A required attribute or sub-element is absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A wire time string does not match `[D]dHH:MM[:SS]`.
    #[error("malformed time: {0:?}")]
    MalformedTime(String),

    /// Failure reported by the transport collaborator, verbatim.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Errors from the transport collaborator (a single HTTP POST).
///
/// The core never retries; whether to do so is the transport owner's
/// decision.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request failed below the HTTP layer (connect, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned status {status}: {message}")]
    Status { status: u16, message: String },
}
