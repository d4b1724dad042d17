//! Typed failure conditions.
//!
//! Every operation returns an [`anyhow::Error`]; when the failure belongs to one of the conditions
//! below it can be recovered with `error.downcast_ref::<Error>()`, even after context has been
//! added.

use std::fmt::{Display, Formatter};

use anyhow::anyhow;
use reqwest::StatusCode;

#[derive(Debug)]
pub enum Error {
    /// The server could not be reached at all.
    ConnectionUnreachable,
    /// The server answered `401 Unauthorized`.
    AuthenticationFailed,
    Timeout,
    /// The session was closed while the operation was pending.
    SessionClosed,
    /// The server answered with a non-success status other than `401`.
    HttpStatus(StatusCode),
    /// The response did not have the expected shape.
    MalformedResponse(String),
    StreamExtractionFailed(String),
    /// Input that could not be turned into a request, such as an unparsable time or resolution.
    InvalidInput(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ConnectionUnreachable => write!(f, "server unreachable"),
            Error::AuthenticationFailed => {
                write!(f, "authentication failed, check username and password")
            }
            Error::Timeout => write!(f, "timed out"),
            Error::SessionClosed => write!(f, "session closed"),
            Error::HttpStatus(status) => write!(f, "unexpected status {status}"),
            Error::MalformedResponse(detail) => write!(f, "malformed response: {detail}"),
            Error::StreamExtractionFailed(detail) => write!(f, "{detail}"),
            Error::InvalidInput(detail) => write!(f, "invalid input: {detail}"),
        }
    }
}

impl std::error::Error for Error {}

/// Attach the matching [`Error`] to an error raised by the transport.
pub(crate) fn from_transport(e: reqwest::Error) -> anyhow::Error {
    let kind = if e.is_timeout() {
        Error::Timeout
    } else if e.is_connect() {
        Error::ConnectionUnreachable
    } else if let Some(status) = e.status() {
        from_status(status)
    } else {
        return anyhow!(e);
    };
    anyhow::Error::new(e).context(kind)
}

pub(crate) fn from_status(status: StatusCode) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::AuthenticationFailed,
        status => Error::HttpStatus(status),
    }
}
