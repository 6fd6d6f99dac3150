//! MOSS failure classification.

use std::io;

use thiserror::Error;

/// Retry-relevant class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transient; worth retrying after a backoff.
    Recoverable,
    /// Will not go away by retrying.
    Fatal,
    /// Not understood. Never retried, always logged with context.
    Unclassified,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Recoverable => "recoverable",
            FailureKind::Fatal => "fatal",
            FailureKind::Unclassified => "unclassified",
        }
    }
}

/// Errors from the MOSS submit and report operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MossError {
    #[error("MOSS temporarily unavailable: {0}")]
    Recoverable(String),

    #[error("MOSS rejected the request: {0}")]
    Fatal(String),

    #[error("Unexpected MOSS failure: {0}")]
    Unclassified(String),
}

impl MossError {
    pub fn recoverable(msg: impl Into<String>) -> Self {
        Self::Recoverable(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    pub fn unclassified(msg: impl Into<String>) -> Self {
        Self::Unclassified(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            MossError::Recoverable(_) => FailureKind::Recoverable,
            MossError::Fatal(_) => FailureKind::Fatal,
            MossError::Unclassified(_) => FailureKind::Unclassified,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind() == FailureKind::Recoverable
    }

    /// Classifies an I/O error raised on the MOSS socket.
    pub fn from_socket(context: &str, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::TimedOut
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::Interrupted => Self::Recoverable(format!("{}: {}", context, err)),
            _ => Self::Unclassified(format!("{}: {}", context, err)),
        }
    }

    /// Classifies a failed HTTP exchange with the report server.
    pub fn from_http(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status, &err.to_string());
        }
        if err.is_timeout() || err.is_connect() || err.is_body() || err.is_request() {
            Self::Recoverable(format!("report fetch failed: {}", err))
        } else if err.is_builder() || err.is_redirect() {
            Self::Fatal(format!("report request invalid: {}", err))
        } else {
            Self::Unclassified(format!("report fetch failed: {}", err))
        }
    }

    /// Maps a non-success HTTP status from the report server.
    pub fn from_status(status: reqwest::StatusCode, detail: &str) -> Self {
        if status.is_server_error()
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::REQUEST_TIMEOUT
        {
            Self::Recoverable(format!("report server returned {}: {}", status, detail))
        } else {
            Self::Fatal(format!("report server returned {}: {}", status, detail))
        }
    }
}
