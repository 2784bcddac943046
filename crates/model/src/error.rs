use std::borrow::Cow;
use std::error::Error;
use std::fmt::{self, Display};

/// The kind of transport failure that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The endpoint could not be reached, or the connection broke.
    NetworkFailure,
    /// The endpoint answered with a non-success status.
    NonSuccessStatus,
    /// The endpoint answered, but the answer text could not be found.
    MalformedResponse,
    /// No answer arrived in time.
    Timeout,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NetworkFailure => write!(f, "Network failure"),
            ErrorKind::NonSuccessStatus => write!(f, "Non-success status"),
            ErrorKind::MalformedResponse => write!(f, "Malformed response"),
            ErrorKind::Timeout => write!(f, "Timed out"),
        }
    }
}

/// Describes a failed exchange with the remote assistant.
///
/// The detail is meant for logs. It is never shown to the person chatting.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TransportError {
    kind: ErrorKind,
    status: Option<u16>,
    detail: Option<String>,
}

impl TransportError {
    #[inline]
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            status: None,
            detail: None,
        }
    }

    /// Creates a new error with the `NetworkFailure` kind.
    #[inline]
    pub fn network_failure() -> Self {
        Self::new(ErrorKind::NetworkFailure)
    }

    /// Creates a new error with the `NonSuccessStatus` kind.
    #[inline]
    pub fn non_success_status(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::new(ErrorKind::NonSuccessStatus)
        }
    }

    /// Creates a new error with the `MalformedResponse` kind.
    #[inline]
    pub fn malformed_response() -> Self {
        Self::new(ErrorKind::MalformedResponse)
    }

    /// Creates a new error with the `Timeout` kind.
    #[inline]
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Attaches a detail message to the error.
    #[inline]
    pub fn with_detail<S: Into<String>>(self, detail: S) -> Self {
        Self {
            detail: Some(detail.into()),
            ..self
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the HTTP status, if the endpoint answered with one.
    #[inline]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the detail of the error, falling back to the kind.
    #[inline]
    pub fn detail(&self) -> Cow<'_, str> {
        match self.detail.as_deref() {
            Some(detail) => Cow::Borrowed(detail),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, &self.detail) {
            (Some(status), Some(detail)) => {
                write!(f, "{} ({status}): {detail}", self.kind)
            }
            (Some(status), None) => write!(f, "{} ({status})", self.kind),
            (None, Some(detail)) => write!(f, "{}: {detail}", self.kind),
            (None, None) => write!(f, "{}", self.kind),
        }
    }
}

impl Error for TransportError {}
