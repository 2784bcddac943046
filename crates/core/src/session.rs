//! The transcript and its turn lifecycle.
//!
//! A [`Session`] oscillates between idle and awaiting a reply:
//!
//! ```text
//! Idle --submit--> Awaiting --on_transport_result--> Idle
//! ```
//!
//! While awaiting, the last turn of the transcript is a pending assistant
//! turn holding [`PENDING_TEXT`]. It is replaced in place once the reply (or
//! the failure) arrives, and the transcript never grows or shrinks at that
//! point.

use std::error::Error;
use std::fmt::{self, Display};

use parley_model::{
    AssistantText, ChatMessage, Role, TransportError, TransportRequest,
};
use serde::Serialize;

use crate::format::format_reply;

/// Sentinel text of an assistant turn awaiting its reply.
pub const PENDING_TEXT: &str = "Thinking...";

/// Text shown in place of a reply when the exchange failed.
pub const ERROR_TEXT: &str = "An error occurred. Please try again later.";

/// Text shown in place of a reply that came back empty.
pub const NOT_UNDERSTOOD_TEXT: &str =
    "Sorry, I could not understand that. Could you rephrase it?";

/// Where a turn is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    /// An assistant turn awaiting its reply.
    Pending,
    /// A user turn, or an assistant turn that got its reply.
    Complete,
    /// An assistant turn whose exchange failed.
    Failed,
}

/// One entry in the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Turn {
    role: Role,
    text: String,
    #[serde(skip)]
    raw: String,
    status: TurnStatus,
}

impl Turn {
    fn user(text: &str) -> Self {
        Self {
            role: Role::User,
            text: text.to_owned(),
            raw: text.to_owned(),
            status: TurnStatus::Complete,
        }
    }

    fn pending() -> Self {
        Self {
            role: Role::Assistant,
            text: PENDING_TEXT.to_owned(),
            raw: String::new(),
            status: TurnStatus::Pending,
        }
    }

    /// Returns the author of this turn.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the display text of this turn.
    ///
    /// For user turns this is the trimmed input. For resolved assistant
    /// turns this is formatter markup, which must be sanitized before it is
    /// inserted into a page.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the text without display markup, as sent to the endpoint.
    #[inline]
    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    /// Returns the lifecycle status of this turn.
    #[inline]
    pub fn status(&self) -> TurnStatus {
        self.status
    }

    /// Returns `true` if this is an assistant turn awaiting its reply.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == TurnStatus::Pending
    }
}

/// Identifies one outbound request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

/// A request that the caller must now hand to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dispatch {
    /// Pass this back to [`Session::on_transport_result`].
    pub id: RequestId,
    /// The history to send, without the pending turn.
    pub request: TransportRequest,
}

/// Why a submission was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValidationError {
    /// The input is empty after trimming.
    EmptyInput,
    /// Another request is still outstanding.
    InFlight,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyInput => write!(f, "input is empty"),
            ValidationError::InFlight => {
                write!(f, "a request is already in flight")
            }
        }
    }
}

impl Error for ValidationError {}

/// An ordered chat transcript with at most one outstanding request.
///
/// The session is a plain state machine. It performs no I/O by itself, the
/// owner forwards each [`Dispatch`] to a transport and feeds the outcome
/// back through [`Session::on_transport_result`].
#[derive(Clone, Debug, Default)]
pub struct Session {
    transcript: Vec<Turn>,
    in_flight: Option<RequestId>,
    next_request_id: u64,
}

impl Session {
    /// Creates an empty session.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new turn with the given user input.
    ///
    /// On success, a user turn and a pending assistant turn are appended,
    /// and the returned [`Dispatch`] carries the history to send. Nothing
    /// changes when the input is rejected.
    pub fn submit(
        &mut self,
        raw_text: &str,
    ) -> Result<Dispatch, ValidationError> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyInput);
        }
        if self.in_flight.is_some() {
            return Err(ValidationError::InFlight);
        }

        self.transcript.push(Turn::user(text));
        let request = self.history();
        self.transcript.push(Turn::pending());

        self.next_request_id += 1;
        let id = RequestId(self.next_request_id);
        self.in_flight = Some(id);
        debug!(%id, "dispatching {} messages", request.messages.len());

        Ok(Dispatch { id, request })
    }

    /// Resolves the pending turn with the outcome of request `id`.
    ///
    /// Returns `false` without touching anything if `id` is not the
    /// outstanding request, which makes repeated or stale deliveries
    /// harmless.
    pub fn on_transport_result(
        &mut self,
        id: RequestId,
        result: Result<AssistantText, TransportError>,
    ) -> bool {
        if self.in_flight != Some(id) {
            debug!(%id, "ignoring result of a request that is not in flight");
            return false;
        }
        self.in_flight = None;

        let pending = self.transcript.iter_mut().rev().find(|t| t.is_pending());
        let Some(turn) = pending else {
            warn!(%id, "no pending turn to resolve");
            return false;
        };

        match result {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    warn!(%id, "got an empty reply");
                    turn.text = NOT_UNDERSTOOD_TEXT.to_owned();
                    turn.raw = NOT_UNDERSTOOD_TEXT.to_owned();
                } else {
                    turn.text = format_reply(text).into_string();
                    turn.raw = text.to_owned();
                }
                turn.status = TurnStatus::Complete;
            }
            Err(err) => {
                error!(%id, kind = ?err.kind(), "request failed: {err}");
                turn.text = ERROR_TEXT.to_owned();
                turn.raw = ERROR_TEXT.to_owned();
                turn.status = TurnStatus::Failed;
            }
        }
        true
    }

    /// Returns the transcript, including the pending turn if any.
    #[inline]
    pub fn transcript_view(&self) -> &[Turn] {
        &self.transcript
    }

    /// Returns `true` while a request is outstanding.
    #[inline]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Returns the outstanding request, if any.
    #[inline]
    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    /// Returns the number of turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    /// Returns `true` if no turn has been submitted yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    fn history(&self) -> TransportRequest {
        TransportRequest {
            messages: self
                .transcript
                .iter()
                .filter(|t| !t.is_pending())
                .map(|t| ChatMessage {
                    role: t.role,
                    text: t.raw.clone(),
                })
                .collect(),
        }
    }
}
