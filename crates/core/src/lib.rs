//! Core logic of a chat session: the transcript state machine, the
//! controller that owns it, and the formatter for assistant replies.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod controller;
pub mod format;
pub mod session;
mod transport_client;

pub use controller::{
    Controller, ControllerBuilder, ControllerClosed, SubmitError,
};
pub use format::{Markup, format};
pub use session::{
    Dispatch, RequestId, Session, Turn, TurnStatus, ValidationError,
};
