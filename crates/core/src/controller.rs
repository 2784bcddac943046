mod builder;
mod state;
#[cfg(test)]
mod tests;

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::Instrument;

pub use builder::ControllerBuilder;
use state::{Command, ControllerState, run_controller};

use crate::session::{Session, Turn, ValidationError};

/// A type of error which can be returned whenever the controller has
/// been shut down.
pub struct ControllerClosed;

impl fmt::Debug for ControllerClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerClosed").finish()
    }
}

impl fmt::Display for ControllerClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "the controller has been shut down".fmt(f)
    }
}

impl Error for ControllerClosed {}

/// Why [`Controller::submit`] did not accept an input.
#[derive(Debug)]
pub enum SubmitError {
    /// The input is invalid, nothing was queued.
    Invalid(ValidationError),
    /// The controller has been shut down.
    Closed(ControllerClosed),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Invalid(err) => err.fmt(f),
            SubmitError::Closed(err) => err.fmt(f),
        }
    }
}

impl Error for SubmitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SubmitError::Invalid(err) => Some(err),
            SubmitError::Closed(err) => Some(err),
        }
    }
}

struct Mailbox {
    cmd_tx: mpsc::UnboundedSender<Command>,
    kill_tx: watch::Sender<bool>,
}

/// The owner of a chat [`Session`].
///
/// The session lives on a dedicated task, and every mutation of it happens
/// there, so the transcript has exactly one writer. The controller hands
/// each dispatched request to the transport on a separate task, and applies
/// the outcome when it comes back.
///
/// Inputs submitted while a reply is still outstanding are queued, and
/// dispatched one at a time in submission order once the session becomes
/// idle again. So there is never more than one request in flight, and each
/// request sees the answer to the previous one.
#[derive(Clone)]
pub struct Controller {
    mailbox: Arc<Mailbox>,
}

impl Controller {
    /// Submits a user input.
    ///
    /// The input is trimmed, and rejected right away if nothing is left.
    /// Otherwise it is queued, and the transcript changes once the
    /// controller task picks it up.
    pub fn submit<S: AsRef<str>>(&self, input: S) -> Result<(), SubmitError> {
        let input = input.as_ref().trim();
        if input.is_empty() {
            return Err(SubmitError::Invalid(ValidationError::EmptyInput));
        }
        self.mailbox
            .cmd_tx
            .send(Command::Submit(input.to_owned()))
            .map_err(|_| SubmitError::Closed(ControllerClosed))
    }

    /// Returns a snapshot of the transcript.
    pub async fn transcript(&self) -> Result<Vec<Turn>, ControllerClosed> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.mailbox
            .cmd_tx
            .send(Command::Transcript(reply_tx))
            .map_err(|_| ControllerClosed)?;
        reply_rx.await.map_err(|_| ControllerClosed)
    }

    /// Stops the controller.
    ///
    /// The controller is not guaranteed to stop immediately, but it will
    /// stop handling further commands and abort the outstanding request
    /// soon.
    #[inline]
    pub fn shutdown(&self) {
        self.mailbox.kill_tx.send(true).ok();
    }
}

impl Controller {
    fn spawn_from_builder(builder: ControllerBuilder) -> Self {
        let ControllerBuilder {
            transport_client,
            on_change,
            on_idle,
        } = builder;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = watch::channel(false);
        let state = ControllerState {
            transport_client,
            session: Session::new(),
            pending_inputs: Default::default(),
            running_task: None,
            self_tx: cmd_tx.downgrade(),
            on_change,
            on_idle,
        };
        tokio::spawn(
            run_controller(state, cmd_rx, kill_rx)
                .instrument(debug_span!("controller")),
        );

        Self {
            mailbox: Arc::new(Mailbox { cmd_tx, kill_tx }),
        }
    }
}
