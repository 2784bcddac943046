use std::collections::VecDeque;

use parley_model::{AssistantText, TransportError};
use tokio::select;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::AbortHandle;

use super::builder::{OnChange, OnIdle};
use crate::session::{Dispatch, RequestId, Session, Turn};
use crate::transport_client::TransportClient;

#[derive(Debug)]
pub enum Command {
    Submit(String),
    TransportFinished {
        id: RequestId,
        result: Result<AssistantText, TransportError>,
    },
    Transcript(oneshot::Sender<Vec<Turn>>),
}

pub struct ControllerState {
    pub(super) transport_client: TransportClient,
    pub(super) session: Session,
    pub(super) pending_inputs: VecDeque<String>,
    pub(super) running_task: Option<AbortHandle>,
    // Weak, so that the loop ends once every `Controller` handle is gone.
    pub(super) self_tx: mpsc::WeakUnboundedSender<Command>,
    pub(super) on_change: Option<OnChange>,
    pub(super) on_idle: Option<OnIdle>,
}

impl ControllerState {
    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Submit(input) => self.enqueue_input(input),
            Command::TransportFinished { id, result } => {
                self.running_task = None;
                if self.session.on_transport_result(id, result) {
                    self.notify_change();
                }
                self.process_next_input();
            }
            Command::Transcript(reply_tx) => {
                reply_tx.send(self.session.transcript_view().to_vec()).ok();
            }
        }
    }

    #[inline]
    fn enqueue_input(&mut self, input: String) {
        if self.session.is_in_flight() {
            // Wait for the outstanding reply, the input will be picked up
            // when the session becomes idle.
            trace!(
                "queued an input, {} waiting",
                self.pending_inputs.len() + 1
            );
            self.pending_inputs.push_back(input);
            return;
        }
        self.process_input_checked(input);
    }

    fn process_next_input(&mut self) {
        if self.session.is_in_flight() {
            return;
        }
        match self.pending_inputs.pop_front() {
            Some(input) => self.process_input_checked(input),
            None => {
                if let Some(on_idle) = &self.on_idle {
                    on_idle();
                }
            }
        }
    }

    /// Process the input string, assuming the session is idle.
    fn process_input_checked(&mut self, input: String) {
        let Dispatch { id, request } = match self.session.submit(&input) {
            Ok(dispatch) => dispatch,
            Err(err) => {
                warn!("dropped an input: {err}");
                self.process_next_input();
                return;
            }
        };
        self.notify_change();

        let transport_client = self.transport_client.clone();
        let exchange =
            tokio::spawn(async move { transport_client.send(request).await });
        self.running_task = Some(exchange.abort_handle());

        // The pending turn resolves even if the transport panics.
        let self_tx = self.self_tx.clone();
        tokio::spawn(async move {
            let result = match exchange.await {
                Ok(result) => result,
                Err(err) if err.is_cancelled() => return,
                Err(err) => {
                    error!(%id, "transport task failed: {err}");
                    Err(TransportError::network_failure()
                        .with_detail(format!("transport task failed: {err}")))
                }
            };
            let Some(self_tx) = self_tx.upgrade() else {
                debug!(%id, "controller has gone, discard the result");
                return;
            };
            self_tx.send(Command::TransportFinished { id, result }).ok();
        });
    }

    #[inline]
    fn notify_change(&self) {
        if let Some(on_change) = &self.on_change {
            on_change(self.session.transcript_view());
        }
    }

    fn abort_running_task(&mut self) {
        if let Some(task) = self.running_task.take() {
            task.abort();
        }
    }
}

pub async fn run_controller(
    mut state: ControllerState,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    mut kill_rx: watch::Receiver<bool>,
) {
    debug!("started");
    loop {
        let cmd = select! {
            biased;

            _ = kill_rx.changed() => {
                break;
            }
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    break;
                };
                cmd
            }
        };
        trace!("received command: {cmd:?}");

        let proc_span = trace_span!("proc cmd");
        proc_span.in_scope(|| {
            state.handle(cmd);
            trace!("finished");
        });
    }
    state.abort_running_task();
    debug!("will terminate");
}
