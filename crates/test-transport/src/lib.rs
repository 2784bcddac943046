//! A local fake transport for testing purpose.

#![deny(missing_docs)]

mod preset;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use parley_model::{
    AssistantText, Role, Transport, TransportError, TransportRequest,
};
use tokio::time::sleep;

pub use preset::*;

/// A local fake transport for testing purpose.
///
/// Before sending requests, you need to setup the reply script, which is
/// how the assistant should answer each user turn. The reply is selected
/// according to the number of user messages in the request history, so the
/// first user turn gets the first reply, and so on. If there are no enough
/// replies in the script, a malformed-response error will be returned.
///
/// Every request is recorded, and can be inspected later with
/// [`TestTransport::received_requests`].
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestTransport {
    script: Vec<PresetReply>,
    delay: Option<Duration>,
    received: Arc<Mutex<Vec<TransportRequest>>>,
}

impl TestTransport {
    /// Creates a transport with the given reply script.
    #[inline]
    pub fn with_replies(replies: impl Into<Vec<PresetReply>>) -> Self {
        Self {
            script: replies.into(),
            ..Default::default()
        }
    }

    /// Sets how long every exchange takes before the reply is delivered.
    ///
    /// Defaults to 1 millisecond.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns a copy of every request received so far.
    pub fn received_requests(&self) -> Vec<TransportRequest> {
        self.received
            .lock()
            .map(|received| received.clone())
            .unwrap_or_default()
    }
}

impl Transport for TestTransport {
    fn send(
        &self,
        req: &TransportRequest,
    ) -> impl Future<Output = Result<AssistantText, TransportError>> + Send + 'static
    {
        if let Ok(mut received) = self.received.lock() {
            received.push(req.clone());
        }

        let user_turns = req
            .messages
            .iter()
            .filter(|msg| msg.role == Role::User)
            .count();
        let result = match user_turns
            .checked_sub(1)
            .and_then(|idx| self.script.get(idx))
        {
            Some(reply) => reply.to_result(),
            None => Err(TransportError::malformed_response()
                .with_detail("no enough replies")),
        };
        let delay = self.delay.unwrap_or(Duration::from_millis(1));

        async move {
            sleep(delay).await;
            result
        }
    }
}
