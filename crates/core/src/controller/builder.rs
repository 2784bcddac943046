use std::time::Duration;

use parley_model::Transport;

use super::Controller;
use crate::session::Turn;
use crate::transport_client::TransportClient;

pub(crate) type OnChange = Box<dyn Fn(&[Turn]) + Send + Sync>;
pub(crate) type OnIdle = Box<dyn Fn() + Send + Sync>;

/// [`Controller`] builder.
pub struct ControllerBuilder {
    pub(crate) transport_client: TransportClient,
    pub(crate) on_change: Option<OnChange>,
    pub(crate) on_idle: Option<OnIdle>,
}

impl ControllerBuilder {
    /// Creates a new builder with the specified transport.
    #[inline]
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self {
            transport_client: TransportClient::new(transport),
            on_change: None,
            on_idle: None,
        }
    }

    /// Sets how long to wait for a reply before the turn fails.
    ///
    /// Defaults to 30 seconds.
    #[inline]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.transport_client = self.transport_client.with_timeout(timeout);
        self
    }

    /// Attaches a callback to be invoked whenever the transcript changes.
    ///
    /// This is where a renderer hooks in. The callback runs on the
    /// controller task, so it should return quickly.
    #[inline]
    pub fn on_change(
        mut self,
        on_change: impl Fn(&[Turn]) + Send + Sync + 'static,
    ) -> Self {
        self.on_change = Some(Box::new(on_change));
        self
    }

    /// Attaches a callback to be invoked when the controller is idle, that
    /// is, no request is in flight and no input is queued.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Builds the controller.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[inline]
    pub fn build(self) -> Controller {
        Controller::spawn_from_builder(self)
    }
}
