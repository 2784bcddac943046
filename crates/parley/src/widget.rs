use std::time::Duration;

use parley_core::{
    Controller, ControllerBuilder, ControllerClosed, SubmitError, Turn,
};
use parley_model::Transport;

use crate::render::html::render_transcript;

/// A chat widget builder.
///
/// See [`ChatWidget`].
pub struct ChatWidgetBuilder {
    controller_builder: ControllerBuilder,
}

impl ChatWidgetBuilder {
    /// Creates a widget builder with a specified transport.
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        let controller_builder = ControllerBuilder::with_transport(transport);
        Self { controller_builder }
    }

    /// Sets how long to wait for a reply before the turn fails.
    #[inline]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.controller_builder =
            self.controller_builder.with_request_timeout(timeout);
        self
    }

    /// Attaches a callback to be invoked when the widget is idle.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.controller_builder = self.controller_builder.on_idle(on_idle);
        self
    }

    /// Attaches a callback to be invoked whenever the transcript changes.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&[Turn]) + Send + Sync + 'static,
    ) -> Self {
        self.controller_builder =
            self.controller_builder.on_change(on_transcript);
        self
    }

    /// Attaches a callback that receives the freshly rendered HTML of the
    /// whole transcript whenever it changes.
    ///
    /// This replaces any callback set by [`Self::on_transcript`].
    #[inline]
    pub fn on_render(
        mut self,
        on_render: impl Fn(String) + Send + Sync + 'static,
    ) -> Self {
        self.controller_builder =
            self.controller_builder.on_change(move |turns| {
                on_render(render_transcript(turns));
            });
        self
    }

    /// Builds a new widget.
    ///
    /// This must be called within a tokio runtime.
    pub fn build(self) -> ChatWidget {
        let controller = self.controller_builder.build();
        ChatWidget { controller }
    }
}

/// A chat widget, like a window that displays messages and has an input box.
///
/// The widget holds a fully configured session controller that you can use
/// directly, and it is basically a wrapper around [`Controller`].
pub struct ChatWidget {
    controller: Controller,
}

impl ChatWidget {
    /// Sends a message to the widget.
    #[inline]
    pub fn send_message(&self, message: &str) -> Result<(), SubmitError> {
        self.controller.submit(message)
    }

    /// Returns a snapshot of the transcript.
    #[inline]
    pub async fn transcript(&self) -> Result<Vec<Turn>, ControllerClosed> {
        self.controller.transcript().await
    }

    /// Returns the transcript rendered as HTML.
    pub async fn render_html(&self) -> Result<String, ControllerClosed> {
        let turns = self.controller.transcript().await?;
        Ok(render_transcript(&turns))
    }

    /// Returns the underlying controller.
    #[inline]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }
}

impl Drop for ChatWidget {
    fn drop(&mut self) {
        debug!("widget dropped, shutting down the controller");
        self.controller.shutdown();
    }
}
