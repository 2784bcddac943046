use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parley_model::{
    AssistantText, Transport, TransportError, TransportRequest,
};
use tokio::time::timeout;
use tracing::Instrument;

pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type SendResult = Result<AssistantText, TransportError>;
type BoxedSendFuture = Pin<Box<dyn Future<Output = SendResult> + Send>>;
type HandlerFn = Arc<dyn Fn(TransportRequest) -> BoxedSendFuture + Send + Sync>;

/// A wrapper around a transport that provides a type-erased interface for
/// the other modules, and bounds every exchange with a timeout.
#[derive(Clone)]
pub struct TransportClient {
    handler_fn: HandlerFn,
    request_timeout: Duration,
}

impl TransportClient {
    #[inline]
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        // We have to erase the type `T`, since `TransportClient` doesn't have
        // a generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = transport.send(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let result = fut.await;
                    match &result {
                        Ok(text) => trace!("got {} bytes of reply", text.len()),
                        Err(err) => debug!("transport failed: {err}"),
                    }
                    result
                }
                .instrument(trace_span!("transport req")),
            )
        });
        Self {
            handler_fn,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[inline]
    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Sends a request and waits for the reply, at most for the configured
    /// timeout.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. Dropping the future drops the underlying
    /// transport exchange.
    pub async fn send(&self, req: TransportRequest) -> SendResult {
        match timeout(self.request_timeout, (self.handler_fn)(req)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::timeout().with_detail(format!(
                "no reply within {:?}",
                self.request_timeout
            ))),
        }
    }
}
