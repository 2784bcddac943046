use crate::error::TransportError;
use crate::request::TransportRequest;

/// The text of an assistant answer, as extracted from the endpoint's reply.
pub type AssistantText = String;

/// A type that carries a conversation to a remote assistant and brings
/// back its answer.
///
/// Once the transport is created, it should behave like a stateless
/// object. It can still have internal state (a connection pool, for
/// example), but callers should not rely on it, and the transport should
/// be prepared for being dropped anytime.
///
/// Every call is a single attempt. Implementations must not retry
/// internally, the caller decides what to do with a failure.
pub trait Transport: Send + Sync {
    /// Sends the conversation and waits for the answer.
    ///
    /// The returned future must be fully independent of `self`.
    fn send(
        &self,
        req: &TransportRequest,
    ) -> impl Future<Output = Result<AssistantText, TransportError>> + Send + 'static;
}
