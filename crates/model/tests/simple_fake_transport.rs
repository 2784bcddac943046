use std::time::Duration;

use parley_model::{
    AssistantText, ChatMessage, ErrorKind, Role, Transport, TransportError,
    TransportRequest,
};
use tokio::time::sleep;

/// Echoes the last user message back after a short nap.
struct EchoTransport;

impl Transport for EchoTransport {
    fn send(
        &self,
        req: &TransportRequest,
    ) -> impl Future<Output = Result<AssistantText, TransportError>> + Send + 'static
    {
        let last_user = req
            .messages
            .iter()
            .rev()
            .find(|msg| msg.role == Role::User)
            .map(|msg| msg.text.clone());

        async move {
            sleep(Duration::from_millis(1)).await;
            match last_user {
                Some(text) => Ok(format!("You said {text}")),
                None => Err(TransportError::malformed_response()
                    .with_detail("nothing to echo")),
            }
        }
    }
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo() {
        let transport = EchoTransport;
        let req = TransportRequest {
            messages: vec![
                ChatMessage::user("Good morning"),
                ChatMessage::assistant("Morning!"),
                ChatMessage::user("How are you?"),
            ],
        };
        let answer = transport.send(&req).await.unwrap();
        assert_eq!(answer, "You said How are you?");
    }

    #[tokio::test]
    async fn test_error() {
        let transport = EchoTransport;
        let err = transport
            .send(&TransportRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
        assert_eq!(err.detail(), "nothing to echo");
    }

    #[test]
    fn test_serialize_message() {
        let msg = ChatMessage::assistant("Hi");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "role": "assistant", "text": "Hi" })
        );
    }
}
