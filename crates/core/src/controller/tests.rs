use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use parley_model::{
    AssistantText, ChatMessage, Role, Transport, TransportError,
    TransportRequest,
};
use parley_test_transport::{PresetReply, TestTransport};
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::*;
use crate::session::{ERROR_TEXT, PENDING_TEXT, TurnStatus};

fn spawn_controller(
    builder: ControllerBuilder,
) -> (Controller, mpsc::UnboundedReceiver<()>) {
    let (idle_tx, idle_rx) = mpsc::unbounded_channel();
    let controller = builder
        .on_idle(move || {
            idle_tx.send(()).ok();
        })
        .build();
    (controller, idle_rx)
}

async fn wait_idle(idle_rx: &mut mpsc::UnboundedReceiver<()>) {
    timeout(Duration::from_millis(500), idle_rx.recv())
        .await
        .unwrap()
        .unwrap();
}

/// Panics on the first exchange, and answers normally afterwards.
#[derive(Clone, Default)]
struct FlakyTransport {
    calls: Arc<AtomicUsize>,
}

impl Transport for FlakyTransport {
    fn send(
        &self,
        _req: &TransportRequest,
    ) -> impl Future<Output = Result<AssistantText, TransportError>> + Send + 'static
    {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if call == 0 {
                panic!("transport blew up");
            }
            Ok("Recovered.".to_owned())
        }
    }
}

#[tokio::test]
async fn test_simple_message() {
    let transport = TestTransport::with_replies([PresetReply::text("**Hi**")]);
    let (controller, mut idle_rx) =
        spawn_controller(ControllerBuilder::with_transport(transport));

    controller.submit("Hello").unwrap();
    wait_idle(&mut idle_rx).await;

    let turns = controller.transcript().await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role(), Role::User);
    assert_eq!(turns[0].text(), "Hello");
    assert_eq!(turns[1].role(), Role::Assistant);
    assert_eq!(turns[1].text(), "<strong>Hi</strong>");
    assert_eq!(turns[1].status(), TurnStatus::Complete);
}

#[tokio::test]
async fn test_empty_input() {
    let transport = TestTransport::default();
    let (controller, _idle_rx) =
        spawn_controller(ControllerBuilder::with_transport(transport.clone()));

    for input in ["", "   "] {
        assert!(matches!(
            controller.submit(input),
            Err(SubmitError::Invalid(ValidationError::EmptyInput))
        ));
    }
    assert!(controller.transcript().await.unwrap().is_empty());
    assert!(transport.received_requests().is_empty());
}

#[tokio::test]
async fn test_failure_then_recovery() {
    let transport = TestTransport::with_replies([
        PresetReply::status(500),
        PresetReply::text("Back online."),
    ]);
    let (controller, mut idle_rx) =
        spawn_controller(ControllerBuilder::with_transport(transport));

    controller.submit("test").unwrap();
    wait_idle(&mut idle_rx).await;
    let turns = controller.transcript().await.unwrap();
    assert_eq!(turns[1].text(), ERROR_TEXT);
    assert_eq!(turns[1].status(), TurnStatus::Failed);

    controller.submit("again").unwrap();
    wait_idle(&mut idle_rx).await;
    let turns = controller.transcript().await.unwrap();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[3].text(), "Back online.");
}

#[tokio::test]
async fn test_queued_inputs_are_serialized() {
    let mut transport = TestTransport::with_replies([
        PresetReply::text("one"),
        PresetReply::text("two"),
        PresetReply::text("three"),
    ]);
    transport.set_delay(Duration::from_millis(5));
    let (controller, mut idle_rx) =
        spawn_controller(ControllerBuilder::with_transport(transport.clone()));

    controller.submit("first").unwrap();
    controller.submit("second").unwrap();
    controller.submit("third").unwrap();
    wait_idle(&mut idle_rx).await;

    let texts: Vec<_> = controller
        .transcript()
        .await
        .unwrap()
        .iter()
        .map(|t| t.text().to_owned())
        .collect();
    assert_eq!(texts, ["first", "one", "second", "two", "third", "three"]);

    let requests = transport.received_requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(
        requests[1].messages,
        vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("one"),
            ChatMessage::user("second"),
        ]
    );
    for request in &requests {
        assert!(request.messages.iter().all(|m| m.text != PENDING_TEXT));
    }
}

#[tokio::test]
async fn test_change_notifications() {
    let transport = TestTransport::with_replies([PresetReply::text("Hi")]);
    let snapshots = Arc::new(Mutex::new(Vec::<Vec<Turn>>::new()));
    let builder = ControllerBuilder::with_transport(transport).on_change({
        let snapshots = Arc::clone(&snapshots);
        move |turns| {
            snapshots.lock().unwrap().push(turns.to_vec());
        }
    });
    let (controller, mut idle_rx) = spawn_controller(builder);

    controller.submit("Hello").unwrap();
    wait_idle(&mut idle_rx).await;

    let snapshots = snapshots.lock().unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].len(), 2);
    assert!(snapshots[0][1].is_pending());
    assert_eq!(snapshots[1].len(), 2);
    assert_eq!(snapshots[1][1].text(), "Hi");
}

#[tokio::test(start_paused = true)]
async fn test_request_timeout() {
    let mut transport =
        TestTransport::with_replies([PresetReply::text("too late")]);
    transport.set_delay(Duration::from_secs(120));
    let builder = ControllerBuilder::with_transport(transport)
        .with_request_timeout(Duration::from_secs(1));
    let (controller, mut idle_rx) = spawn_controller(builder);

    controller.submit("Hello").unwrap();
    timeout(Duration::from_secs(5), idle_rx.recv())
        .await
        .unwrap()
        .unwrap();

    let turns = controller.transcript().await.unwrap();
    assert_eq!(turns[1].text(), ERROR_TEXT);
}

#[tokio::test]
async fn test_shutdown() {
    let mut transport = TestTransport::with_replies([PresetReply::text("Hi")]);
    transport.set_delay(Duration::from_secs(60));
    let (controller, _idle_rx) =
        spawn_controller(ControllerBuilder::with_transport(transport));

    controller.submit("Hello").unwrap();
    controller.shutdown();

    assert!(controller.transcript().await.is_err());
    // Give the loop a chance to terminate and drop its receiver.
    tokio::task::yield_now().await;
    assert!(matches!(
        controller.submit("Anyone?"),
        Err(SubmitError::Closed(_))
    ));
}

#[tokio::test]
async fn test_panicking_transport_resolves_turn() {
    let transport = FlakyTransport::default();
    let (controller, mut idle_rx) =
        spawn_controller(ControllerBuilder::with_transport(transport.clone()));

    controller.submit("first").unwrap();
    controller.submit("second").unwrap();
    wait_idle(&mut idle_rx).await;

    let turns = controller.transcript().await.unwrap();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[1].text(), ERROR_TEXT);
    assert_eq!(turns[1].status(), TurnStatus::Failed);
    assert_eq!(turns[3].text(), "Recovered.");
    assert_eq!(turns[3].status(), TurnStatus::Complete);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}
