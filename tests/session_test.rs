//! Integrationstests für den Call Session Controller
//! gegen das simulierte Calling-SDK.

use deskphone::sdk::SimulatedSdk;
use deskphone::token::StaticTokenProvider;
use deskphone::{CallSessionController, SessionError, SessionEvent, SessionPhase};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;

fn new_controller(sdk: &Arc<SimulatedSdk>) -> CallSessionController {
    CallSessionController::new(
        Arc::clone(sdk) as Arc<dyn deskphone::sdk::CallingClient>,
        Arc::new(StaticTokenProvider::new("test-token")),
    )
}

async fn wait_for(
    rx: &mut broadcast::Receiver<SessionEvent>,
    pred: impl Fn(&SessionEvent) -> bool,
) -> SessionEvent {
    timeout(Duration::from_secs(1), async {
        loop {
            let event = rx.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

#[tokio::test]
async fn initialization_disables_hang_up() {
    let sdk = Arc::new(SimulatedSdk::new());
    let controller = new_controller(&sdk);
    let mut events = controller.subscribe();

    controller.initialize().await.unwrap();

    assert!(!controller.hang_up_enabled());
    assert_eq!(controller.phase(), SessionPhase::Idle);
    wait_for(&mut events, |e| matches!(e, SessionEvent::Initialized)).await;
}

#[tokio::test]
async fn incoming_call_is_auto_accepted_and_hung_up() {
    let sdk = Arc::new(SimulatedSdk::new());
    let controller = new_controller(&sdk);
    let mut events = controller.subscribe();
    controller.initialize().await.unwrap();

    let call_id = sdk.ring();
    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::CallAccepted { call_id: id } if *id == call_id)
    })
    .await;

    assert!(controller.hang_up_enabled());
    assert_eq!(
        controller.phase(),
        SessionPhase::Active {
            call_id: call_id.clone()
        }
    );
    assert_eq!(controller.current_call_id(), Some(call_id.clone()));

    controller.hang_up().await.unwrap();

    let requests = sdk.hang_up_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, call_id);
    assert!(requests[0].1.for_everyone);

    assert!(!controller.hang_up_enabled());
    assert_eq!(controller.phase(), SessionPhase::Idle);
    assert_eq!(controller.current_call_id(), None);
}

#[tokio::test]
async fn second_incoming_call_wins() {
    let sdk = Arc::new(SimulatedSdk::new());
    let controller = new_controller(&sdk);
    let mut events = controller.subscribe();
    controller.initialize().await.unwrap();

    let first = sdk.ring();
    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::CallAccepted { call_id } if *call_id == first)
    })
    .await;

    let second = sdk.ring();
    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::CallAccepted { call_id } if *call_id == second)
    })
    .await;

    // Last-write-wins: nur der zweite Anruf wird noch verfolgt
    assert_eq!(controller.current_call_id(), Some(second.clone()));
    assert!(controller.hang_up_enabled());

    controller.hang_up().await.unwrap();

    let requests = sdk.hang_up_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, second);
}

#[tokio::test]
async fn failed_accept_leaves_control_unchanged() {
    let sdk = Arc::new(SimulatedSdk::new().with_accept_failure());
    let controller = new_controller(&sdk);
    let mut events = controller.subscribe();
    controller.initialize().await.unwrap();

    sdk.ring();
    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::IncomingCall { .. })
    })
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!controller.hang_up_enabled());
    assert_eq!(controller.phase(), SessionPhase::Idle);
    assert_eq!(controller.current_call_id(), None);
}

#[tokio::test]
async fn hang_up_twice_reports_no_active_call() {
    let sdk = Arc::new(SimulatedSdk::new());
    let controller = new_controller(&sdk);
    let mut events = controller.subscribe();
    controller.initialize().await.unwrap();

    let call_id = sdk.ring();
    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::CallAccepted { call_id: id } if *id == call_id)
    })
    .await;

    controller.hang_up().await.unwrap();
    assert!(matches!(
        controller.hang_up().await,
        Err(SessionError::NoActiveCall)
    ));

    // Kein zweiter Beenden-Versuch gegen das SDK
    assert_eq!(sdk.hang_up_requests().len(), 1);
    assert!(!controller.hang_up_enabled());
}

#[tokio::test]
async fn denied_permission_leaves_session_uninitialized() {
    let sdk = Arc::new(SimulatedSdk::new().with_permission_denied());
    let controller = new_controller(&sdk);
    let mut events = controller.subscribe();

    let result = controller.initialize().await;
    assert!(matches!(result, Err(SessionError::Setup(_))));

    let event = wait_for(&mut events, |e| {
        matches!(e, SessionEvent::SetupFailed { .. })
    })
    .await;
    if let SessionEvent::SetupFailed { alert } = event {
        assert!(!alert.is_empty());
    }

    assert_eq!(controller.phase(), SessionPhase::Uninitialized);
    assert!(!controller.hang_up_enabled());

    // Kein Listener registriert: ein Anruf bleibt folgenlos
    sdk.ring();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(controller.phase(), SessionPhase::Uninitialized);
    assert_eq!(controller.current_call_id(), None);
}

#[tokio::test]
async fn rejected_credential_leaves_session_uninitialized() {
    let sdk = Arc::new(SimulatedSdk::new().with_auth_failure());
    let controller = new_controller(&sdk);
    let mut events = controller.subscribe();

    assert!(matches!(
        controller.initialize().await,
        Err(SessionError::Setup(_))
    ));
    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::SetupFailed { .. })
    })
    .await;

    assert_eq!(controller.phase(), SessionPhase::Uninitialized);
    assert!(!controller.hang_up_enabled());
}

#[tokio::test]
async fn failed_hang_up_still_disables_control() {
    let sdk = Arc::new(SimulatedSdk::new().with_hang_up_failure());
    let controller = new_controller(&sdk);
    let mut events = controller.subscribe();
    controller.initialize().await.unwrap();

    let call_id = sdk.ring();
    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::CallAccepted { call_id: id } if *id == call_id)
    })
    .await;

    // Der SDK-Fehler wird nur protokolliert
    controller.hang_up().await.unwrap();

    assert_eq!(sdk.hang_up_requests().len(), 1);
    assert!(!controller.hang_up_enabled());
    assert_eq!(controller.phase(), SessionPhase::Idle);
    assert_eq!(controller.current_call_id(), None);
}
