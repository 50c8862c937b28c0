//! Call Session Controller
//!
//! Vermittelt zwischen App-Start, externem Calling-SDK und der
//! Oberfläche: initialisiert die Sitzung, nimmt eingehende Anrufe
//! automatisch an und beendet den aktiven Anruf auf Klick.

use crate::sdk::{
    CallAgent, CallConnection, CallingClient, DeviceManager, DevicePermission, HangUpOptions,
    IncomingCall, SdkError, TokenCredential,
};
use crate::token::{TokenError, TokenProvider};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to fetch access token: {0}")]
    Token(#[from] TokenError),

    #[error("session setup failed: {0}")]
    Setup(#[source] SdkError),

    #[error("failed to accept incoming call: {0}")]
    Accept(#[source] SdkError),

    #[error("no active call")]
    NoActiveCall,

    #[error("session already initialized")]
    AlreadyInitialized,
}

// ============================================================================
// SESSION PHASE
// ============================================================================

/// Expliziter Sitzungszustand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
    /// Noch nicht (erfolgreich) initialisiert.
    Uninitialized,
    /// Bereit, kein Anruf.
    Idle,
    /// Eingehender Anruf wird gerade angenommen.
    Ringing { call_id: String },
    /// Anruf aktiv.
    Active { call_id: String },
}

// ============================================================================
// SESSION EVENTS
// ============================================================================

/// Events für die Oberfläche.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Sitzung bereit, Agent lauscht auf eingehende Anrufe.
    Initialized,
    /// Initialisierung fehlgeschlagen; die Oberfläche zeigt den Text
    /// als blockierenden Hinweis an.
    SetupFailed { alert: String },
    /// Eingehender Anruf gemeldet.
    IncomingCall { call_id: String },
    /// Anruf angenommen.
    CallAccepted { call_id: String },
    /// Auflegen-Schaltfläche aktiviert/deaktiviert.
    HangUpControl { enabled: bool },
    /// Auflegen wurde angefordert, Anruf ist beendet.
    CallEnded { call_id: String },
}

// ============================================================================
// CALL SESSION CONTROLLER
// ============================================================================

/// Steuert genau eine Anruf-Sitzung.
///
/// Hält Agent, Device-Manager und den aktuell verfolgten Anruf als
/// Felder statt als globale Referenzen und ist damit gegen ein
/// simuliertes SDK isoliert testbar.
pub struct CallSessionController {
    sdk: Arc<dyn CallingClient>,
    tokens: Arc<dyn TokenProvider>,
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    phase: Mutex<SessionPhase>,
    // Agent und Device-Manager leben bis zum Ende der Sitzung
    #[allow(dead_code)]
    agent: Mutex<Option<Arc<dyn CallAgent>>>,
    #[allow(dead_code)]
    device_manager: Mutex<Option<Arc<dyn DeviceManager>>>,
    current_call: Mutex<Option<Arc<dyn CallConnection>>>,
    accepted_at: Mutex<Option<DateTime<Utc>>>,
    hang_up_enabled: AtomicBool,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl CallSessionController {
    pub fn new(sdk: Arc<dyn CallingClient>, tokens: Arc<dyn TokenProvider>) -> Self {
        let (event_tx, _) = broadcast::channel(64);

        Self {
            sdk,
            tokens,
            inner: Arc::new(ControllerInner {
                phase: Mutex::new(SessionPhase::Uninitialized),
                agent: Mutex::new(None),
                device_manager: Mutex::new(None),
                current_call: Mutex::new(None),
                accepted_at: Mutex::new(None),
                hang_up_enabled: AtomicBool::new(false),
                event_tx,
            }),
        }
    }

    /// Gibt einen Event-Receiver zurück.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Aktueller Sitzungszustand.
    pub fn phase(&self) -> SessionPhase {
        self.inner.phase.lock().clone()
    }

    /// Zustand der Auflegen-Schaltfläche.
    pub fn hang_up_enabled(&self) -> bool {
        self.inner.hang_up_enabled.load(Ordering::SeqCst)
    }

    /// ID des aktuell verfolgten Anrufs.
    pub fn current_call_id(&self) -> Option<String> {
        self.inner.current_call.lock().as_ref().map(|c| c.id())
    }

    /// Initialisiert die Sitzung (einmalig, beim App-Start).
    ///
    /// Ablauf: Token holen -> Agent erstellen -> Device-Manager holen ->
    /// Mikrofon-Berechtigung anfragen -> Anruf-Listener registrieren.
    /// Schlägt ein Schritt fehl, bleibt die Sitzung uninitialisiert;
    /// es gibt keinen Retry.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        if *self.inner.phase.lock() != SessionPhase::Uninitialized {
            return Err(SessionError::AlreadyInitialized);
        }

        match self.try_initialize().await {
            Ok(()) => {
                tracing::info!("Call session initialized, listening for incoming calls");
                self.inner.emit(SessionEvent::Initialized);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Session setup failed: {}", e);
                self.inner.emit(SessionEvent::SetupFailed {
                    alert: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn try_initialize(&self) -> Result<(), SessionError> {
        let token = self.tokens.fetch_token().await?;
        let credential = TokenCredential::new(token);

        let agent = self
            .sdk
            .create_agent(credential)
            .await
            .map_err(SessionError::Setup)?;

        let device_manager = self
            .sdk
            .device_manager()
            .await
            .map_err(SessionError::Setup)?;

        device_manager
            .ask_device_permission(DevicePermission::audio_only())
            .await
            .map_err(SessionError::Setup)?;

        // Kein Anruf aktiv: Auflegen bleibt deaktiviert
        self.inner.set_hang_up_enabled(false);

        // Anruf-Listener starten
        let mut incoming_rx = agent.subscribe_incoming();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            while let Ok(incoming) = incoming_rx.recv().await {
                inner.handle_incoming(incoming).await;
            }
        });

        *self.inner.agent.lock() = Some(agent);
        *self.inner.device_manager.lock() = Some(device_manager);
        *self.inner.phase.lock() = SessionPhase::Idle;

        Ok(())
    }

    /// Beendet den aktuellen Anruf für alle Teilnehmer.
    ///
    /// Ohne verfolgten Anruf ist das ein gemeldeter Fehler, kein
    /// Absturz. Nach dem Absetzen der Beenden-Anfrage wird die
    /// Auflegen-Schaltfläche in jedem Fall deaktiviert.
    pub async fn hang_up(&self) -> Result<(), SessionError> {
        let call = self
            .inner
            .current_call
            .lock()
            .take()
            .ok_or(SessionError::NoActiveCall)?;

        let call_id = call.id();
        tracing::info!("Hanging up call {}", call_id);

        // Beenden-Fehler werden protokolliert, aber nicht weitergereicht
        if let Err(e) = call.hang_up(HangUpOptions { for_everyone: true }).await {
            tracing::warn!("Hang-up request for call {} failed: {}", call_id, e);
        }

        if let Some(accepted_at) = self.inner.accepted_at.lock().take() {
            let duration = Utc::now() - accepted_at;
            tracing::info!("Call {} lasted {}s", call_id, duration.num_seconds());
        }

        *self.inner.phase.lock() = SessionPhase::Idle;
        self.inner.set_hang_up_enabled(false);
        self.inner.emit(SessionEvent::CallEnded { call_id });

        Ok(())
    }
}

impl std::fmt::Debug for CallSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSessionController")
            .field("phase", &self.phase())
            .field("hang_up_enabled", &self.hang_up_enabled())
            .finish()
    }
}

// ============================================================================
// INCOMING CALL HANDLING
// ============================================================================

impl ControllerInner {
    /// Nimmt einen eingehenden Anruf automatisch an.
    async fn handle_incoming(&self, incoming: Arc<dyn IncomingCall>) {
        let call_id = incoming.id();
        tracing::info!("Incoming call {}", call_id);
        self.emit(SessionEvent::IncomingCall {
            call_id: call_id.clone(),
        });

        let previous_phase = {
            let mut phase = self.phase.lock();
            let previous = phase.clone();
            *phase = SessionPhase::Ringing {
                call_id: call_id.clone(),
            };
            previous
        };

        match incoming.accept().await {
            Ok(call) => {
                tracing::info!("Accepted call {}", call.id());

                // Last-write-wins: ein evtl. noch verfolgter Anruf wird
                // durch den neuen ersetzt
                *self.current_call.lock() = Some(call);
                *self.accepted_at.lock() = Some(Utc::now());
                *self.phase.lock() = SessionPhase::Active {
                    call_id: call_id.clone(),
                };

                self.set_hang_up_enabled(true);
                self.emit(SessionEvent::CallAccepted { call_id });
            }
            Err(e) => {
                // Kein Anruf zustande gekommen: Schaltfläche und
                // verfolgten Anruf unverändert lassen
                let err = SessionError::Accept(e);
                tracing::error!("Incoming call {}: {}", call_id, err);
                *self.phase.lock() = previous_phase;
            }
        }
    }

    fn set_hang_up_enabled(&self, enabled: bool) {
        self.hang_up_enabled.store(enabled, Ordering::SeqCst);
        self.emit(SessionEvent::HangUpControl { enabled });
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }
}
