//! In-Process-Simulation des Calling-SDKs
//!
//! Ersetzt für Demo und Tests das externe SDK: eingehende Anrufe werden
//! per `ring()` ausgelöst, Beenden-Anfragen werden aufgezeichnet.
//! Kein Signaling, keine Medien - reine Ablaufsimulation.

use super::api::{
    CallAgent, CallConnection, CallingClient, DeviceManager, DevicePermission, HangUpOptions,
    IncomingCall, SdkError, TokenCredential,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

// ============================================================================
// BEHAVIOR FLAGS
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct Behavior {
    fail_auth: bool,
    deny_permission: bool,
    fail_accept: bool,
    fail_hang_up: bool,
}

// ============================================================================
// SIMULATED SDK
// ============================================================================

/// Simuliertes Calling-SDK.
pub struct SimulatedSdk {
    behavior: Behavior,
    incoming_tx: broadcast::Sender<Arc<dyn IncomingCall>>,
    hang_ups: Arc<Mutex<Vec<(String, HangUpOptions)>>>,
}

impl SimulatedSdk {
    pub fn new() -> Self {
        let (incoming_tx, _) = broadcast::channel(16);

        Self {
            behavior: Behavior::default(),
            incoming_tx,
            hang_ups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Lässt `create_agent` mit einem Auth-Fehler fehlschlagen.
    pub fn with_auth_failure(mut self) -> Self {
        self.behavior.fail_auth = true;
        self
    }

    /// Lässt die Geräte-Berechtigung verweigern.
    pub fn with_permission_denied(mut self) -> Self {
        self.behavior.deny_permission = true;
        self
    }

    /// Lässt `accept` auf eingehenden Anrufen fehlschlagen.
    pub fn with_accept_failure(mut self) -> Self {
        self.behavior.fail_accept = true;
        self
    }

    /// Lässt `hang_up` auf aktiven Anrufen fehlschlagen.
    pub fn with_hang_up_failure(mut self) -> Self {
        self.behavior.fail_hang_up = true;
        self
    }

    /// Simuliert einen eingehenden Anruf und gibt dessen ID zurück.
    pub fn ring(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let call: Arc<dyn IncomingCall> = Arc::new(SimulatedIncomingCall {
            id: id.clone(),
            behavior: self.behavior,
            hang_ups: Arc::clone(&self.hang_ups),
        });

        // Ohne registrierten Agenten verhallt der Anruf
        let _ = self.incoming_tx.send(call);
        id
    }

    /// Alle bisher ausgelösten Beenden-Anfragen (Call-ID, Optionen).
    pub fn hang_up_requests(&self) -> Vec<(String, HangUpOptions)> {
        self.hang_ups.lock().clone()
    }
}

impl Default for SimulatedSdk {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallingClient for SimulatedSdk {
    async fn create_agent(
        &self,
        credential: TokenCredential,
    ) -> Result<Arc<dyn CallAgent>, SdkError> {
        if self.behavior.fail_auth {
            return Err(SdkError::Auth("simulated credential rejected".into()));
        }
        if credential.as_str().is_empty() {
            return Err(SdkError::Auth("empty access token".into()));
        }

        Ok(Arc::new(SimulatedAgent {
            incoming_tx: self.incoming_tx.clone(),
        }))
    }

    async fn device_manager(&self) -> Result<Arc<dyn DeviceManager>, SdkError> {
        Ok(Arc::new(SimulatedDeviceManager {
            deny: self.behavior.deny_permission,
        }))
    }
}

// ============================================================================
// SIMULATED SDK OBJECTS
// ============================================================================

struct SimulatedAgent {
    incoming_tx: broadcast::Sender<Arc<dyn IncomingCall>>,
}

impl CallAgent for SimulatedAgent {
    fn subscribe_incoming(&self) -> broadcast::Receiver<Arc<dyn IncomingCall>> {
        self.incoming_tx.subscribe()
    }
}

struct SimulatedDeviceManager {
    deny: bool,
}

#[async_trait]
impl DeviceManager for SimulatedDeviceManager {
    async fn ask_device_permission(&self, _permission: DevicePermission) -> Result<(), SdkError> {
        if self.deny {
            return Err(SdkError::PermissionDenied(
                "simulated user denied microphone access".into(),
            ));
        }
        Ok(())
    }
}

struct SimulatedIncomingCall {
    id: String,
    behavior: Behavior,
    hang_ups: Arc<Mutex<Vec<(String, HangUpOptions)>>>,
}

#[async_trait]
impl IncomingCall for SimulatedIncomingCall {
    fn id(&self) -> String {
        self.id.clone()
    }

    async fn accept(&self) -> Result<Arc<dyn CallConnection>, SdkError> {
        if self.behavior.fail_accept {
            return Err(SdkError::CallGone("caller cancelled before accept".into()));
        }

        Ok(Arc::new(SimulatedConnection {
            id: self.id.clone(),
            fail_hang_up: self.behavior.fail_hang_up,
            hang_ups: Arc::clone(&self.hang_ups),
        }))
    }
}

struct SimulatedConnection {
    id: String,
    fail_hang_up: bool,
    hang_ups: Arc<Mutex<Vec<(String, HangUpOptions)>>>,
}

#[async_trait]
impl CallConnection for SimulatedConnection {
    fn id(&self) -> String {
        self.id.clone()
    }

    async fn hang_up(&self, options: HangUpOptions) -> Result<(), SdkError> {
        // Anfrage wird auch bei simuliertem Fehler aufgezeichnet
        self.hang_ups.lock().push((self.id.clone(), options));

        if self.fail_hang_up {
            return Err(SdkError::Transport(
                "simulated signaling failure on hang-up".into(),
            ));
        }
        Ok(())
    }
}
