//! Trait-Schnittstelle zum externen Calling-SDK
//!
//! Die eigentliche Calling-Engine (Signaling, Medien-Aushandlung,
//! Transport) liegt vollständig beim externen SDK. Dieses Modul
//! beschreibt nur die Objekte, die der Client davon zu sehen bekommt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone)]
pub enum SdkError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("device permission denied: {0}")]
    PermissionDenied(String),

    #[error("call is no longer available: {0}")]
    CallGone(String),

    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// VALUE TYPES
// ============================================================================

/// Opaker Bearer-Token, verpackt für das SDK.
#[derive(Debug, Clone)]
pub struct TokenCredential {
    token: String,
}

impl TokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }
}

/// Welche Geräte-Berechtigungen angefragt werden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePermission {
    pub audio: bool,
    pub video: bool,
}

impl DevicePermission {
    /// Nur Mikrofon.
    pub fn audio_only() -> Self {
        Self {
            audio: true,
            video: false,
        }
    }
}

/// Optionen für das Beenden eines Anrufs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HangUpOptions {
    /// Beendet den Anruf für alle Teilnehmer, nicht nur lokal.
    pub for_everyone: bool,
}

// ============================================================================
// SDK TRAITS
// ============================================================================

/// Einstiegspunkt des Calling-SDKs.
#[async_trait]
pub trait CallingClient: Send + Sync {
    /// Erstellt einen authentifizierten Call-Agenten.
    ///
    /// Schlägt fehl, wenn das Credential ungültig oder das Netzwerk
    /// nicht erreichbar ist.
    async fn create_agent(
        &self,
        credential: TokenCredential,
    ) -> Result<Arc<dyn CallAgent>, SdkError>;

    /// Gibt den Device-Manager für die lokale Audio-Hardware zurück.
    async fn device_manager(&self) -> Result<Arc<dyn DeviceManager>, SdkError>;
}

/// Authentifizierter Endpunkt, der Anrufe empfangen kann.
pub trait CallAgent: Send + Sync {
    /// Abonniert eingehende Anruf-Angebote.
    fn subscribe_incoming(&self) -> broadcast::Receiver<Arc<dyn IncomingCall>>;
}

/// Zugriff auf lokale Geräte-Berechtigungen.
#[async_trait]
pub trait DeviceManager: Send + Sync {
    /// Fragt den Benutzer um Erlaubnis für die angegebenen Geräte.
    ///
    /// Schlägt fehl, wenn der Benutzer ablehnt oder keine Hardware
    /// vorhanden ist.
    async fn ask_device_permission(&self, permission: DevicePermission) -> Result<(), SdkError>;
}

/// Ein wartendes eingehendes Anruf-Angebot.
#[async_trait]
pub trait IncomingCall: Send + Sync {
    fn id(&self) -> String;

    /// Nimmt den Anruf an und liefert die aktive Verbindung.
    ///
    /// Schlägt fehl, wenn der Anrufer inzwischen aufgelegt hat.
    async fn accept(&self) -> Result<Arc<dyn CallConnection>, SdkError>;
}

/// Der laufende Anruf.
#[async_trait]
pub trait CallConnection: Send + Sync {
    fn id(&self) -> String;

    /// Fordert das Beenden des Anrufs beim SDK an.
    async fn hang_up(&self, options: HangUpOptions) -> Result<(), SdkError>;
}
