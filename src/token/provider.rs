//! Bezug des Zugriffs-Tokens
//!
//! Das Token identifiziert den Benutzer gegenüber dem Calling-SDK.
//! Ausstellung und Validierung liegen beim Backend-Token-Dienst und
//! sind hier bewusst nicht implementiert.

use async_trait::async_trait;
use thiserror::Error;

/// Platzhalter, solange kein Backend-Token-Dienst angebunden ist.
const PLACEHOLDER_TOKEN: &str = "<USER_ACCESS_TOKEN>";

/// Umgebungsvariable, die den Platzhalter überschreibt.
const TOKEN_ENV_VAR: &str = "DESKPHONE_ACCESS_TOKEN";

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone)]
pub enum TokenError {
    #[error("no access token configured")]
    Missing,
}

// ============================================================================
// TOKEN PROVIDER
// ============================================================================

/// Liefert das Zugriffs-Token für die Calling-Identität.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<String, TokenError>;
}

/// Statischer Token-Provider.
///
/// TODO: Für den Produktivbetrieb muss das Token per HTTPS vom
/// Backend-Token-Dienst geholt werden statt aus Konstante/Umgebung.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Liest das Token aus der Umgebung, sonst Platzhalter.
    pub fn from_env() -> Self {
        let token = std::env::var(TOKEN_ENV_VAR).unwrap_or_else(|_| PLACEHOLDER_TOKEN.to_string());
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn fetch_token(&self) -> Result<String, TokenError> {
        if self.token.is_empty() {
            return Err(TokenError::Missing);
        }
        Ok(self.token.clone())
    }
}
