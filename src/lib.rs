//! Deskphone - Thin Softphone Client
//!
//! Ein schlanker Softphone-Client mit:
//! - Trait-Schnittstelle zu einem externen Calling-SDK
//! - Automatischem Annehmen eingehender Anrufe
//! - Auflegen-Steuerung für die Oberfläche
//! - Statischem Token-Provider (Backend-Dienst folgt später)

pub mod sdk;
pub mod session;
pub mod token;

pub use session::{CallSessionController, SessionError, SessionEvent, SessionPhase};
