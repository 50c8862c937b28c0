//! Session Module - Steuerung der Anruf-Sitzung

mod controller;

pub use controller::{CallSessionController, SessionError, SessionEvent, SessionPhase};
