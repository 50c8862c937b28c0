//! SDK Module - Anbindung an das externe Calling-SDK
//!
//! Dieses Modul kapselt:
//! - Die Trait-Schnittstelle des externen Calling-SDKs
//! - Eine In-Process-Simulation für Demo und Tests

mod api;
mod simulated;

pub use api::{
    CallAgent, CallConnection, CallingClient, DeviceManager, DevicePermission, HangUpOptions,
    IncomingCall, SdkError, TokenCredential,
};
pub use simulated::SimulatedSdk;
