//! Token Module - Bezug des Zugriffs-Tokens

mod provider;

pub use provider::{StaticTokenProvider, TokenError, TokenProvider};
