//! Handshake-level interception.

pub mod sni;

pub use sni::{ServerNameSink, SessionRequest, SniDecision, SniSuppressor};
