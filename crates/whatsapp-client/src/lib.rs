//! Client for a WhatsApp bridge daemon.
//!
//! The bridge implements the WhatsApp multi-device protocol; this crate
//! drives its session lifecycle (pairing, reconnection, disconnect), keeps
//! the paired device identity on disk and looks numbers up.

mod client;
mod error;
mod network;
mod pairing;
pub mod store;
mod types;

pub use client::BridgeClient;
pub use error::{ClientError, StoreError};
pub use network::{MessagingNetwork, PairingEvents};
pub use pairing::PairingReceiver;
pub use store::Store;
pub use types::*;
