//! The capabilities the checker needs from a messaging network session.

use crate::error::ClientError;
use crate::types::{NumberResult, PairingEvent};
use async_trait::async_trait;
use std::pin::Pin;
use tokio_stream::Stream;

/// Ordered, single-consumer sequence of pairing events. Ends after a
/// terminal event or when the network stops reporting.
pub type PairingEvents = Pin<Box<dyn Stream<Item = PairingEvent> + Send>>;

/// An authenticated session with the messaging network.
///
/// Handlers only ever call [`is_connected`](Self::is_connected) and
/// [`query_numbers`](Self::query_numbers); everything else belongs to
/// session startup and shutdown.
#[async_trait]
pub trait MessagingNetwork: Send + Sync {
    /// Load the stored device identity. Returns whether one exists.
    async fn restore_identity(&self) -> Result<bool, ClientError>;

    /// Whether a paired device identity is available.
    fn is_authenticated(&self) -> bool;

    /// Open the pairing event sequence. Must be called before `connect` on
    /// an unpaired session.
    async fn pairing_events(&self) -> Result<PairingEvents, ClientError>;

    /// Open the live session.
    async fn connect(&self) -> Result<(), ClientError>;

    /// Close the live session. The device identity is kept.
    async fn disconnect(&self);

    /// Whether the live session is currently up.
    fn is_connected(&self) -> bool;

    /// Look up which of `numbers` are registered on the network.
    async fn query_numbers(&self, numbers: &[String]) -> Result<Vec<NumberResult>, ClientError>;
}
