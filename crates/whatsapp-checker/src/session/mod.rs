//! WhatsApp session lifecycle.
//!
//! The [`ConnectionManager`] owns the one network session of the process. On
//! startup it either pairs a new device by showing a QR code or reconnects
//! with the stored device identity; either way it blocks until the session is
//! live or fails. Request handlers only read its state.

mod display;

pub use display::{PairingDisplay, TerminalQr};

use crate::error::SessionError;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};
use whatsapp_client::{ClientError, MessagingNetwork, NumberResult, PairingEvent, PairingEvents};

/// Lifecycle state of the network session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Pairing,
    Connected,
    /// Startup failed; the process is about to exit.
    Failed,
}

/// Owns the network session and publishes its state.
pub struct ConnectionManager {
    network: Arc<dyn MessagingNetwork>,
    display: Arc<dyn PairingDisplay>,
    state: watch::Sender<ConnectionState>,
}

impl ConnectionManager {
    pub fn new(network: Arc<dyn MessagingNetwork>, display: Arc<dyn PairingDisplay>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            network,
            display,
            state,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch lifecycle state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Whether lookups can be issued right now.
    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Connected && self.network.is_connected()
    }

    /// Look up a single number.
    pub async fn query(&self, number: &str) -> Result<Vec<NumberResult>, ClientError> {
        self.network.query_numbers(&[number.to_string()]).await
    }

    /// Pair or reconnect, returning once the session is live.
    ///
    /// Any error leaves the manager in [`ConnectionState::Failed`].
    pub async fn establish(&self) -> Result<(), SessionError> {
        let result = self.try_establish().await;
        if let Err(e) = &result {
            error!("Session setup failed: {}", e);
            self.set_state(ConnectionState::Failed);
        }
        result
    }

    async fn try_establish(&self) -> Result<(), SessionError> {
        let paired = self
            .network
            .restore_identity()
            .await
            .map_err(SessionError::Store)?;

        if paired {
            self.reconnect().await
        } else {
            self.pair().await
        }
    }

    async fn reconnect(&self) -> Result<(), SessionError> {
        info!("Attempting to reconnect...");
        self.network
            .connect()
            .await
            .map_err(SessionError::Connect)?;

        self.set_state(ConnectionState::Connected);
        info!("Reconnected with stored device");
        Ok(())
    }

    async fn pair(&self) -> Result<(), SessionError> {
        info!("No stored device, starting new login process...");
        self.set_state(ConnectionState::Pairing);

        // The event stream must exist before connecting or the first code is lost
        let mut events = self
            .network
            .pairing_events()
            .await
            .map_err(SessionError::Pairing)?;

        self.network
            .connect()
            .await
            .map_err(SessionError::Connect)?;

        while let Some(event) = events.next().await {
            match event {
                PairingEvent::CodeIssued(code) => self.display.show_code(&code),
                PairingEvent::TimedOut => return Err(SessionError::PairingTimedOut),
                PairingEvent::Succeeded => {
                    info!("Login successful");
                    self.set_state(ConnectionState::Connected);
                    tokio::spawn(drain_pairing(events));
                    return Ok(());
                }
                PairingEvent::Failed(reason) => return Err(SessionError::PairingFailed(reason)),
                PairingEvent::Other(name) => info!(event = %name, "Login event"),
            }
        }

        Err(SessionError::PairingIncomplete)
    }

    /// Release the live session. The stored device is kept.
    pub async fn shutdown(&self) {
        if self.state() == ConnectionState::Disconnected {
            return;
        }
        info!("Disconnecting WhatsApp session");
        self.network.disconnect().await;
        self.set_state(ConnectionState::Disconnected);
    }

    fn set_state(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(from = ?prev, to = ?next, "Connection state changed");
        }
    }
}

/// Consume whatever the network still reports after a successful login.
async fn drain_pairing(mut events: PairingEvents) {
    while let Some(event) = events.next().await {
        match event {
            PairingEvent::TimedOut => warn!("Pairing timeout reported after successful login"),
            other => debug!(event = ?other, "Pairing event after login"),
        }
    }
    debug!("Pairing channel closed");
}
