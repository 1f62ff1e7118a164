//! WhatsApp bridge HTTP client.

use crate::error::ClientError;
use crate::network::{MessagingNetwork, PairingEvents};
use crate::pairing::PairingReceiver;
use crate::store::Store;
use crate::types::*;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Client for a WhatsApp bridge daemon's REST API.
///
/// Cheap to clone; clones share the session state.
#[derive(Clone)]
pub struct BridgeClient {
    client: Client,
    base_url: String,
    pairing_poll_interval: Duration,
    state: Arc<SessionState>,
}

struct SessionState {
    store: Store,
    device: RwLock<Option<DeviceIdentity>>,
    connected: AtomicBool,
}

impl BridgeClient {
    /// Create a new bridge client backed by `store`.
    pub fn new(
        base_url: impl Into<String>,
        store: Store,
        request_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            pairing_poll_interval: Duration::from_secs(1),
            state: Arc::new(SessionState {
                store,
                device: RwLock::new(None),
                connected: AtomicBool::new(false),
            }),
        })
    }

    /// Set how often the pairing endpoint is polled.
    pub fn with_pairing_poll_interval(mut self, interval: Duration) -> Self {
        self.pairing_poll_interval = interval;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the bridge is healthy.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/v1/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Fetch the bridge's view of the session.
    #[instrument(skip(self))]
    pub async fn session_status(&self) -> Result<SessionStatus, ClientError> {
        let response = self
            .client
            .get(format!("{}/v1/session/status", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let msg = response.text().await.unwrap_or_default();
            return Err(ClientError::Api(msg));
        }

        Ok(response.json().await?)
    }

    /// Fetch pairing events queued since the last poll.
    pub(crate) async fn poll_pairing(&self) -> Result<PairingPoll, ClientError> {
        let response = self
            .client
            .get(format!("{}/v1/session/pairing", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let msg = response.text().await.unwrap_or_default();
            return Err(ClientError::Api(format!("{} - {}", status, msg)));
        }

        Ok(response.json().await?)
    }

    /// Remember and persist a device delivered by a successful pairing.
    pub(crate) async fn adopt_device(&self, device: DeviceIdentity) -> Result<(), ClientError> {
        self.state.store.save(&device).await?;
        info!(jid = %device.jid, "Paired device saved");
        if let Ok(mut slot) = self.state.device.write() {
            *slot = Some(device);
        }
        Ok(())
    }

    /// Keep `is_connected` in step with the bridge by polling its status.
    ///
    /// The returned task runs until aborted.
    pub fn spawn_status_monitor(&self, interval: Duration) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let connected = match client.session_status().await {
                    Ok(status) => status.connected,
                    Err(e) => {
                        warn!("Session status check failed: {}", e);
                        false
                    }
                };
                let was = client.state.connected.swap(connected, Ordering::SeqCst);
                if was != connected {
                    if connected {
                        info!("Bridge session is back up");
                    } else {
                        warn!("Bridge session dropped");
                    }
                }
            }
        })
    }

    fn current_device(&self) -> Option<DeviceIdentity> {
        self.state.device.read().ok().and_then(|d| d.clone())
    }
}

#[async_trait]
impl MessagingNetwork for BridgeClient {
    async fn restore_identity(&self) -> Result<bool, ClientError> {
        let device = self.state.store.load().await?;
        let found = device.is_some();
        if let Ok(mut slot) = self.state.device.write() {
            *slot = device;
        }
        Ok(found)
    }

    fn is_authenticated(&self) -> bool {
        self.state
            .device
            .read()
            .map(|d| d.is_some())
            .unwrap_or(false)
    }

    async fn pairing_events(&self) -> Result<PairingEvents, ClientError> {
        if self.is_authenticated() {
            return Err(ClientError::Api("device is already paired".into()));
        }
        let receiver = PairingReceiver::new(self.clone(), self.pairing_poll_interval);
        Ok(Box::pin(receiver.stream()))
    }

    #[instrument(skip(self))]
    async fn connect(&self) -> Result<(), ClientError> {
        let device = self.current_device();
        let request = ConnectRequest {
            device: device.as_ref(),
        };

        let response = self
            .client
            .post(format!("{}/v1/session/connect", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let msg = response.text().await.unwrap_or_default();
            warn!(%status, "Connect failed: {}", msg);
            return Err(ClientError::Api(format!("{} - {}", status, msg)));
        }

        self.state.connected.store(true, Ordering::SeqCst);
        debug!(paired = device.is_some(), "Session connected");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn disconnect(&self) {
        self.state.connected.store(false, Ordering::SeqCst);

        let result = self
            .client
            .post(format!("{}/v1/session/disconnect", self.base_url))
            .send()
            .await;

        match result {
            Ok(r) if r.status().is_success() => debug!("Session disconnected"),
            Ok(r) => warn!(status = %r.status(), "Bridge rejected disconnect"),
            Err(e) => warn!("Disconnect failed: {}", e),
        }
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    #[instrument(skip(self))]
    async fn query_numbers(&self, numbers: &[String]) -> Result<Vec<NumberResult>, ClientError> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }

        let response = self
            .client
            .post(format!("{}/v1/contacts/check", self.base_url))
            .json(&CheckNumbersRequest { numbers })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let msg = response.text().await.unwrap_or_default();
            warn!(%status, "Number check failed: {}", msg);
            return Err(ClientError::Api(format!("{} - {}", status, msg)));
        }

        let results: Vec<NumberResult> = response.json().await?;
        debug!("Bridge returned {} results", results.len());
        Ok(results)
    }
}
