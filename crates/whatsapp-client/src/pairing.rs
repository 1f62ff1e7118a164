//! Pairing event receiver with polling.

use crate::client::BridgeClient;
use crate::types::PairingEvent;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::Stream;
use tracing::{debug, error, warn};

/// Consecutive poll failures after which the sequence is closed.
const MAX_POLL_FAILURES: u32 = 5;

/// Polls the bridge for pairing events.
pub struct PairingReceiver {
    client: BridgeClient,
    poll_interval: Duration,
}

impl PairingReceiver {
    pub fn new(client: BridgeClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    /// Start receiving pairing events as an async stream.
    ///
    /// The stream ends after a `success` or `timeout` event, when the bridge
    /// reports the pairing closed, or after repeated poll failures. A device
    /// that cannot be saved ends it with [`PairingEvent::Failed`] in place of
    /// `Succeeded`.
    pub fn stream(self) -> impl Stream<Item = PairingEvent> {
        async_stream::stream! {
            let mut failures = 0;
            loop {
                match self.client.poll_pairing().await {
                    Ok(poll) => {
                        failures = 0;
                        let mut finished = poll.closed;
                        for wire in poll.events {
                            finished |= wire.is_terminal();
                            let (event, device) = wire.into_event();
                            if let Some(device) = device {
                                if let Err(e) = self.client.adopt_device(device).await {
                                    error!(
                                        "Failed to save paired device, the next start would need a new pairing: {}",
                                        e
                                    );
                                    yield PairingEvent::Failed(format!("failed to save paired device: {}", e));
                                    return;
                                }
                            }
                            debug!(?event, "Pairing event");
                            yield event;
                        }
                        if finished {
                            break;
                        }
                    }
                    Err(e) => {
                        failures += 1;
                        if failures >= MAX_POLL_FAILURES {
                            error!("Giving up on pairing after {} failed polls: {}", failures, e);
                            break;
                        }
                        warn!("Pairing poll failed: {}", e);
                    }
                }

                sleep(self.poll_interval).await;
            }
        }
    }
}
