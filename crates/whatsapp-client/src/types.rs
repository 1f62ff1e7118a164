//! WhatsApp bridge types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials for one paired device.
///
/// The `session` blob is issued by the bridge on successful pairing and is
/// never interpreted locally.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub jid: String,
    pub session: String,
    #[serde(rename = "pairedAt")]
    pub paired_at: DateTime<Utc>,
}

impl fmt::Debug for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceIdentity")
            .field("jid", &self.jid)
            .field("session", &"[REDACTED]")
            .field("paired_at", &self.paired_at)
            .finish()
    }
}

/// Result of looking up one number on the network.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NumberResult {
    /// Canonical form of the queried number
    pub query: String,
    #[serde(default)]
    pub jid: Option<String>,
    #[serde(rename = "isIn")]
    pub is_in: bool,
}

/// Event emitted while pairing a new device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingEvent {
    /// A code to be scanned with the phone app.
    CodeIssued(String),
    /// Nobody scanned the code in time.
    TimedOut,
    /// The phone accepted the pairing.
    Succeeded,
    /// The pairing succeeded on the bridge but could not be kept locally.
    Failed(String),
    /// Anything else the bridge reports.
    Other(String),
}

/// Body of `POST /v1/session/connect`.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectRequest<'a> {
    pub device: Option<&'a DeviceIdentity>,
}

/// Body of `POST /v1/contacts/check`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckNumbersRequest<'a> {
    pub numbers: &'a [String],
}

/// Response of `GET /v1/session/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionStatus {
    pub connected: bool,
    #[serde(rename = "loggedIn", default)]
    pub logged_in: bool,
}

/// Response of `GET /v1/session/pairing`.
#[derive(Debug, Clone, Deserialize)]
pub struct PairingPoll {
    #[serde(default)]
    pub events: Vec<PairingWire>,
    #[serde(default)]
    pub closed: bool,
}

/// A pairing event as the bridge reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct PairingWire {
    pub event: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub device: Option<DeviceIdentity>,
}

impl PairingWire {
    /// Split into the public event and the device delivered on success.
    pub fn into_event(self) -> (PairingEvent, Option<DeviceIdentity>) {
        match self.event.as_str() {
            "code" => match self.code {
                Some(code) => (PairingEvent::CodeIssued(code), None),
                None => (PairingEvent::Other("code".into()), None),
            },
            "timeout" => (PairingEvent::TimedOut, None),
            "success" => (PairingEvent::Succeeded, self.device),
            _ => (PairingEvent::Other(self.event), None),
        }
    }

    /// Whether no further events follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self.event.as_str(), "timeout" | "success")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(json: serde_json::Value) -> PairingWire {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_pairing_wire_code() {
        let (event, device) = wire(serde_json::json!({"event": "code", "code": "2@abc"})).into_event();
        assert_eq!(event, PairingEvent::CodeIssued("2@abc".into()));
        assert!(device.is_none());
    }

    #[test]
    fn test_pairing_wire_code_without_payload() {
        let (event, _) = wire(serde_json::json!({"event": "code"})).into_event();
        assert_eq!(event, PairingEvent::Other("code".into()));
    }

    #[test]
    fn test_pairing_wire_success_carries_device() {
        let w = wire(serde_json::json!({
            "event": "success",
            "device": {
                "jid": "15551234567.0:1@s.whatsapp.net",
                "session": "opaque",
                "pairedAt": "2024-01-01T00:00:00Z"
            }
        }));
        assert!(w.is_terminal());

        let (event, device) = w.into_event();
        assert_eq!(event, PairingEvent::Succeeded);
        assert_eq!(device.unwrap().jid, "15551234567.0:1@s.whatsapp.net");
    }

    #[test]
    fn test_pairing_wire_unknown_event() {
        let w = wire(serde_json::json!({"event": "err-client-outdated"}));
        assert!(!w.is_terminal());
        assert_eq!(w.into_event().0, PairingEvent::Other("err-client-outdated".into()));
    }

    #[test]
    fn test_number_result_deserialize() {
        let r: NumberResult = serde_json::from_value(serde_json::json!({
            "query": "+15551234567",
            "jid": "15551234567@s.whatsapp.net",
            "isIn": true
        }))
        .unwrap();
        assert!(r.is_in);
        assert_eq!(r.query, "+15551234567");
    }

    #[test]
    fn test_device_identity_debug_redacts_session() {
        let device = DeviceIdentity {
            jid: "jid".into(),
            session: "very-secret".into(),
            paired_at: Utc::now(),
        };
        let debug = format!("{:?}", device);
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
