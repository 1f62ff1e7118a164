//! API request and response types.

use serde::{Deserialize, Serialize};

/// Query string of `/check`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CheckParams {
    /// Phone number to look up, in any format the network accepts
    pub number: Option<String>,
}

impl CheckParams {
    /// Pick the parameters out of decoded query pairs. The first `number`
    /// wins when the key is repeated.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let number = pairs
            .into_iter()
            .find(|(key, _)| key == "number")
            .map(|(_, value)| value);
        Self { number }
    }
}

/// Body of every `/check` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub number: String,
    #[serde(rename = "isOnWhatsApp")]
    pub is_on_whatsapp: bool,
    pub status: String,
}

impl CheckResponse {
    /// The number is registered; `number` is the network's canonical form.
    pub fn reachable(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            is_on_whatsapp: true,
            status: "success".to_string(),
        }
    }

    /// The number is not registered.
    pub fn unreachable(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            is_on_whatsapp: false,
            status: "success".to_string(),
        }
    }
}
