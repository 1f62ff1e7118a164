//! HTTP request handlers.

use super::types::{CheckParams, CheckResponse};
use super::AppState;
use crate::error::CheckError;
use axum::{
    extract::{Query, State},
    Json,
};
use tracing::{error, info, warn};

/// Check whether a number is on WhatsApp.
///
/// Answers any method. A query string that cannot be decoded is treated the
/// same as a missing `number`.
pub async fn check_number(
    State(state): State<AppState>,
    query: Option<Query<Vec<(String, String)>>>,
) -> Result<Json<CheckResponse>, CheckError> {
    let params = query
        .map(|Query(pairs)| CheckParams::from_pairs(pairs))
        .unwrap_or_default();
    let number = params
        .number
        .filter(|n| !n.is_empty())
        .ok_or(CheckError::MissingNumber)?;

    if !state.session.is_ready() {
        warn!(number = %number, "Check rejected, session not connected");
        return Err(CheckError::NotConnected { number });
    }

    let results = match state.session.query(&number).await {
        Ok(results) => results,
        Err(source) => {
            error!(number = %number, "Number check failed: {}", source);
            return Err(CheckError::Query { number, source });
        }
    };

    let response = match results.into_iter().next() {
        Some(result) if result.is_in => CheckResponse::reachable(result.query),
        _ => CheckResponse::unreachable(number),
    };

    info!(
        number = %response.number,
        on_whatsapp = response.is_on_whatsapp,
        "Number checked"
    );

    Ok(Json(response))
}
