//! Invitation code lookup against a group's configured endpoint.

use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

/// Generic failure reply for transport and decode errors.
pub const FETCH_FAILED: &str = "Failed to fetch the invitation code, please try again later";

/// Reply when the endpoint reports success but omits the code.
const MISSING_CODE: &str = "Failed to fetch the invitation code";

/// Response body of an invitation endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InviteResponse {
    #[serde(default)]
    is_success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    error_msg: Option<String>,
}

/// Fetch an invitation code from `url` and turn the outcome into reply text.
///
/// Never fails: every error path produces a human-readable message.
pub async fn fetch_invitation_code(client: &reqwest::Client, url: &str, timeout: Duration) -> String {
    let resp = match client.get(url).timeout(timeout).send().await {
        Ok(r) => r,
        Err(e) => {
            error!("invitation request to {url} failed: {e}");
            return FETCH_FAILED.to_string();
        }
    };

    let status = resp.status();
    if status != reqwest::StatusCode::OK {
        error!("invitation endpoint {url} returned status {status}");
        return FETCH_FAILED.to_string();
    }

    match resp.text().await {
        Ok(body) => {
            let reply = interpret_response(&body);
            info!("invitation code fetched from {url}");
            reply
        }
        Err(e) => {
            error!("failed to read invitation response from {url}: {e}");
            FETCH_FAILED.to_string()
        }
    }
}

/// Turn an invitation endpoint body into reply text.
pub(crate) fn interpret_response(body: &str) -> String {
    let parsed: InviteResponse = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(e) => {
            error!("failed to parse invitation response: {e}");
            return FETCH_FAILED.to_string();
        }
    };

    if parsed.is_success {
        return match parsed.data {
            Some(serde_json::Value::String(code)) => code,
            Some(serde_json::Value::Null) | None => MISSING_CODE.to_string(),
            Some(other) => other.to_string(),
        };
    }

    let reason = parsed
        .error_msg
        .unwrap_or_else(|| "unknown error".to_string());
    error!("invitation endpoint reported failure: {reason}");
    format!("Failed to fetch the invitation code: {reason}")
}
