//! HTTP clients for the customer, credit and eligibility services.
//!
//! The credit and eligibility services wrap payloads in a
//! [`BaseResponse`] envelope. The customer service returns records as is.

pub mod credit;
pub mod customer;
pub mod eligibility;

pub use credit::HttpCreditClient;
pub use customer::HttpCustomerClient;
pub use eligibility::HttpEligibilityClient;

use crate::error::RemoteError;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Response envelope of the credit and eligibility services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseResponse<T> {
    /// Status code echoed in the body
    pub status: i32,
    /// Human-readable message
    pub message: Option<String>,
    /// Payload, absent on errors
    pub data: Option<T>,
}

/// Build a `reqwest` client with a per-request timeout.
///
/// # Errors
///
/// Returns `RemoteError::Transport` if the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration) -> Result<Client, RemoteError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RemoteError::Transport(e.to_string()))
}

fn transport(e: &reqwest::Error) -> RemoteError {
    RemoteError::Transport(e.to_string())
}

/// Read the body, failing on a non-success status.
async fn success_body(response: Response) -> Result<String, RemoteError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| transport(&e))?;
    if !status.is_success() {
        return Err(RemoteError::Status {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(body)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, RemoteError> {
    serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))
}

fn join(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn envelope_tolerates_missing_fields() {
        let envelope: BaseResponse<bool> = decode(r#"{"status":200}"#).unwrap();
        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.message, None);
        assert_eq!(envelope.data, None);
    }

    #[test]
    fn join_avoids_double_slash() {
        assert_eq!(join("http://svc:8080/", "/x"), "http://svc:8080/x");
        assert_eq!(join("http://svc:8080", "/x"), "http://svc:8080/x");
    }
}
