//! Eligibility service client.

use super::{decode, join, success_body, transport, BaseResponse};
use crate::error::RemoteError;
use crate::model::CustomerId;
use crate::providers::EligibilityClient;
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use tracing::debug;

/// `reqwest` client for `GET /customer-eligibility/has-overdue-debt/{id}`.
#[derive(Debug, Clone)]
pub struct HttpEligibilityClient {
    client: Client,
    base_url: String,
}

impl HttpEligibilityClient {
    /// Create a client for the service at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl EligibilityClient for HttpEligibilityClient {
    fn has_overdue_debt<'a>(
        &'a self,
        customer_id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<bool, RemoteError>> {
        async move {
            let response = self
                .client
                .get(join(
                    &self.base_url,
                    &format!("/customer-eligibility/has-overdue-debt/{customer_id}"),
                ))
                .send()
                .await
                .map_err(|e| transport(&e))?;
            let body = success_body(response).await?;
            let has_debt = overdue_flag(&body)?;
            debug!(customer_id = %customer_id, has_debt, "Debt status fetched");
            Ok(has_debt)
        }
        .boxed()
    }
}

/// The envelope must carry a boolean; anything else is a decode error.
fn overdue_flag(body: &str) -> Result<bool, RemoteError> {
    let envelope: BaseResponse<bool> = decode(body)?;
    envelope
        .data
        .ok_or_else(|| RemoteError::Decode("missing debt status".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn reads_debt_flag() {
        assert!(overdue_flag(r#"{"status":200,"data":true}"#).unwrap());
        assert!(!overdue_flag(r#"{"status":200,"data":false}"#).unwrap());
    }

    #[test]
    fn null_data_is_an_error() {
        assert!(matches!(
            overdue_flag(r#"{"status":200,"data":null}"#),
            Err(RemoteError::Decode(_))
        ));
    }
}
