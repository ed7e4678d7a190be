//! Credit service client.

use super::{decode, join, transport, BaseResponse};
use crate::error::RemoteError;
use crate::model::{CreditCard, CustomerId};
use crate::providers::CreditClient;
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// Message the credit service sends for a customer with no cards.
pub const NO_CREDIT_CARDS: &str = "This customer doesnt have credit cards";

/// `reqwest` client for `GET /credit-cards/customer/{id}`.
#[derive(Debug, Clone)]
pub struct HttpCreditClient {
    client: Client,
    base_url: String,
}

impl HttpCreditClient {
    /// Create a client for the service at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl CreditClient for HttpCreditClient {
    fn credit_cards_of<'a>(
        &'a self,
        customer_id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<Vec<CreditCard>, RemoteError>> {
        async move {
            let response = self
                .client
                .get(join(
                    &self.base_url,
                    &format!("/credit-cards/customer/{customer_id}"),
                ))
                .send()
                .await
                .map_err(|e| transport(&e))?;

            let status = response.status();
            let body = response.text().await.map_err(|e| transport(&e))?;
            let cards = interpret(status, &body)?;
            debug!(customer_id = %customer_id, count = cards.len(), "Credit cards fetched");
            Ok(cards)
        }
        .boxed()
    }
}

/// Map a credit service response to a card list.
///
/// HTTP 400, or an envelope with status 400 and [`NO_CREDIT_CARDS`], means
/// the customer has no cards.
fn interpret(status: StatusCode, body: &str) -> Result<Vec<CreditCard>, RemoteError> {
    if status == StatusCode::BAD_REQUEST {
        warn!(%body, "Credit service reported no credit cards");
        return Ok(Vec::new());
    }
    if !status.is_success() {
        return Err(RemoteError::Status {
            status: status.as_u16(),
            message: body.to_string(),
        });
    }

    let envelope: BaseResponse<Vec<CreditCard>> = decode(body)?;
    if envelope.status == 400 && envelope.message.as_deref() == Some(NO_CREDIT_CARDS) {
        return Ok(Vec::new());
    }
    Ok(envelope.data.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cards_are_read_from_the_envelope() {
        let body = r#"{"status":200,"message":"ok","data":[{"id":"cc-1","customerId":"C-1","cardNumber":"4111"}]}"#;
        let cards = interpret(StatusCode::OK, body).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, "cc-1");
    }

    #[test]
    fn no_cards_envelope_is_empty() {
        let body = format!(r#"{{"status":400,"message":"{NO_CREDIT_CARDS}","data":null}}"#);
        assert!(interpret(StatusCode::OK, &body).unwrap().is_empty());
    }

    #[test]
    fn http_400_is_empty() {
        assert!(interpret(StatusCode::BAD_REQUEST, "whatever").unwrap().is_empty());
    }

    #[test]
    fn server_error_is_an_error() {
        let err = interpret(StatusCode::BAD_GATEWAY, "upstream down").unwrap_err();
        assert_eq!(
            err,
            RemoteError::Status {
                status: 502,
                message: "upstream down".to_string()
            }
        );
    }

    #[test]
    fn garbage_body_is_a_decode_error() {
        assert!(matches!(
            interpret(StatusCode::OK, "<html>"),
            Err(RemoteError::Decode(_))
        ));
    }
}
