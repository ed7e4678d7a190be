//! Customer service client.

use super::{decode, join, success_body, transport};
use crate::error::RemoteError;
use crate::model::{Customer, CustomerId, StatusKind};
use crate::providers::CustomerClient;
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use tracing::debug;

/// `reqwest` client for the customer service.
///
/// - `GET /customers/{id}`
/// - `GET /customers/by-document/{document}`
/// - `PUT /customers/{id}/vip-pym-status?value=&type=`
#[derive(Debug, Clone)]
pub struct HttpCustomerClient {
    client: Client,
    base_url: String,
}

impl HttpCustomerClient {
    /// Create a client for the service at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn get(&self, path: &str) -> Result<Customer, RemoteError> {
        let response = self
            .client
            .get(join(&self.base_url, path))
            .send()
            .await
            .map_err(|e| transport(&e))?;
        let body = success_body(response).await?;
        decode(&body)
    }
}

impl CustomerClient for HttpCustomerClient {
    fn get_customer<'a>(
        &'a self,
        id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<Customer, RemoteError>> {
        async move {
            debug!(customer_id = %id, "Fetching customer");
            self.get(&format!("/customers/{id}")).await
        }
        .boxed()
    }

    fn get_by_document<'a>(
        &'a self,
        document_number: &'a str,
    ) -> BoxFuture<'a, Result<Customer, RemoteError>> {
        async move {
            debug!(document_number, "Fetching customer by document");
            self.get(&format!("/customers/by-document/{document_number}"))
                .await
        }
        .boxed()
    }

    fn update_status<'a>(
        &'a self,
        id: &'a CustomerId,
        value: bool,
        kind: StatusKind,
    ) -> BoxFuture<'a, Result<Customer, RemoteError>> {
        async move {
            let response = self
                .client
                .put(join(&self.base_url, &format!("/customers/{id}/vip-pym-status")))
                .query(&[("value", value.to_string().as_str()), ("type", kind.as_str())])
                .send()
                .await
                .map_err(|e| transport(&e))?;
            let body = success_body(response).await?;
            decode(&body)
        }
        .boxed()
    }
}
