//! Wallet association validation.
//!
//! A wallet asks whether a bank account may be linked to it. The answer is
//! yes iff the account belongs to the customer holding the document and is
//! a SAVINGS or CHECKING account.

use super::{reply, ConsumerError};
use crate::customer::CustomerGateway;
use crate::error::AccountError;
use crate::model::{AccountId, AccountType};
use crate::policy::AccountPolicyEngine;
use account_service_core::event::SerializedEvent;
use account_service_core::event_bus::EventBus;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAssociationRequest {
    /// Correlation id, echoed in the reply
    pub event_id: String,
    /// Document of the wallet owner
    pub document_number: String,
    /// Wallet phone number
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Account to link
    pub bank_account_id: String,
}

/// Outbound reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAssociationResponse {
    /// Correlation id from the request
    pub event_id: String,
    /// Whether the account may be linked
    pub success: bool,
    /// Why not, when `success` is false
    pub error_message: Option<String>,
}

/// Answers wallet association requests.
#[derive(Clone)]
pub struct WalletAssociationConsumer {
    gateway: CustomerGateway,
    engine: AccountPolicyEngine,
    bus: Arc<dyn EventBus>,
    response_topic: String,
}

impl WalletAssociationConsumer {
    /// Create the consumer replying on `response_topic`.
    #[must_use]
    pub fn new(
        gateway: CustomerGateway,
        engine: AccountPolicyEngine,
        bus: Arc<dyn EventBus>,
        response_topic: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            engine,
            bus,
            response_topic: response_topic.into(),
        }
    }

    /// Validate the request and publish the verdict keyed by event id.
    ///
    /// # Errors
    ///
    /// - `ConsumerError::Decode` if the request is malformed
    /// - `ConsumerError::Bus` if the reply cannot be published
    pub async fn handle(&self, event: &SerializedEvent) -> Result<(), ConsumerError> {
        let request: WalletAssociationRequest = event.decode()?;

        let error_message = match self.validate(&request).await {
            Ok(true) => None,
            Ok(false) => Some("Account validation failed".to_string()),
            Err(e) => Some(format!("Error during validation: {e}")),
        };
        let response = WalletAssociationResponse {
            event_id: request.event_id.clone(),
            success: error_message.is_none(),
            error_message,
        };

        info!(
            event_id = %response.event_id,
            account_id = %request.bank_account_id,
            success = response.success,
            "Wallet association validated"
        );
        reply(
            self.bus.as_ref(),
            &self.response_topic,
            &response.event_id,
            &response,
        )
        .await
    }

    async fn validate(&self, request: &WalletAssociationRequest) -> Result<bool, AccountError> {
        let customer = self.gateway.find_by_document(&request.document_number).await?;
        let account = self
            .engine
            .find_by_id(&AccountId::new(request.bank_account_id.as_str()))
            .await?;

        Ok(account.is_some_and(|account| {
            account.customer_id == customer.id
                && matches!(account.account_type, AccountType::Savings | AccountType::Checking)
        }))
    }
}
