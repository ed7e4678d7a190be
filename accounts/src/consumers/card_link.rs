//! Card link requests from the wallet.
//!
//! The wallet moves its balance onto the debit card's primary account. The
//! card must belong to the customer holding the document.

use super::{reply, ConsumerError};
use crate::customer::CustomerGateway;
use crate::debit_card::DebitCardLifecycle;
use crate::error::AccountError;
use crate::model::AccountPatch;
use crate::policy::AccountPolicyEngine;
use account_service_core::event::SerializedEvent;
use account_service_core::event_bus::EventBus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Inbound link request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardLinkRequested {
    /// Wallet phone number
    pub phone_number: String,
    /// Debit card to link
    pub card_number: String,
    /// Document of the wallet owner
    pub document_number: String,
    /// Wallet balance to move onto the card's primary account
    pub current_balance: Decimal,
}

/// The link was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardLinkConfirmed {
    /// Wallet phone number
    pub phone_number: String,
    /// Linked card
    pub card_number: String,
    /// Document of the wallet owner
    pub document_number: String,
    /// Primary account balance after the transfer
    pub updated_balance: Decimal,
}

/// The link was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardLinkRejected {
    /// Wallet phone number
    pub phone_number: String,
    /// Why
    pub reason: String,
}

/// Handles card link requests.
#[derive(Clone)]
pub struct CardLinkConsumer {
    gateway: CustomerGateway,
    engine: AccountPolicyEngine,
    cards: DebitCardLifecycle,
    bus: Arc<dyn EventBus>,
    confirmed_topic: String,
    rejected_topic: String,
}

impl CardLinkConsumer {
    /// Create the consumer.
    #[must_use]
    pub fn new(
        gateway: CustomerGateway,
        engine: AccountPolicyEngine,
        cards: DebitCardLifecycle,
        bus: Arc<dyn EventBus>,
        confirmed_topic: impl Into<String>,
        rejected_topic: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            engine,
            cards,
            bus,
            confirmed_topic: confirmed_topic.into(),
            rejected_topic: rejected_topic.into(),
        }
    }

    /// Link the card or reject the request.
    ///
    /// # Errors
    ///
    /// - `ConsumerError::Decode` if the request is malformed
    /// - `ConsumerError::NotFound` if the card or its primary account is missing
    /// - `ConsumerError::Account` with `InvalidBalance` if the wallet balance
    ///   would overflow or leave the account negative; a rejection is sent
    /// - `ConsumerError::Account` if the customer lookup or the balance update fails
    /// - `ConsumerError::Bus` if the reply cannot be published
    pub async fn handle(&self, event: &SerializedEvent) -> Result<(), ConsumerError> {
        let request: CardLinkRequested = event.decode()?;

        let customer = self.gateway.find_by_document(&request.document_number).await?;
        let card = self
            .cards
            .find_by_card_number(&request.card_number)
            .await?
            .ok_or_else(|| ConsumerError::NotFound("debit card".to_string()))?;

        if card.customer_id != customer.id {
            warn!(card_id = %card.id, customer_id = %customer.id, "Card link rejected, card belongs to another customer");
            return self
                .reject(&request.phone_number, "Card does not belong to the user")
                .await;
        }

        let account = self
            .engine
            .find_by_id(&card.primary_account_id)
            .await?
            .ok_or_else(|| ConsumerError::NotFound(format!("primary account {}", card.primary_account_id)))?;

        let Some(balance) = account
            .balance
            .checked_add(request.current_balance)
            .filter(|balance| *balance >= Decimal::ZERO)
        else {
            warn!(
                card_id = %card.id,
                account_id = %account.id,
                wallet_balance = %request.current_balance,
                "Card link rejected, wallet balance cannot be applied"
            );
            self.reject(&request.phone_number, "Invalid wallet balance")
                .await?;
            return Err(AccountError::InvalidBalance(request.current_balance).into());
        };

        let patch = AccountPatch {
            balance,
            holders: account.holders,
            signers: account.signers,
        };
        let updated = self
            .engine
            .update(&account.id, patch)
            .await?
            .ok_or_else(|| ConsumerError::NotFound(format!("primary account {}", account.id)))?;

        info!(card_id = %card.id, account_id = %updated.id, "Card linked to wallet");
        let confirmed = CardLinkConfirmed {
            phone_number: request.phone_number.clone(),
            card_number: request.card_number,
            document_number: request.document_number,
            updated_balance: updated.balance,
        };
        reply(
            self.bus.as_ref(),
            &self.confirmed_topic,
            &request.phone_number,
            &confirmed,
        )
        .await
    }

    async fn reject(&self, phone_number: &str, reason: &str) -> Result<(), ConsumerError> {
        let rejected = CardLinkRejected {
            phone_number: phone_number.to_string(),
            reason: reason.to_string(),
        };
        reply(self.bus.as_ref(), &self.rejected_topic, phone_number, &rejected).await
    }
}
