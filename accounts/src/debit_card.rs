//! Debit card lifecycle.
//!
//! Cards are issued against a primary account owned by the same customer,
//! can be linked to further accounts of that customer and are never
//! removed: deletion is the `DELETED` status.
//!
//! Invariant: `primary_account_id` is always one of
//! `associated_account_ids`.

use crate::card_number::CardNumberGenerator;
use crate::eligibility::EligibilityGate;
use crate::error::{AccountError, Result};
use crate::model::{
    AccountId, CardId, CardStatus, CustomerId, DebitCard, PrimaryAccountBalance,
};
use crate::providers::{AccountRepository, DebitCardRepository};
use account_service_core::environment::Clock;
use account_service_runtime::metrics::CardNumberMetrics;
use chrono::Months;
use futures::future::try_join;
use std::sync::Arc;
use tracing::{debug, info};

/// Card validity from issue.
const VALIDITY: Months = Months::new(48);

/// Debit card lifecycle.
#[derive(Clone)]
pub struct DebitCardLifecycle {
    cards: Arc<dyn DebitCardRepository>,
    accounts: Arc<dyn AccountRepository>,
    gate: EligibilityGate,
    generator: CardNumberGenerator,
    clock: Arc<dyn Clock>,
}

impl DebitCardLifecycle {
    /// Create a lifecycle with a randomly seeded number generator.
    #[must_use]
    pub fn new(
        cards: Arc<dyn DebitCardRepository>,
        accounts: Arc<dyn AccountRepository>,
        gate: EligibilityGate,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let generator = CardNumberGenerator::new(Arc::clone(&cards));
        Self {
            cards,
            accounts,
            gate,
            generator,
            clock,
        }
    }

    /// Replace the card number generator.
    #[must_use]
    pub fn with_generator(mut self, generator: CardNumberGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Issue an active card for `customer_id` on `primary_account_id`.
    ///
    /// # Errors
    ///
    /// - `OverdueDebt` if the debt check is positive or cannot be made
    /// - `AccountOwnershipMismatch` if the account is missing or not the customer's
    /// - `DatabaseError` if storage fails
    pub async fn issue(
        &self,
        customer_id: &CustomerId,
        primary_account_id: &AccountId,
    ) -> Result<DebitCard> {
        self.gate.ensure_no_overdue_debt(customer_id).await?;

        let owned = self
            .accounts
            .find_by_id(primary_account_id)
            .await?
            .is_some_and(|account| &account.customer_id == customer_id);
        if !owned {
            return Err(AccountError::AccountOwnershipMismatch {
                account_id: primary_account_id.clone(),
                customer_id: customer_id.clone(),
            });
        }

        let now = self.clock.now();
        let expiration_date = now.checked_add_months(VALIDITY).ok_or_else(|| {
            AccountError::InternalError(format!("card expiry out of range for {now}"))
        })?;

        loop {
            let card = DebitCard {
                id: CardId::generate(),
                card_number: self.generator.generate().await?,
                customer_id: customer_id.clone(),
                status: CardStatus::Active,
                primary_account_id: primary_account_id.clone(),
                associated_account_ids: vec![primary_account_id.clone()],
                expiration_date,
                created_at: now,
                modified_at: None,
            };

            match self.cards.save(&card).await {
                Ok(saved) => {
                    info!(
                        card_id = %saved.id,
                        customer_id = %customer_id,
                        account_id = %primary_account_id,
                        "Debit card issued"
                    );
                    return Ok(saved);
                }
                // Another issue took the number between the check and the write.
                Err(AccountError::DuplicateCardNumber) => {
                    CardNumberMetrics::record_collision();
                    debug!(customer_id = %customer_id, "Card number taken on save, drawing again");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Link another account of the card's customer to the card.
    ///
    /// Linking an account that is already linked changes nothing. Returns
    /// `None` if the card or the account does not exist.
    ///
    /// # Errors
    ///
    /// - `CustomerMismatch` if the account belongs to another customer
    /// - `DatabaseError` if storage fails
    pub async fn associate(
        &self,
        card_id: &CardId,
        account_id: &AccountId,
    ) -> Result<Option<DebitCard>> {
        let (card, account) =
            try_join(self.cards.find_by_id(card_id), self.accounts.find_by_id(account_id)).await?;
        let (Some(mut card), Some(account)) = (card, account) else {
            return Ok(None);
        };

        if card.customer_id != account.customer_id {
            return Err(AccountError::CustomerMismatch {
                card_id: card.id,
                account_id: account.id,
            });
        }
        if card.is_associated(account_id) {
            return Ok(Some(card));
        }

        card.associated_account_ids.push(account.id);
        card.modified_at = Some(self.clock.now());

        let saved = self.cards.save(&card).await?;
        info!(card_id = %saved.id, account_id = %account_id, "Account linked to card");
        Ok(Some(saved))
    }

    /// Make an already linked account the card's primary account.
    ///
    /// # Errors
    ///
    /// - `AccountNotAssociated` if the account is not linked to the card
    /// - `DatabaseError` if storage fails
    pub async fn change_primary(
        &self,
        card_id: &CardId,
        account_id: &AccountId,
    ) -> Result<Option<DebitCard>> {
        let Some(mut card) = self.cards.find_by_id(card_id).await? else {
            return Ok(None);
        };

        if !card.is_associated(account_id) {
            return Err(AccountError::AccountNotAssociated {
                card_id: card.id,
                account_id: account_id.clone(),
            });
        }

        card.primary_account_id = account_id.clone();
        card.modified_at = Some(self.clock.now());

        let saved = self.cards.save(&card).await?;
        info!(card_id = %saved.id, account_id = %account_id, "Primary account changed");
        Ok(Some(saved))
    }

    /// Set the card status.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if storage fails.
    pub async fn set_status(
        &self,
        card_id: &CardId,
        status: CardStatus,
    ) -> Result<Option<DebitCard>> {
        let Some(mut card) = self.cards.find_by_id(card_id).await? else {
            return Ok(None);
        };

        card.status = status;
        card.modified_at = Some(self.clock.now());

        let saved = self.cards.save(&card).await?;
        info!(card_id = %saved.id, %status, "Card status changed");
        Ok(Some(saved))
    }

    /// Soft-delete a card.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if storage fails.
    pub async fn delete(&self, card_id: &CardId) -> Result<Option<DebitCard>> {
        self.set_status(card_id, CardStatus::Deleted).await
    }

    /// Balance of the card's primary account.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if storage fails.
    pub async fn balance_of_primary(
        &self,
        card_id: &CardId,
    ) -> Result<Option<PrimaryAccountBalance>> {
        let Some(card) = self.cards.find_by_id(card_id).await? else {
            return Ok(None);
        };
        let Some(account) = self.accounts.find_by_id(&card.primary_account_id).await? else {
            return Ok(None);
        };

        Ok(Some(PrimaryAccountBalance {
            card_id: card.id,
            card_number: card.card_number,
            primary_account_id: account.id,
            balance: account.balance,
        }))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if storage fails.
    pub async fn find_by_id(&self, card_id: &CardId) -> Result<Option<DebitCard>> {
        self.cards.find_by_id(card_id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if storage fails.
    pub async fn find_by_card_number(&self, card_number: &str) -> Result<Option<DebitCard>> {
        self.cards.find_by_card_number(card_number).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if storage fails.
    pub async fn find_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<DebitCard>> {
        self.cards.find_by_customer(customer_id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if storage fails.
    pub async fn find_by_primary_account(&self, account_id: &AccountId) -> Result<Vec<DebitCard>> {
        self.cards.find_by_primary_account(account_id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if storage fails.
    pub async fn find_by_associated_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<DebitCard>> {
        self.cards.find_by_associated_account(account_id).await
    }
}
