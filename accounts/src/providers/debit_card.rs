//! Debit card storage trait.

use crate::error::Result;
use crate::model::{AccountId, CardId, CustomerId, DebitCard};
use futures::future::BoxFuture;

/// Debit card repository.
///
/// Card numbers are unique. `save` reports a clash with another card's
/// number as `AccountError::DuplicateCardNumber`. Cards are never removed.
pub trait DebitCardRepository: Send + Sync {
    /// Find a card by id.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::DatabaseError` if the query fails.
    fn find_by_id<'a>(&'a self, id: &'a CardId) -> BoxFuture<'a, Result<Option<DebitCard>>>;

    /// Find a card by its number.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::DatabaseError` if the query fails.
    fn find_by_card_number<'a>(
        &'a self,
        card_number: &'a str,
    ) -> BoxFuture<'a, Result<Option<DebitCard>>>;

    /// Whether any card carries `card_number`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::DatabaseError` if the query fails.
    fn exists_by_card_number<'a>(&'a self, card_number: &'a str) -> BoxFuture<'a, Result<bool>>;

    /// Cards owned by `customer_id`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::DatabaseError` if the query fails.
    fn find_by_customer<'a>(
        &'a self,
        customer_id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<Vec<DebitCard>>>;

    /// Cards whose primary account is `account_id`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::DatabaseError` if the query fails.
    fn find_by_primary_account<'a>(
        &'a self,
        account_id: &'a AccountId,
    ) -> BoxFuture<'a, Result<Vec<DebitCard>>>;

    /// Cards that list `account_id` among their associated accounts.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::DatabaseError` if the query fails.
    fn find_by_associated_account<'a>(
        &'a self,
        account_id: &'a AccountId,
    ) -> BoxFuture<'a, Result<Vec<DebitCard>>>;

    /// Insert or update a card.
    ///
    /// # Errors
    ///
    /// - `AccountError::DuplicateCardNumber` if another card has this number
    /// - `AccountError::DatabaseError` if the write fails
    fn save<'a>(&'a self, card: &'a DebitCard) -> BoxFuture<'a, Result<DebitCard>>;
}
