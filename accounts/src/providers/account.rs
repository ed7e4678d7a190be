//! Account storage trait.

use crate::error::Result;
use crate::model::{Account, AccountId, CustomerId};
use futures::future::BoxFuture;

/// Account repository.
///
/// # Implementation Notes
///
/// - `insert_exclusive` must be atomic with respect to the
///   `(customer_id, account_type)` slot. Two concurrent inserts for the same
///   slot leave exactly one row and the loser gets
///   `AccountError::DuplicateAccountType`.
/// - `save` is an upsert by id.
pub trait AccountRepository: Send + Sync {
    /// Find an account by id.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::DatabaseError` if the query fails.
    fn find_by_id<'a>(&'a self, id: &'a AccountId) -> BoxFuture<'a, Result<Option<Account>>>;

    /// All accounts.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::DatabaseError` if the query fails.
    fn find_all(&self) -> BoxFuture<'_, Result<Vec<Account>>>;

    /// Accounts owned by `customer_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::DatabaseError` if the query fails.
    fn find_by_customer<'a>(
        &'a self,
        customer_id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<Vec<Account>>>;

    /// Insert a new account that must be the only one of its type for its
    /// customer.
    ///
    /// # Errors
    ///
    /// - `AccountError::DuplicateAccountType` if the slot is taken
    /// - `AccountError::DatabaseError` if the write fails
    fn insert_exclusive<'a>(&'a self, account: &'a Account) -> BoxFuture<'a, Result<Account>>;

    /// Insert or update an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::DatabaseError` if the write fails.
    fn save<'a>(&'a self, account: &'a Account) -> BoxFuture<'a, Result<Account>>;

    /// Delete an account by id. Returns `false` if nothing was deleted.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::DatabaseError` if the write fails.
    fn delete<'a>(&'a self, id: &'a AccountId) -> BoxFuture<'a, Result<bool>>;
}
