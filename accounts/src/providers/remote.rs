//! Remote service traits.
//!
//! These are raw transports. Breakers and fallbacks are applied by the
//! callers in [`crate::customer`] and [`crate::eligibility`].

use crate::error::RemoteError;
use crate::model::{CreditCard, Customer, CustomerId, StatusKind};
use futures::future::BoxFuture;

/// Customer registry.
pub trait CustomerClient: Send + Sync {
    /// Fetch a customer by id.
    ///
    /// # Errors
    ///
    /// Returns a `RemoteError` if the call fails or the customer is unknown.
    fn get_customer<'a>(&'a self, id: &'a CustomerId)
    -> BoxFuture<'a, Result<Customer, RemoteError>>;

    /// Fetch a customer by document number.
    ///
    /// # Errors
    ///
    /// Returns a `RemoteError` if the call fails or no customer matches.
    fn get_by_document<'a>(
        &'a self,
        document_number: &'a str,
    ) -> BoxFuture<'a, Result<Customer, RemoteError>>;

    /// Set the customer's VIP or PYM flag.
    ///
    /// # Errors
    ///
    /// Returns a `RemoteError` if the call fails.
    fn update_status<'a>(
        &'a self,
        id: &'a CustomerId,
        value: bool,
        kind: StatusKind,
    ) -> BoxFuture<'a, Result<Customer, RemoteError>>;
}

/// Credit card registry.
pub trait CreditClient: Send + Sync {
    /// Credit cards held by the customer. "No cards" is an empty list.
    ///
    /// # Errors
    ///
    /// Returns a `RemoteError` if the call fails.
    fn credit_cards_of<'a>(
        &'a self,
        customer_id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<Vec<CreditCard>, RemoteError>>;
}

/// Debt registry.
pub trait EligibilityClient: Send + Sync {
    /// Whether the customer has overdue debt.
    ///
    /// # Errors
    ///
    /// Returns a `RemoteError` if the call fails.
    fn has_overdue_debt<'a>(
        &'a self,
        customer_id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<bool, RemoteError>>;
}
