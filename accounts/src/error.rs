//! Error types for account and debit-card operations.
//!
//! Not-found is never an error here: lookups return `Ok(None)` and callers
//! treat that as an empty result.

use crate::model::{AccountId, AccountType, CardId, CustomerId, CustomerType};
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias for account service operations.
pub type Result<T> = std::result::Result<T, AccountError>;

/// Coarse classification of an [`AccountError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or a business rule rejected the request. Never retried.
    Validation,
    /// A remote dependency failed after its fallback policy was applied.
    Dependency,
    /// Card, account and customer ids do not line up. Never retried.
    Ownership,
    /// Storage or internal failure.
    System,
}

/// Error taxonomy for the account policy engine and debit-card lifecycle.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccountError {
    // ═══════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════

    /// The customer has overdue debt (or the debt check could not be made).
    #[error("Customer {customer_id} has overdue debt")]
    OverdueDebt {
        /// Customer that was checked
        customer_id: CustomerId,
    },

    /// Balance must be greater than or equal to zero.
    #[error("Account balance must be greater than or equal to 0, got {0}")]
    InvalidBalance(Decimal),

    /// The customer id was empty.
    #[error("Customer id must not be empty")]
    InvalidCustomerId,

    /// A personal customer already holds an account of this type.
    #[error("Personal customers can have only one {account_type} account")]
    DuplicateAccountType {
        /// The requested account type
        account_type: AccountType,
    },

    /// A personal account listed someone other than the owner as holder.
    #[error("Personal customers can only have themselves as account holders (got '{holder}')")]
    HolderNotOwner {
        /// The offending holder name
        holder: String,
    },

    /// The account type is not available for this kind of customer.
    #[error("{customer_type} customers cannot open {account_type} accounts")]
    AccountTypeNotAllowed {
        /// The customer's type
        customer_type: CustomerType,
        /// The requested account type
        account_type: AccountType,
    },

    // ═══════════════════════════════════════════════════════════
    // Dependency Errors
    // ═══════════════════════════════════════════════════════════

    /// The customer could not be resolved or updated.
    #[error("Customer service unavailable for customer {customer_id}: {reason}")]
    CustomerUnavailable {
        /// Customer being resolved
        customer_id: CustomerId,
        /// Underlying failure
        reason: String,
    },

    /// Credit card ownership could not be determined.
    #[error("Credit service is unavailable, cannot continue with the operation: {reason}")]
    CreditServiceUnavailable {
        /// Underlying failure
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Ownership Errors
    // ═══════════════════════════════════════════════════════════

    /// The account does not exist or belongs to another customer.
    #[error("Account {account_id} does not belong to customer {customer_id}")]
    AccountOwnershipMismatch {
        /// Account that was checked
        account_id: AccountId,
        /// Customer that claimed it
        customer_id: CustomerId,
    },

    /// Card and account belong to different customers.
    #[error("Card {card_id} and account {account_id} belong to different customers")]
    CustomerMismatch {
        /// The card
        card_id: CardId,
        /// The account
        account_id: AccountId,
    },

    /// The account is not associated with the card.
    #[error("Account {account_id} is not associated with card {card_id}")]
    AccountNotAssociated {
        /// The card
        card_id: CardId,
        /// The account
        account_id: AccountId,
    },

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// A generated card number collided with a stored one on write.
    #[error("Card number already exists")]
    DuplicateCardNumber,

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Internal error (should not be exposed to callers).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AccountError {
    /// Classify this error.
    ///
    /// # Examples
    ///
    /// ```
    /// # use account_service::error::{AccountError, ErrorKind};
    /// assert_eq!(AccountError::InvalidCustomerId.kind(), ErrorKind::Validation);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OverdueDebt { .. }
            | Self::InvalidBalance(_)
            | Self::InvalidCustomerId
            | Self::DuplicateAccountType { .. }
            | Self::HolderNotOwner { .. }
            | Self::AccountTypeNotAllowed { .. } => ErrorKind::Validation,
            Self::CustomerUnavailable { .. } | Self::CreditServiceUnavailable { .. } => {
                ErrorKind::Dependency
            }
            Self::AccountOwnershipMismatch { .. }
            | Self::CustomerMismatch { .. }
            | Self::AccountNotAssociated { .. } => ErrorKind::Ownership,
            Self::DuplicateCardNumber | Self::DatabaseError(_) | Self::InternalError(_) => {
                ErrorKind::System
            }
        }
    }

    /// Returns `true` if the requester caused this error and should see it.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::Ownership)
    }
}

/// Failure of an outbound HTTP call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Connection, timeout or other transport failure.
    #[error("network error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service error: HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The response body could not be decoded.
    #[error("parse error: {0}")]
    Decode(String),
}

/// Failure of a customer cache operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The key was empty.
    #[error("Cache key must not be empty")]
    InvalidKey,

    /// The cache backend failed.
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// The cached value could not be encoded or decoded.
    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overdue_debt_is_a_validation_error() {
        let err = AccountError::OverdueDebt {
            customer_id: CustomerId::new("C-1"),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.is_user_error());
    }

    #[test]
    fn dependency_failures_are_not_user_errors() {
        let err = AccountError::CreditServiceUnavailable {
            reason: "circuit open".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Dependency);
        assert!(!err.is_user_error());
    }

    #[test]
    fn ownership_message_names_both_sides() {
        let err = AccountError::CustomerMismatch {
            card_id: CardId::new("card-1"),
            account_id: AccountId::new("acc-2"),
        };
        assert_eq!(err.kind(), ErrorKind::Ownership);
        assert_eq!(
            err.to_string(),
            "Card card-1 and account acc-2 belong to different customers"
        );
    }
}
