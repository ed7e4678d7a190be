//! In-memory collaborators for tests.
//!
//! Every provider trait has a mock here, plus a scripted digit source for
//! the card number generator and a few record builders. Mocks are cheap to
//! clone and clones share state, so a test keeps one handle for assertions
//! and gives another to the service under test.

pub mod cache;
pub mod digits;
pub mod remote;
pub mod repository;

pub use cache::MockCustomerCache;
pub use digits::ScriptedDigits;
pub use remote::{MockCreditClient, MockCustomerClient, MockEligibilityClient, StatusPush};
pub use repository::{MockAccountRepository, MockDebitCardRepository};

use crate::model::{
    Account, AccountId, AccountType, CardId, CardStatus, Customer, CustomerId, CustomerType,
    DebitCard,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mock's state. A panic in another test thread does not poison it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A customer with no flags and no descriptive fields.
#[must_use]
pub fn customer(id: &str, full_name: &str, customer_type: CustomerType) -> Customer {
    Customer {
        id: CustomerId::new(id),
        full_name: full_name.to_string(),
        customer_type,
        is_vip: false,
        is_pym: false,
        document_number: None,
        email: None,
        phone_number: None,
    }
}

/// A zero-balance account with no flags.
#[must_use]
pub fn account(id: &str, customer_id: &str, account_type: AccountType) -> Account {
    Account {
        id: AccountId::new(id),
        customer_id: CustomerId::new(customer_id),
        account_type,
        balance: Decimal::ZERO,
        is_vip: false,
        min_balance_requirement: None,
        is_pym: false,
        maintenance_fee: None,
        holders: Vec::new(),
        signers: Vec::new(),
        max_free_transaction: 0,
        transaction_cost: Decimal::ZERO,
        created_at: DateTime::<Utc>::default(),
        modified_at: None,
    }
}

/// An active card linked only to its primary account.
#[must_use]
pub fn debit_card(id: &str, card_number: &str, customer_id: &str, primary: &str) -> DebitCard {
    DebitCard {
        id: CardId::new(id),
        card_number: card_number.to_string(),
        customer_id: CustomerId::new(customer_id),
        status: CardStatus::Active,
        primary_account_id: AccountId::new(primary),
        associated_account_ids: vec![AccountId::new(primary)],
        expiration_date: DateTime::<Utc>::default(),
        created_at: DateTime::<Utc>::default(),
        modified_at: None,
    }
}
