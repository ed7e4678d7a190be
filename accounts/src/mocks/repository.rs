//! Mock account and debit card repositories.

use super::lock;
use crate::error::{AccountError, Result};
use crate::model::{Account, AccountId, CardId, CustomerId, DebitCard};
use crate::providers::{AccountRepository, DebitCardRepository};
use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock account repository.
///
/// Keeps insertion order, so per-customer listings come back oldest first.
#[derive(Debug, Clone, Default)]
pub struct MockAccountRepository {
    accounts: Arc<Mutex<Vec<Account>>>,
}

impl MockAccountRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an account directly, bypassing every check.
    pub fn insert(&self, account: Account) {
        upsert(&mut lock(&self.accounts), account, |a| &a.id);
    }

    /// Stored account by id.
    #[must_use]
    pub fn get(&self, id: &AccountId) -> Option<Account> {
        lock(&self.accounts).iter().find(|a| &a.id == id).cloned()
    }

    /// Number of stored accounts.
    #[must_use]
    pub fn count(&self) -> usize {
        lock(&self.accounts).len()
    }
}

impl AccountRepository for MockAccountRepository {
    fn find_by_id<'a>(&'a self, id: &'a AccountId) -> BoxFuture<'a, Result<Option<Account>>> {
        async move { Ok(self.get(id)) }.boxed()
    }

    fn find_all(&self) -> BoxFuture<'_, Result<Vec<Account>>> {
        async move { Ok(lock(&self.accounts).clone()) }.boxed()
    }

    fn find_by_customer<'a>(
        &'a self,
        customer_id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<Vec<Account>>> {
        async move {
            Ok(lock(&self.accounts)
                .iter()
                .filter(|a| &a.customer_id == customer_id)
                .cloned()
                .collect())
        }
        .boxed()
    }

    fn insert_exclusive<'a>(&'a self, account: &'a Account) -> BoxFuture<'a, Result<Account>> {
        async move {
            let mut accounts = lock(&self.accounts);
            if accounts.iter().any(|a| {
                a.customer_id == account.customer_id && a.account_type == account.account_type
            }) {
                return Err(AccountError::DuplicateAccountType {
                    account_type: account.account_type,
                });
            }
            accounts.push(account.clone());
            Ok(account.clone())
        }
        .boxed()
    }

    fn save<'a>(&'a self, account: &'a Account) -> BoxFuture<'a, Result<Account>> {
        async move {
            self.insert(account.clone());
            Ok(account.clone())
        }
        .boxed()
    }

    fn delete<'a>(&'a self, id: &'a AccountId) -> BoxFuture<'a, Result<bool>> {
        async move {
            let mut accounts = lock(&self.accounts);
            let before = accounts.len();
            accounts.retain(|a| &a.id != id);
            Ok(accounts.len() < before)
        }
        .boxed()
    }
}

/// Mock debit card repository.
///
/// Enforces unique card numbers on save, like the real store.
#[derive(Debug, Clone, Default)]
pub struct MockDebitCardRepository {
    cards: Arc<Mutex<Vec<DebitCard>>>,
    forced_conflicts: Arc<AtomicUsize>,
}

impl MockDebitCardRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a card directly, bypassing every check.
    pub fn insert(&self, card: DebitCard) {
        upsert(&mut lock(&self.cards), card, |c| &c.id);
    }

    /// Stored card by id.
    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<DebitCard> {
        lock(&self.cards).iter().find(|c| &c.id == id).cloned()
    }

    /// Number of stored cards.
    #[must_use]
    pub fn count(&self) -> usize {
        lock(&self.cards).len()
    }

    /// Make the next `n` saves fail with `DuplicateCardNumber`, as if
    /// another writer had just taken the number.
    pub fn conflict_next_saves(&self, n: usize) {
        self.forced_conflicts.store(n, Ordering::SeqCst);
    }

    fn filtered(&self, keep: impl Fn(&DebitCard) -> bool) -> Vec<DebitCard> {
        lock(&self.cards).iter().filter(|c| keep(c)).cloned().collect()
    }
}

impl DebitCardRepository for MockDebitCardRepository {
    fn find_by_id<'a>(&'a self, id: &'a CardId) -> BoxFuture<'a, Result<Option<DebitCard>>> {
        async move { Ok(self.get(id)) }.boxed()
    }

    fn find_by_card_number<'a>(
        &'a self,
        card_number: &'a str,
    ) -> BoxFuture<'a, Result<Option<DebitCard>>> {
        async move { Ok(self.filtered(|c| c.card_number == card_number).pop()) }.boxed()
    }

    fn exists_by_card_number<'a>(&'a self, card_number: &'a str) -> BoxFuture<'a, Result<bool>> {
        async move {
            Ok(lock(&self.cards)
                .iter()
                .any(|c| c.card_number == card_number))
        }
        .boxed()
    }

    fn find_by_customer<'a>(
        &'a self,
        customer_id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<Vec<DebitCard>>> {
        async move { Ok(self.filtered(|c| &c.customer_id == customer_id)) }.boxed()
    }

    fn find_by_primary_account<'a>(
        &'a self,
        account_id: &'a AccountId,
    ) -> BoxFuture<'a, Result<Vec<DebitCard>>> {
        async move { Ok(self.filtered(|c| &c.primary_account_id == account_id)) }.boxed()
    }

    fn find_by_associated_account<'a>(
        &'a self,
        account_id: &'a AccountId,
    ) -> BoxFuture<'a, Result<Vec<DebitCard>>> {
        async move { Ok(self.filtered(|c| c.is_associated(account_id))) }.boxed()
    }

    fn save<'a>(&'a self, card: &'a DebitCard) -> BoxFuture<'a, Result<DebitCard>> {
        async move {
            let forced = self
                .forced_conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if forced {
                return Err(AccountError::DuplicateCardNumber);
            }

            let mut cards = lock(&self.cards);
            if cards
                .iter()
                .any(|c| c.card_number == card.card_number && c.id != card.id)
            {
                return Err(AccountError::DuplicateCardNumber);
            }
            upsert(&mut cards, card.clone(), |c| &c.id);
            Ok(card.clone())
        }
        .boxed()
    }
}

fn upsert<T, K: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> &K) {
    match items.iter().position(|existing| key(existing) == key(&item)) {
        Some(index) => items[index] = item,
        None => items.push(item),
    }
}
