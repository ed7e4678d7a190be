//! Account policy engine.
//!
//! Decides whether an account may be opened, fills in the fields derived
//! from the account type and the customer's credit cards, and keeps the
//! customer's VIP/PYM flags in line with the accounts the customer holds.
//!
//! # Creation
//!
//! ```text
//! debt check ─► balance ≥ 0 ─► resolve customer ┬─► PERSONAL: one per type,
//!                              + load accounts  │   owner is sole holder
//!                                               └─► BUSINESS: CHECKING only,
//!                                                   owner among holders
//!            ─► credit cards (SAVINGS / CHECKING) ─► persist ─► push status
//!            ─► notify
//! ```
//!
//! # Deletion
//!
//! VIP stays set on the customer only while a SAVINGS account remains, PYM
//! only while a CHECKING account remains. Deletion re-derives both and
//! pushes the resets that are needed.

use crate::config::AccountPolicyConfig;
use crate::customer::CustomerResolver;
use crate::eligibility::EligibilityGate;
use crate::error::{AccountError, Result};
use crate::events::AccountEventPublisher;
use crate::model::{
    Account, AccountDraft, AccountId, AccountPatch, AccountType, Customer, CustomerId,
    CustomerType, StatusKind,
};
use crate::providers::AccountRepository;
use account_service_core::environment::Clock;
use futures::future::{try_join, try_join_all};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Account policy engine.
#[derive(Clone)]
pub struct AccountPolicyEngine {
    accounts: Arc<dyn AccountRepository>,
    resolver: CustomerResolver,
    gate: EligibilityGate,
    publisher: AccountEventPublisher,
    clock: Arc<dyn Clock>,
    policy: AccountPolicyConfig,
}

impl AccountPolicyEngine {
    /// Create an engine.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        resolver: CustomerResolver,
        gate: EligibilityGate,
        publisher: AccountEventPublisher,
        clock: Arc<dyn Clock>,
        policy: AccountPolicyConfig,
    ) -> Self {
        Self {
            accounts,
            resolver,
            gate,
            publisher,
            clock,
            policy,
        }
    }

    /// Open an account for `customer_id`.
    ///
    /// A status push after a successful save is best effort, as is the
    /// "account created" notification.
    ///
    /// # Errors
    ///
    /// - `OverdueDebt` if the debt check is positive or cannot be made
    /// - `InvalidBalance` if the opening balance is negative
    /// - `InvalidCustomerId` / `CustomerUnavailable` if the customer cannot be resolved
    /// - `DuplicateAccountType`, `HolderNotOwner`, `AccountTypeNotAllowed` on policy violations
    /// - `CreditServiceUnavailable` if credit cards must be checked and cannot be
    /// - `DatabaseError` if storage fails
    pub async fn create(&self, draft: &AccountDraft, customer_id: &CustomerId) -> Result<Account> {
        self.gate.ensure_no_overdue_debt(customer_id).await?;
        ensure_non_negative(draft.balance)?;

        let (customer, existing) = try_join(
            self.resolver.resolve(customer_id),
            self.accounts.find_by_customer(customer_id),
        )
        .await?;

        let (account, elevation) = match customer.customer_type {
            CustomerType::Personal => self.personal_account(draft, &customer, &existing).await?,
            CustomerType::Business => self.business_account(draft, &customer).await?,
        };

        let saved = match customer.customer_type {
            CustomerType::Personal => self.accounts.insert_exclusive(&account).await?,
            CustomerType::Business => self.accounts.save(&account).await?,
        };

        info!(
            account_id = %saved.id,
            customer_id = %saved.customer_id,
            account_type = %saved.account_type,
            "Account created"
        );

        if let Some(kind) = elevation {
            // Best effort: the account stays even if the flag never lands.
            if let Err(e) = self
                .resolver
                .gateway()
                .push_status(&saved.customer_id, true, kind)
                .await
            {
                warn!(customer_id = %saved.customer_id, %kind, error = %e, "Customer status not updated");
            }
        }

        self.publisher.account_created(&saved).await;
        Ok(saved)
    }

    /// Overwrite balance, holders and signers.
    ///
    /// # Errors
    ///
    /// - `InvalidBalance` if the new balance is negative
    /// - `DatabaseError` if storage fails
    pub async fn update(&self, id: &AccountId, patch: AccountPatch) -> Result<Option<Account>> {
        ensure_non_negative(patch.balance)?;

        let Some(mut account) = self.accounts.find_by_id(id).await? else {
            return Ok(None);
        };

        account.balance = patch.balance;
        account.holders = patch.holders;
        account.signers = patch.signers;
        account.modified_at = Some(self.clock.now());

        let saved = self.accounts.save(&account).await?;
        info!(account_id = %saved.id, "Account updated");

        self.publisher.account_updated(&saved).await;
        Ok(Some(saved))
    }

    /// Delete an account, resetting customer flags it was holding up.
    ///
    /// Returns the deleted account.
    ///
    /// # Errors
    ///
    /// - `CustomerUnavailable` if the customer cannot be read or updated;
    ///   the account is then left in place
    /// - `DatabaseError` if storage fails
    pub async fn delete(&self, id: &AccountId) -> Result<Option<Account>> {
        let Some(account) = self.accounts.find_by_id(id).await? else {
            return Ok(None);
        };

        let remaining: Vec<Account> = self
            .accounts
            .find_by_customer(&account.customer_id)
            .await?
            .into_iter()
            .filter(|other| other.id != account.id)
            .collect();

        let gateway = self.resolver.gateway();
        let customer_id = &account.customer_id;

        let resets = if remaining.is_empty() {
            vec![StatusKind::Vip, StatusKind::Pym]
        } else {
            let customer = gateway.fetch(customer_id).await?;
            stale_flags(&customer, &remaining)
        };

        if !resets.is_empty() {
            try_join_all(
                resets
                    .iter()
                    .map(|kind| gateway.push_status(customer_id, false, *kind)),
            )
            .await?;
            info!(customer_id = %customer_id, ?resets, "Customer flags reset");
        }

        self.accounts.delete(&account.id).await?;
        info!(account_id = %account.id, customer_id = %customer_id, "Account deleted");

        Ok(Some(account))
    }

    /// Set VIP or PYM on an account directly, with the matching
    /// minimum-balance or fee change. Account type is not re-checked.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if storage fails.
    pub async fn update_status(
        &self,
        id: &AccountId,
        value: bool,
        kind: StatusKind,
    ) -> Result<Option<Account>> {
        let Some(mut account) = self.accounts.find_by_id(id).await? else {
            return Ok(None);
        };

        match kind {
            StatusKind::Pym => {
                account.is_pym = value;
                account.maintenance_fee = Some(if value {
                    Decimal::ZERO
                } else {
                    self.policy.maintenance_fee
                });
            }
            StatusKind::Vip => {
                account.is_vip = value;
                account.min_balance_requirement =
                    value.then_some(self.policy.min_balance_requirement);
            }
        }
        account.modified_at = Some(self.clock.now());

        let saved = self.accounts.save(&account).await?;
        info!(account_id = %saved.id, %kind, value, "Account status overridden");
        Ok(Some(saved))
    }

    /// All accounts.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if storage fails.
    pub async fn find_all(&self) -> Result<Vec<Account>> {
        self.accounts.find_all().await
    }

    /// One account.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if storage fails.
    pub async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>> {
        self.accounts.find_by_id(id).await
    }

    /// Accounts of one customer.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if storage fails.
    pub async fn find_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Account>> {
        self.accounts.find_by_customer(customer_id).await
    }

    async fn personal_account(
        &self,
        draft: &AccountDraft,
        customer: &Customer,
        existing: &[Account],
    ) -> Result<(Account, Option<StatusKind>)> {
        if existing
            .iter()
            .any(|a| a.account_type == draft.account_type)
        {
            return Err(AccountError::DuplicateAccountType {
                account_type: draft.account_type,
            });
        }
        if let Some(holder) = draft.holders.iter().find(|h| !customer.is_named(h)) {
            return Err(AccountError::HolderNotOwner {
                holder: holder.clone(),
            });
        }

        let mut account = self.base_account(draft, customer);
        account.holders = vec![customer.full_name.clone()];

        let mut elevation = None;
        if draft.account_type == AccountType::Savings {
            let has_cards = !self.gate.credit_cards_of(&customer.id).await?.is_empty();
            account.is_vip = has_cards;
            account.min_balance_requirement =
                has_cards.then_some(self.policy.min_balance_requirement);
            elevation = has_cards.then_some(StatusKind::Vip);
        }

        Ok((account, elevation))
    }

    async fn business_account(
        &self,
        draft: &AccountDraft,
        customer: &Customer,
    ) -> Result<(Account, Option<StatusKind>)> {
        if draft.account_type != AccountType::Checking {
            return Err(AccountError::AccountTypeNotAllowed {
                customer_type: customer.customer_type,
                account_type: draft.account_type,
            });
        }

        let mut account = self.base_account(draft, customer);
        if !account.holders.iter().any(|h| customer.is_named(h)) {
            account.holders.insert(0, customer.full_name.clone());
        }

        let has_cards = !self.gate.credit_cards_of(&customer.id).await?.is_empty();
        account.is_pym = has_cards;
        account.maintenance_fee = Some(if has_cards {
            Decimal::ZERO
        } else {
            self.policy.maintenance_fee
        });

        Ok((account, has_cards.then_some(StatusKind::Pym)))
    }

    fn base_account(&self, draft: &AccountDraft, customer: &Customer) -> Account {
        let limits = self.policy.limits_for(draft.account_type);
        Account {
            id: AccountId::generate(),
            customer_id: customer.id.clone(),
            account_type: draft.account_type,
            balance: draft.balance,
            is_vip: false,
            min_balance_requirement: None,
            is_pym: false,
            maintenance_fee: None,
            holders: draft.holders.clone(),
            signers: draft.signers.clone(),
            max_free_transaction: limits.max_free_transactions,
            transaction_cost: limits.transaction_cost,
            created_at: self.clock.now(),
            modified_at: None,
        }
    }
}

fn ensure_non_negative(balance: Decimal) -> Result<()> {
    if balance < Decimal::ZERO {
        return Err(AccountError::InvalidBalance(balance));
    }
    Ok(())
}

/// Flags set on the customer that no remaining account justifies.
fn stale_flags(customer: &Customer, remaining: &[Account]) -> Vec<StatusKind> {
    let holds = |t: AccountType| remaining.iter().any(|a| a.account_type == t);

    let mut stale = Vec::new();
    if customer.is_pym && !holds(AccountType::Checking) {
        stale.push(StatusKind::Pym);
    }
    if customer.is_vip && !holds(AccountType::Savings) {
        stale.push(StatusKind::Vip);
    }
    stale
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{account, customer};

    #[test]
    fn negative_zero_is_a_valid_balance() {
        assert!(ensure_non_negative(Decimal::ZERO).is_ok());
        assert!(ensure_non_negative(-Decimal::ZERO).is_ok());
        assert_eq!(
            ensure_non_negative(Decimal::NEGATIVE_ONE),
            Err(AccountError::InvalidBalance(Decimal::NEGATIVE_ONE))
        );
    }

    #[test]
    fn stale_flags_need_a_set_flag_and_no_backing_account() {
        let mut ana = customer("C-1", "Ana", CustomerType::Personal);
        ana.is_vip = true;
        ana.is_pym = true;

        let savings = account("a-1", "C-1", AccountType::Savings);
        let checking = account("a-2", "C-1", AccountType::Checking);
        let fixed = account("a-3", "C-1", AccountType::FixedTerm);

        assert!(stale_flags(&ana, &[savings.clone(), checking]).is_empty());
        assert_eq!(stale_flags(&ana, &[savings]), vec![StatusKind::Pym]);
        assert_eq!(
            stale_flags(&ana, std::slice::from_ref(&fixed)),
            vec![StatusKind::Pym, StatusKind::Vip]
        );

        ana.is_vip = false;
        ana.is_pym = false;
        assert!(stale_flags(&ana, &[fixed]).is_empty());
    }
}
