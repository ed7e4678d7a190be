//! Mock remote services.

use super::lock;
use crate::error::RemoteError;
use crate::model::{CreditCard, Customer, CustomerId, StatusKind};
use crate::providers::{CreditClient, CustomerClient, EligibilityClient};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn unavailable() -> RemoteError {
    RemoteError::Transport("connection refused".to_string())
}

fn not_found(what: &str) -> RemoteError {
    RemoteError::Status {
        status: 404,
        message: format!("{what} not found"),
    }
}

/// A VIP/PYM push received by [`MockCustomerClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPush {
    /// Target customer
    pub customer_id: CustomerId,
    /// Which flag
    pub kind: StatusKind,
    /// New value
    pub value: bool,
}

/// Mock customer service.
///
/// Status pushes are recorded and applied to the stored customer.
#[derive(Debug, Clone, Default)]
pub struct MockCustomerClient {
    customers: Arc<Mutex<HashMap<CustomerId, Customer>>>,
    pushes: Arc<Mutex<Vec<StatusPush>>>,
    fetches: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl MockCustomerClient {
    /// Create a service with no customers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a customer.
    pub fn insert(&self, customer: Customer) {
        lock(&self.customers).insert(customer.id.clone(), customer);
    }

    /// Current state of a registered customer.
    #[must_use]
    pub fn customer(&self, id: &CustomerId) -> Option<Customer> {
        lock(&self.customers).get(id).cloned()
    }

    /// Make every call fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `get_customer` / `get_by_document` calls that reached the service.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Status pushes received so far, in order.
    #[must_use]
    pub fn status_pushes(&self) -> Vec<StatusPush> {
        lock(&self.pushes).clone()
    }

    fn available(&self) -> Result<(), RemoteError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

impl CustomerClient for MockCustomerClient {
    fn get_customer<'a>(
        &'a self,
        id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<Customer, RemoteError>> {
        async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.available()?;
            self.customer(id).ok_or_else(|| not_found("customer"))
        }
        .boxed()
    }

    fn get_by_document<'a>(
        &'a self,
        document_number: &'a str,
    ) -> BoxFuture<'a, Result<Customer, RemoteError>> {
        async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.available()?;
            lock(&self.customers)
                .values()
                .find(|c| c.document_number.as_deref() == Some(document_number))
                .cloned()
                .ok_or_else(|| not_found("customer"))
        }
        .boxed()
    }

    fn update_status<'a>(
        &'a self,
        id: &'a CustomerId,
        value: bool,
        kind: StatusKind,
    ) -> BoxFuture<'a, Result<Customer, RemoteError>> {
        async move {
            self.available()?;
            let mut customers = lock(&self.customers);
            let customer = customers.get_mut(id).ok_or_else(|| not_found("customer"))?;
            match kind {
                StatusKind::Vip => customer.is_vip = value,
                StatusKind::Pym => customer.is_pym = value,
            }
            lock(&self.pushes).push(StatusPush {
                customer_id: id.clone(),
                kind,
                value,
            });
            Ok(customer.clone())
        }
        .boxed()
    }
}

/// Mock credit service. Customers hold no cards until given some.
#[derive(Debug, Clone, Default)]
pub struct MockCreditClient {
    cards: Arc<Mutex<HashMap<CustomerId, Vec<CreditCard>>>>,
    failing: Arc<AtomicBool>,
}

impl MockCreditClient {
    /// Create a service with no cards.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Give the customer a credit card.
    pub fn give_card(&self, customer_id: &CustomerId, card_number: &str) {
        let mut cards = lock(&self.cards);
        let held = cards.entry(customer_id.clone()).or_default();
        held.push(CreditCard {
            id: format!("cc-{}", held.len() + 1),
            customer_id: Some(customer_id.to_string()),
            card_number: Some(card_number.to_string()),
        });
    }

    /// Make every call fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl CreditClient for MockCreditClient {
    fn credit_cards_of<'a>(
        &'a self,
        customer_id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<Vec<CreditCard>, RemoteError>> {
        async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            Ok(lock(&self.cards)
                .get(customer_id)
                .cloned()
                .unwrap_or_default())
        }
        .boxed()
    }
}

/// Mock eligibility service. Customers are debt-free until marked.
#[derive(Debug, Clone, Default)]
pub struct MockEligibilityClient {
    overdue: Arc<Mutex<HashMap<CustomerId, bool>>>,
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl MockEligibilityClient {
    /// Create a service where nobody has debt.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the customer's debt status.
    pub fn set_overdue(&self, customer_id: &CustomerId, overdue: bool) {
        lock(&self.overdue).insert(customer_id.clone(), overdue);
    }

    /// Make every call fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of calls that reached the service.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EligibilityClient for MockEligibilityClient {
    fn has_overdue_debt<'a>(
        &'a self,
        customer_id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<bool, RemoteError>> {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            Ok(lock(&self.overdue)
                .get(customer_id)
                .copied()
                .unwrap_or(false))
        }
        .boxed()
    }
}
