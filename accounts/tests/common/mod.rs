//! Shared wiring for integration tests: every collaborator is an in-memory
//! double, the clock is fixed and the bus records what is published.

#![allow(dead_code)]

use account_service::config::{AccountPolicyConfig, Topics};
use account_service::consumers::{
    AccountConsumers, CardLinkConsumer, CustomerEventConsumer, WalletAssociationConsumer,
};
use account_service::mocks::{
    customer, MockAccountRepository, MockCreditClient, MockCustomerCache, MockCustomerClient,
    MockDebitCardRepository, MockEligibilityClient,
};
use account_service::model::{Customer, CustomerType};
use account_service::providers::AccountRepository;
use account_service::{
    AccountEventPublisher, AccountPolicyEngine, CardNumberGenerator, CustomerGateway,
    CustomerResolver, DebitCardLifecycle, DependencyBreakers, EligibilityGate,
};
use account_service_core::environment::Clock;
use account_service_testing::{test_clock, InMemoryEventBus};
use std::sync::Arc;

pub struct Harness {
    pub accounts: MockAccountRepository,
    pub cards: MockDebitCardRepository,
    pub cache: MockCustomerCache,
    pub customers: MockCustomerClient,
    pub credit: MockCreditClient,
    pub eligibility: MockEligibilityClient,
    pub bus: InMemoryEventBus,
    pub breakers: DependencyBreakers,
    pub clock: Arc<dyn Clock>,
    pub topics: Topics,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            accounts: MockAccountRepository::new(),
            cards: MockDebitCardRepository::new(),
            cache: MockCustomerCache::new(),
            customers: MockCustomerClient::new(),
            credit: MockCreditClient::new(),
            eligibility: MockEligibilityClient::new(),
            bus: InMemoryEventBus::new(),
            breakers: DependencyBreakers::default(),
            clock: Arc::new(test_clock()),
            topics: Topics::default(),
        }
    }

    /// Register a customer with the customer service.
    pub fn register(&self, id: &str, name: &str, customer_type: CustomerType) -> Customer {
        let registered = customer(id, name, customer_type);
        self.customers.insert(registered.clone());
        registered
    }

    pub fn gateway(&self) -> CustomerGateway {
        CustomerGateway::new(Arc::new(self.customers.clone()), self.breakers.customer.clone())
    }

    pub fn gate(&self) -> EligibilityGate {
        EligibilityGate::new(
            Arc::new(self.eligibility.clone()),
            Arc::new(self.credit.clone()),
            &self.breakers,
        )
    }

    pub fn engine(&self) -> AccountPolicyEngine {
        self.engine_over(Arc::new(self.accounts.clone()))
    }

    /// An engine reading and writing accounts through `accounts`.
    pub fn engine_over(&self, accounts: Arc<dyn AccountRepository>) -> AccountPolicyEngine {
        AccountPolicyEngine::new(
            accounts,
            CustomerResolver::new(Arc::new(self.cache.clone()), self.gateway()),
            self.gate(),
            AccountEventPublisher::new(Arc::new(self.bus.clone()), &self.topics),
            Arc::clone(&self.clock),
            AccountPolicyConfig::default(),
        )
    }

    pub fn lifecycle(&self) -> DebitCardLifecycle {
        DebitCardLifecycle::new(
            Arc::new(self.cards.clone()),
            Arc::new(self.accounts.clone()),
            self.gate(),
            Arc::clone(&self.clock),
        )
    }

    pub fn lifecycle_with(&self, generator: CardNumberGenerator) -> DebitCardLifecycle {
        self.lifecycle().with_generator(generator)
    }

    pub fn consumers(&self) -> AccountConsumers {
        let bus = Arc::new(self.bus.clone());
        AccountConsumers::new(
            CustomerEventConsumer::new(Arc::new(self.cache.clone())),
            WalletAssociationConsumer::new(
                self.gateway(),
                self.engine(),
                bus.clone(),
                &self.topics.wallet_association_response,
            ),
            CardLinkConsumer::new(
                self.gateway(),
                self.engine(),
                self.lifecycle(),
                bus,
                &self.topics.card_link_confirmed,
                &self.topics.card_link_rejected,
            ),
            self.topics.clone(),
        )
    }
}
