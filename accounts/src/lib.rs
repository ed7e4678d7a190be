//! # Account Service
//!
//! Bank account and debit card lifecycles for retail and business customers.
//!
//! ## Components
//!
//! - [`policy::AccountPolicyEngine`]: account opening rules, derived fields
//!   and VIP/PYM synchronisation with the customer registry
//! - [`debit_card::DebitCardLifecycle`]: card issue, account links, primary
//!   account changes and status transitions
//! - [`card_number::CardNumberGenerator`]: unique, Luhn-valid card numbers
//! - [`customer::CustomerResolver`]: cache-aside customer lookup
//! - [`eligibility::EligibilityGate`]: debt and credit-card checks with fixed
//!   fallbacks
//! - [`resilience::DependencyBreakers`]: one circuit breaker per remote service
//!
//! ## Architecture
//!
//! ```text
//!            ┌─────────────────────┐     ┌──────────────────────┐
//!  create ──►│ AccountPolicyEngine │     │ DebitCardLifecycle   │◄── issue
//!            └──┬──────────┬───────┘     └──┬────────────┬──────┘
//!               │          │                │            │
//!               ▼          ▼                ▼            ▼
//!    CustomerResolver   EligibilityGate ◄───┘   CardNumberGenerator
//!      │        │          │        │
//!      ▼        ▼          ▼        ▼
//!    cache   customer    credit  eligibility      (breaker per service)
//! ```
//!
//! Collaborators are traits in [`providers`]. Production adapters live in
//! [`stores`] and [`clients`]; in-memory doubles in [`mocks`].
//!
//! ## Fallbacks
//!
//! | dependency  | on failure                              |
//! |-------------|-----------------------------------------|
//! | eligibility | assume overdue debt, block the request  |
//! | credit      | fail with `CreditServiceUnavailable`    |
//! | customer    | fail with `CustomerUnavailable`         |
//! | bus publish | log and continue                        |

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod card_number;
pub mod clients;
pub mod config;
pub mod consumers;
pub mod customer;
pub mod debit_card;
pub mod eligibility;
pub mod error;
pub mod events;
pub mod model;
pub mod policy;
pub mod providers;
pub mod resilience;
pub mod stores;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use card_number::CardNumberGenerator;
pub use config::{AccountPolicyConfig, Config};
pub use customer::{CustomerGateway, CustomerResolver};
pub use debit_card::DebitCardLifecycle;
pub use eligibility::EligibilityGate;
pub use error::{AccountError, ErrorKind, Result};
pub use events::AccountEventPublisher;
pub use policy::AccountPolicyEngine;
pub use resilience::DependencyBreakers;
