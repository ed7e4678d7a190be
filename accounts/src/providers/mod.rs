//! Collaborator traits.
//!
//! Everything the policy engine and the card lifecycle talk to sits behind
//! one of these traits: storage, the customer cache and the three remote
//! services. Services hold them as `Arc<dyn Trait>`, so every method returns
//! a boxed future.
//!
//! This enables:
//! - **Testing**: in-memory doubles from [`crate::mocks`]
//! - **Production**: Postgres, Redis and HTTP adapters from [`crate::stores`]
//!   and [`crate::clients`]
//!
//! Lookups report a missing row as `Ok(None)`. Errors are reserved for
//! failures of the collaborator itself.

pub mod account;
pub mod cache;
pub mod debit_card;
pub mod remote;

pub use account::AccountRepository;
pub use cache::{cache_key, CustomerCache, CUSTOMER_KEY_PREFIX};
pub use debit_card::DebitCardRepository;
pub use remote::{CreditClient, CustomerClient, EligibilityClient};
