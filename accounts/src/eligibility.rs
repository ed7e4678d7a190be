//! Debt and credit-card checks with fixed fallbacks.
//!
//! | check              | on failure or open breaker          |
//! |--------------------|-------------------------------------|
//! | `has_overdue_debt` | `true` (the operation is blocked)   |
//! | `credit_cards_of`  | `AccountError::CreditServiceUnavailable` |

use crate::error::{AccountError, Result};
use crate::model::{CreditCard, CustomerId};
use crate::providers::{CreditClient, EligibilityClient};
use crate::resilience::{failure_reason, DependencyBreakers};
use account_service_runtime::CircuitBreaker;
use std::sync::Arc;
use tracing::{error, warn};

/// Eligibility and credit checks.
#[derive(Clone)]
pub struct EligibilityGate {
    eligibility: Arc<dyn EligibilityClient>,
    credit: Arc<dyn CreditClient>,
    eligibility_breaker: CircuitBreaker,
    credit_breaker: CircuitBreaker,
}

impl EligibilityGate {
    /// Create a gate using the eligibility and credit breakers.
    #[must_use]
    pub fn new(
        eligibility: Arc<dyn EligibilityClient>,
        credit: Arc<dyn CreditClient>,
        breakers: &DependencyBreakers,
    ) -> Self {
        Self {
            eligibility,
            credit,
            eligibility_breaker: breakers.eligibility.clone(),
            credit_breaker: breakers.credit.clone(),
        }
    }

    /// Whether the customer has overdue debt. Any failure counts as `true`.
    pub async fn has_overdue_debt(&self, customer_id: &CustomerId) -> bool {
        match self
            .eligibility_breaker
            .call(|| self.eligibility.has_overdue_debt(customer_id))
            .await
        {
            Ok(has_debt) => has_debt,
            Err(e) => {
                warn!(
                    customer_id = %customer_id,
                    reason = %failure_reason(&e),
                    "Debt check failed, assuming overdue debt"
                );
                true
            }
        }
    }

    /// Fail with `OverdueDebt` unless the customer is known to be debt-free.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::OverdueDebt` if the customer has overdue debt
    /// or the check could not be made.
    pub async fn ensure_no_overdue_debt(&self, customer_id: &CustomerId) -> Result<()> {
        if self.has_overdue_debt(customer_id).await {
            return Err(AccountError::OverdueDebt {
                customer_id: customer_id.clone(),
            });
        }
        Ok(())
    }

    /// Credit cards held by the customer.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::CreditServiceUnavailable` if the call fails or
    /// is short-circuited. It never degrades to an empty list.
    pub async fn credit_cards_of(&self, customer_id: &CustomerId) -> Result<Vec<CreditCard>> {
        self.credit_breaker
            .call(|| self.credit.credit_cards_of(customer_id))
            .await
            .map_err(|e| {
                let reason = failure_reason(&e);
                error!(customer_id = %customer_id, %reason, "Credit card lookup failed");
                AccountError::CreditServiceUnavailable { reason }
            })
    }
}
