//! Debit card number generation.
//!
//! A card number is 16 digits: the network digit `4`, fourteen random
//! digits and a Luhn check digit. The generator keeps drawing until the
//! number is not already stored.

use crate::error::{AccountError, Result};
use crate::providers::DebitCardRepository;
use account_service_runtime::metrics::CardNumberMetrics;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

/// Leading digit of every card number.
pub const NETWORK_DIGIT: char = '4';

/// Total length of a card number.
pub const CARD_NUMBER_LENGTH: usize = 16;

const RANDOM_DIGITS: usize = CARD_NUMBER_LENGTH - 2;

/// Luhn check digit for `body`, or `None` if `body` is empty or not all
/// decimal digits.
///
/// # Examples
///
/// ```
/// # use account_service::card_number::luhn_check_digit;
/// assert_eq!(luhn_check_digit("7992739871"), Some('3'));
/// ```
#[must_use]
pub fn luhn_check_digit(body: &str) -> Option<char> {
    if body.is_empty() {
        return None;
    }
    // The check digit will sit to the right, so doubling starts at the
    // rightmost body digit.
    let sum = luhn_sum(body, 0)?;
    char::from_digit((10 - sum % 10) % 10, 10)
}

/// Whether `number` is all digits and passes the Luhn checksum.
#[must_use]
pub fn is_luhn_valid(number: &str) -> bool {
    number.len() > 1 && luhn_sum(number, 1).is_some_and(|sum| sum % 10 == 0)
}

fn luhn_sum(digits: &str, doubled_parity: usize) -> Option<u32> {
    digits
        .chars()
        .rev()
        .enumerate()
        .try_fold(0, |sum, (i, c)| {
            let digit = c.to_digit(10)?;
            let value = if i % 2 == doubled_parity {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            };
            Some(sum + value)
        })
}

/// Source of random decimal digits.
pub trait DigitSource: Send + Sync {
    /// A string of `count` decimal digits.
    fn digits(&self, count: usize) -> String;
}

/// Digits from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDigits;

impl DigitSource for RandomDigits {
    fn digits(&self, count: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..count)
            .filter_map(|_| char::from_digit(rng.gen_range(0..10), 10))
            .collect()
    }
}

/// Generates card numbers that are not yet stored.
#[derive(Clone)]
pub struct CardNumberGenerator {
    cards: Arc<dyn DebitCardRepository>,
    source: Arc<dyn DigitSource>,
}

impl CardNumberGenerator {
    /// Create a generator drawing from the thread RNG.
    #[must_use]
    pub fn new(cards: Arc<dyn DebitCardRepository>) -> Self {
        Self::with_source(cards, Arc::new(RandomDigits))
    }

    /// Create a generator with an explicit digit source.
    #[must_use]
    pub fn with_source(cards: Arc<dyn DebitCardRepository>, source: Arc<dyn DigitSource>) -> Self {
        Self { cards, source }
    }

    /// A Luhn-valid number, not checked against the store.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InternalError` if the digit source produced
    /// something other than the requested digits.
    pub fn candidate(&self) -> Result<String> {
        let mut number = String::with_capacity(CARD_NUMBER_LENGTH);
        number.push(NETWORK_DIGIT);
        number.push_str(&self.source.digits(RANDOM_DIGITS));

        match luhn_check_digit(&number) {
            Some(check) if number.len() == CARD_NUMBER_LENGTH - 1 => {
                number.push(check);
                Ok(number)
            }
            _ => Err(AccountError::InternalError(format!(
                "digit source produced an invalid card body: {number}"
            ))),
        }
    }

    /// A Luhn-valid number that no stored card carries.
    ///
    /// Uniqueness holds at the time of the check. The store's unique
    /// constraint catches a concurrent issue of the same number.
    ///
    /// # Errors
    ///
    /// - `AccountError::DatabaseError` if the existence check fails
    /// - `AccountError::InternalError` if the digit source misbehaves
    pub async fn generate(&self) -> Result<String> {
        loop {
            let number = self.candidate()?;
            if !self.cards.exists_by_card_number(&number).await? {
                return Ok(number);
            }
            CardNumberMetrics::record_collision();
            debug!("Generated card number already exists, drawing again");
        }
    }
}
