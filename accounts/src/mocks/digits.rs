//! Scripted digit source.

use super::lock;
use crate::card_number::DigitSource;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Returns pre-scripted digit strings in order, then zeros.
///
/// Scripted strings are returned as given, whatever count is requested.
#[derive(Debug, Default)]
pub struct ScriptedDigits {
    script: Mutex<VecDeque<String>>,
}

impl ScriptedDigits {
    /// Script the next draws.
    #[must_use]
    pub fn new<I, S>(draws: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(draws.into_iter().map(Into::into).collect()),
        }
    }
}

impl DigitSource for ScriptedDigits {
    fn digits(&self, count: usize) -> String {
        lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| "0".repeat(count))
    }
}
