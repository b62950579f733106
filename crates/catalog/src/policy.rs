//! Lending policy configuration.

use chrono::Duration;
use libris_core::ValueObject;
use serde::{Deserialize, Serialize};

/// Default loan period.
pub const DEFAULT_LOAN_PERIOD_DAYS: i64 = 14;

/// Books with more pages than this are flagged as extensive.
pub const DEFAULT_LARGE_BOOK_PAGES: i32 = 300;

/// Upper bound for the loan period (ten years).
pub const MAX_LOAN_PERIOD_DAYS: i64 = 3_650;

/// Tunables for one library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryPolicy {
    pub loan_period_days: i64,
    pub large_book_pages: i32,
}

impl Default for LibraryPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: DEFAULT_LOAN_PERIOD_DAYS,
            large_book_pages: DEFAULT_LARGE_BOOK_PAGES,
        }
    }
}

impl ValueObject for LibraryPolicy {}

impl LibraryPolicy {
    /// Read overrides from `LIBRIS_LOAN_PERIOD_DAYS` / `LIBRIS_LARGE_BOOK_PAGES`.
    ///
    /// Unset variables keep the defaults; malformed or out-of-range values are
    /// logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut policy = Self::default();

        if let Some(raw) = lookup("LIBRIS_LOAN_PERIOD_DAYS") {
            match raw.trim().parse::<i64>() {
                Ok(days) if (1..=MAX_LOAN_PERIOD_DAYS).contains(&days) => {
                    policy.loan_period_days = days;
                }
                _ => tracing::warn!(
                    value = %raw,
                    default = DEFAULT_LOAN_PERIOD_DAYS,
                    "LIBRIS_LOAN_PERIOD_DAYS out of range; using default"
                ),
            }
        }

        if let Some(raw) = lookup("LIBRIS_LARGE_BOOK_PAGES") {
            match raw.trim().parse::<i32>() {
                Ok(pages) if pages > 0 => policy.large_book_pages = pages,
                _ => tracing::warn!(
                    value = %raw,
                    default = DEFAULT_LARGE_BOOK_PAGES,
                    "LIBRIS_LARGE_BOOK_PAGES invalid; using default"
                ),
            }
        }

        policy
    }

    /// How long a loan runs. Clamped to `1..=MAX_LOAN_PERIOD_DAYS` days.
    pub fn loan_period(&self) -> Duration {
        Duration::days(self.loan_period_days.clamp(1, MAX_LOAN_PERIOD_DAYS))
    }
}
