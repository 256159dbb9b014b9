// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backoff schedule.

use std::time::Duration;

use outlay_config::model::RetryConfig;

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is `max_retries + 1`.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based):
    /// `min(initial_delay * backoff_multiplier^(retry - 1), max_delay)`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_multiplier.max(1.0).powi(exponent);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        if capped.is_finite() {
            Duration::from_millis(capped.round() as u64)
        } else {
            self.max_delay
        }
    }

    /// The full delay schedule, one entry per permitted retry.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..=self.max_retries)
            .map(|retry| self.delay_for_retry(retry))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_millis).collect()
    }

    #[test]
    fn default_schedule_doubles_from_one_second() {
        assert_eq!(RetryPolicy::default().schedule(), ms(&[1000, 2000, 4000]));
    }

    #[test]
    fn delays_are_capped() {
        let policy = RetryPolicy {
            max_retries: 6,
            ..RetryPolicy::default()
        };
        assert_eq!(
            policy.schedule(),
            ms(&[1000, 2000, 4000, 8000, 10_000, 10_000])
        );
    }

    #[test]
    fn multiplier_of_one_is_constant() {
        let policy = RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 1.0,
        };
        assert_eq!(policy.schedule(), ms(&[250, 250, 250]));
    }

    #[test]
    fn huge_retry_numbers_saturate_at_max_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_retry(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn no_retries_has_empty_schedule() {
        assert!(RetryPolicy::no_retries().schedule().is_empty());
    }
}
