// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Serde attributes cover shape; this module covers the semantic rules,
//! collecting every violation instead of stopping at the first.

use crate::diagnostic::ConfigError;
use crate::model::OutlayConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &OutlayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::validation(format!(
            "server.host `{host}` is not a valid IP address or hostname"
        )));
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "server.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.server.log_level
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    let expense = &config.expense;
    if !(expense.max_amount.is_finite() && expense.max_amount >= 0.01) {
        errors.push(ConfigError::validation(format!(
            "expense.max_amount must be at least 0.01, got {}",
            expense.max_amount
        )));
    }
    if expense.max_category_len == 0 {
        errors.push(ConfigError::validation(
            "expense.max_category_len must be greater than 0",
        ));
    }
    if expense.max_description_len == 0 {
        errors.push(ConfigError::validation(
            "expense.max_description_len must be greater than 0",
        ));
    }

    let base_url = config.client.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(ConfigError::validation(format!(
            "client.base_url must be an http(s) URL, got `{base_url}`"
        )));
    }
    if config.client.request_timeout_ms == 0 {
        errors.push(ConfigError::validation(
            "client.request_timeout_ms must be greater than 0",
        ));
    }

    let retry = &config.retry;
    if !(retry.backoff_multiplier.is_finite() && retry.backoff_multiplier >= 1.0) {
        errors.push(ConfigError::validation(format!(
            "retry.backoff_multiplier must be at least 1.0, got {}",
            retry.backoff_multiplier
        )));
    }
    if retry.initial_delay_ms > retry.max_delay_ms {
        errors.push(ConfigError::validation(format!(
            "retry.initial_delay_ms ({}) must not exceed retry.max_delay_ms ({})",
            retry.initial_delay_ms, retry.max_delay_ms
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
