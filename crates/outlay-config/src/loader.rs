// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./outlay.toml` > `~/.config/outlay/outlay.toml` > `/etc/outlay/outlay.toml`
//! with environment variable overrides via `OUTLAY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::OutlayConfig;

/// Config sections, in the order env keys are matched against.
const SECTIONS: &[&str] = &["server", "storage", "expense", "client", "retry", "submission"];

const SYSTEM_CONFIG: &str = "/etc/outlay/outlay.toml";
const LOCAL_CONFIG: &str = "outlay.toml";

fn user_config() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("outlay/outlay.toml"))
        .unwrap_or_default()
}

/// Build the layered Figment without extracting it.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/outlay/outlay.toml` (system-wide)
/// 3. `~/.config/outlay/outlay.toml` (user XDG config)
/// 4. `./outlay.toml` (local directory)
/// 5. `OUTLAY_*` environment variables
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(OutlayConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
pub fn load_config() -> Result<OutlayConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<OutlayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OutlayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OutlayConfig, figment::Error> {
    tracing::debug!(path = %path.display(), "loading configuration file");
    Figment::new()
        .merge(Serialized::defaults(OutlayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Paths consulted by [`load_config`], lowest precedence first.
pub fn config_search_paths() -> Vec<PathBuf> {
    let local = std::env::current_dir()
        .map(|d| d.join(LOCAL_CONFIG))
        .unwrap_or_else(|_| PathBuf::from(LOCAL_CONFIG));
    vec![PathBuf::from(SYSTEM_CONFIG), user_config(), local]
}

/// Map an env key (prefix stripped, lowercased) onto its dotted config path.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `OUTLAY_RETRY_MAX_RETRIES` maps to `retry.max_retries`.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

fn env_provider() -> Env {
    Env::prefixed("OUTLAY_").map(|key| map_env_key(key.as_str()).into())
}
