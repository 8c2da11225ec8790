//! Runtime configuration for the ledger service.
//!
//! Values come from environment variables; anything unset takes its default.

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use stockroom_inventory::RemovalGuard;
use stockroom_inventory::ledger::MAX_INPUT_DIGITS;

pub const DEFAULT_CHANNEL: &str = "inventory-changes";

pub const ENV_CHANNEL: &str = "STOCKROOM_CHANNEL";
pub const ENV_CONCURRENCY: &str = "STOCKROOM_CONCURRENCY";
pub const ENV_REMOVAL_GUARD: &str = "STOCKROOM_REMOVAL_GUARD";

/// How concurrent writes to the same item are resolved.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// The later write silently replaces the earlier one.
    #[default]
    LastWriteWins,
    /// Writes carrying a stale revision are rejected with a conflict.
    RevisionCheck,
}

impl ConcurrencyMode {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim() {
            "last_write_wins" => Ok(Self::LastWriteWins),
            "revision_check" => Ok(Self::RevisionCheck),
            other => bail!("unknown concurrency mode '{other}'"),
        }
    }
}

fn parse_guard(raw: &str) -> anyhow::Result<RemovalGuard> {
    match raw.trim() {
        "advisory" => Ok(RemovalGuard::Advisory),
        "enforced" => Ok(RemovalGuard::Enforced),
        other => bail!("unknown removal guard '{other}'"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockroomConfig {
    /// Realtime channel name shared by every client of the same store.
    pub channel: String,
    pub concurrency: ConcurrencyMode,
    pub removal_guard: RemovalGuard,
    /// Fixed; exposed so clients can size their input.
    pub max_input_digits: usize,
}

impl Default for StockroomConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            concurrency: ConcurrencyMode::default(),
            removal_guard: RemovalGuard::default(),
            max_input_digits: MAX_INPUT_DIGITS,
        }
    }
}

impl StockroomConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(channel) = lookup(ENV_CHANNEL) {
            let channel = channel.trim();
            if channel.is_empty() {
                bail!("{ENV_CHANNEL} must not be empty");
            }
            cfg.channel = channel.to_string();
        }

        if let Some(raw) = lookup(ENV_CONCURRENCY) {
            cfg.concurrency = ConcurrencyMode::parse(&raw)
                .with_context(|| format!("invalid {ENV_CONCURRENCY}"))?;
        }

        if let Some(raw) = lookup(ENV_REMOVAL_GUARD) {
            cfg.removal_guard =
                parse_guard(&raw).with_context(|| format!("invalid {ENV_REMOVAL_GUARD}"))?;
        }

        Ok(cfg)
    }
}
