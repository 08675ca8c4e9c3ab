use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::persistence::{FlushPolicy, LoadStrategy};

const FLUSH_EVERY_N_WRITES_DEFAULT: u64 = 32;

/// Store-level settings. `Default` is a purely in-memory store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub snapshot_path: Option<PathBuf>,
    pub flush_policy: FlushPolicy,
    pub load_strategy: LoadStrategy,
    /// fsync the snapshot file and its directory on every save.
    pub sync_on_save: bool,
    /// Load the snapshot in `VectorStore::open` when the file exists.
    pub load_on_open: bool,
}

impl StoreConfig {
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn with_flush_policy(mut self, flush_policy: FlushPolicy) -> Self {
        self.flush_policy = flush_policy;
        self
    }

    pub fn with_load_strategy(mut self, load_strategy: LoadStrategy) -> Self {
        self.load_strategy = load_strategy;
        self
    }

    pub fn with_sync_on_save(mut self, sync_on_save: bool) -> Self {
        self.sync_on_save = sync_on_save;
        self
    }

    pub fn with_load_on_open(mut self, load_on_open: bool) -> Self {
        self.load_on_open = load_on_open;
        self
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    pub fn from_env() -> Result<Self> {
        let snapshot_path = parse_optional_path("VECNEST_SNAPSHOT_PATH")?;
        let flush_every_n_writes =
            parse_u64("VECNEST_FLUSH_EVERY_N_WRITES", FLUSH_EVERY_N_WRITES_DEFAULT)?;
        let flush_policy = parse_flush_policy("VECNEST_FLUSH_POLICY", flush_every_n_writes)?;
        let load_strategy = parse_load_strategy("VECNEST_LOAD_STRATEGY")?;
        let sync_on_save = parse_bool_env("VECNEST_SYNC_ON_SAVE", false)?;
        let load_on_open = parse_bool_env("VECNEST_LOAD_ON_OPEN", false)?;

        if flush_every_n_writes == 0 {
            anyhow::bail!("VECNEST_FLUSH_EVERY_N_WRITES must be > 0");
        }
        if load_on_open && snapshot_path.is_none() {
            anyhow::bail!("VECNEST_LOAD_ON_OPEN requires VECNEST_SNAPSHOT_PATH");
        }

        Ok(Self {
            snapshot_path,
            flush_policy,
            load_strategy,
            sync_on_save,
            load_on_open,
        })
    }
}

fn parse_optional_path(key: &str) -> Result<Option<PathBuf>> {
    let Ok(raw) = env::var(key) else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        anyhow::bail!("{key} must not be empty");
    }
    Ok(Some(PathBuf::from(raw)))
}

fn parse_u64(key: &str, default: u64) -> Result<u64> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .with_context(|| format!("{key} must be a positive integer, got '{raw}'"))
}

fn parse_flush_policy(key: &str, every_n_writes: u64) -> Result<FlushPolicy> {
    let raw = env::var(key).unwrap_or_else(|_| "write_through".to_string());
    match raw.to_ascii_lowercase().as_str() {
        "write_through" => Ok(FlushPolicy::WriteThrough),
        "every_n" => Ok(FlushPolicy::EveryNWrites(every_n_writes)),
        "manual" => Ok(FlushPolicy::Manual),
        _ => anyhow::bail!("{key} must be one of write_through, every_n, manual; got '{raw}'"),
    }
}

fn parse_load_strategy(key: &str) -> Result<LoadStrategy> {
    let raw = env::var(key).unwrap_or_else(|_| LoadStrategy::default().as_str().to_string());
    match raw.to_ascii_lowercase().as_str() {
        "replace_by_table" => Ok(LoadStrategy::ReplaceByTable),
        "full_replace" => Ok(LoadStrategy::FullReplace),
        _ => anyhow::bail!("{key} must be one of replace_by_table, full_replace; got '{raw}'"),
    }
}

fn parse_bool_env(key: &str, default: bool) -> Result<bool> {
    let raw = env::var(key).unwrap_or_else(|_| {
        if default {
            "true".to_string()
        } else {
            "false".to_string()
        }
    });

    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{key} must be a boolean, got '{raw}'"),
    }
}

#[cfg(test)]
mod tests;
