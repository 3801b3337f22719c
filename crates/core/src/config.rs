//! Startup configuration
//!
//! Configuration is plain data deserialized from TOML (every field has a
//! default) and checked once by [`StockadeConfig::validate`] before any
//! facade is built.
//!
//! ```toml
//! strategy = "notify"
//!
//! [store]
//! transaction_timeout_ms = 1000
//!
//! [notify_lock]
//! wait_ms = 10000
//! lease_ms = 1000
//! ```
//!
//! # Consistency rules
//!
//! | Rule | Reason |
//! |------|--------|
//! | `store.transaction_timeout <= spin_lock.ttl` | lease must cover the critical section |
//! | `store.transaction_timeout <= notify_lock.lease` | lease must cover the critical section |
//! | `store.transaction_timeout <= named_lock.acquire_timeout` | waiter outlasts one holder's transaction |
//! | `spin_lock.retry_interval < spin_lock.ttl` | a poll happens within every lease |

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Which facade serializes decrements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockStrategy {
    /// Exclusive row lock inside a store transaction
    #[default]
    Pessimistic,
    /// Version-conditioned write, retried on conflict
    Optimistic,
    /// Session-scoped named lock around an independent transaction
    Named,
    /// Distributed lock polled with a fixed sleep
    Spin,
    /// Distributed lock with wake-up on release
    Notify,
}

impl LockStrategy {
    /// All strategies, in declaration order
    pub const ALL: [LockStrategy; 5] = [
        LockStrategy::Pessimistic,
        LockStrategy::Optimistic,
        LockStrategy::Named,
        LockStrategy::Spin,
        LockStrategy::Notify,
    ];

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            LockStrategy::Pessimistic => "pessimistic",
            LockStrategy::Optimistic => "optimistic",
            LockStrategy::Named => "named",
            LockStrategy::Spin => "spin",
            LockStrategy::Notify => "notify",
        }
    }
}

impl std::fmt::Display for LockStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LockStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Config(format!("unknown lock strategy: {s}")))
    }
}

/// Record store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Longest a transaction waits for another transaction's row lock
    pub row_lock_wait_timeout_ms: u64,
    /// Longest a transaction may stay open before its commit is refused
    pub transaction_timeout_ms: u64,
}

impl StoreConfig {
    /// Row lock wait bound
    pub fn row_lock_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.row_lock_wait_timeout_ms)
    }

    /// Transaction lifetime bound
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            row_lock_wait_timeout_ms: 50_000,
            transaction_timeout_ms: 1_000,
        }
    }
}

/// Optimistic facade settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimisticConfig {
    /// Sleep between a version conflict and the next attempt
    pub backoff_ms: u64,
}

impl OptimisticConfig {
    /// Backoff after a conflict
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for OptimisticConfig {
    fn default() -> Self {
        Self { backoff_ms: 50 }
    }
}

/// Named lock settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedLockConfig {
    /// Longest `acquire` blocks before failing
    pub acquire_timeout_ms: u64,
}

impl NamedLockConfig {
    /// Acquisition wait bound
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

impl Default for NamedLockConfig {
    fn default() -> Self {
        Self {
            acquire_timeout_ms: 3_000,
        }
    }
}

/// Spin lock settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinLockConfig {
    /// Lease set on every successful try-acquire
    pub ttl_ms: u64,
    /// Sleep between failed try-acquire attempts
    pub retry_interval_ms: u64,
}

impl SpinLockConfig {
    /// Lease length
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Poll interval
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for SpinLockConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 3_000,
            retry_interval_ms: 100,
        }
    }
}

/// Notify lock settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyLockConfig {
    /// Longest acquire-with-wait blocks
    pub wait_ms: u64,
    /// Lease set once acquired
    pub lease_ms: u64,
}

impl NotifyLockConfig {
    /// Acquisition wait bound
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    /// Lease length
    pub fn lease(&self) -> Duration {
        Duration::from_millis(self.lease_ms)
    }
}

impl Default for NotifyLockConfig {
    fn default() -> Self {
        Self {
            wait_ms: 10_000,
            lease_ms: 1_000,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockadeConfig {
    /// Facade used by `decrease`
    pub strategy: LockStrategy,
    /// Record store settings
    pub store: StoreConfig,
    /// Optimistic facade settings
    pub optimistic: OptimisticConfig,
    /// Named lock settings
    pub named_lock: NamedLockConfig,
    /// Spin lock settings
    pub spin_lock: SpinLockConfig,
    /// Notify lock settings
    pub notify_lock: NotifyLockConfig,
}

impl StockadeConfig {
    /// Parse a TOML document; missing fields take their defaults
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the configuration for zero durations and for lock/transaction
    /// windows that do not line up
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("store.row_lock_wait_timeout_ms", self.store.row_lock_wait_timeout_ms),
            ("store.transaction_timeout_ms", self.store.transaction_timeout_ms),
            ("optimistic.backoff_ms", self.optimistic.backoff_ms),
            ("named_lock.acquire_timeout_ms", self.named_lock.acquire_timeout_ms),
            ("spin_lock.ttl_ms", self.spin_lock.ttl_ms),
            ("spin_lock.retry_interval_ms", self.spin_lock.retry_interval_ms),
            ("notify_lock.wait_ms", self.notify_lock.wait_ms),
            ("notify_lock.lease_ms", self.notify_lock.lease_ms),
        ];
        for (name, value) in durations {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be greater than zero")));
            }
        }

        let txn = self.store.transaction_timeout_ms;
        if txn > self.spin_lock.ttl_ms {
            return Err(Error::Config(format!(
                "spin_lock.ttl_ms ({}) is shorter than store.transaction_timeout_ms ({txn})",
                self.spin_lock.ttl_ms
            )));
        }
        if txn > self.notify_lock.lease_ms {
            return Err(Error::Config(format!(
                "notify_lock.lease_ms ({}) is shorter than store.transaction_timeout_ms ({txn})",
                self.notify_lock.lease_ms
            )));
        }
        if txn > self.named_lock.acquire_timeout_ms {
            return Err(Error::Config(format!(
                "named_lock.acquire_timeout_ms ({}) is shorter than store.transaction_timeout_ms ({txn})",
                self.named_lock.acquire_timeout_ms
            )));
        }
        if self.spin_lock.retry_interval_ms >= self.spin_lock.ttl_ms {
            return Err(Error::Config(format!(
                "spin_lock.retry_interval_ms ({}) must be shorter than spin_lock.ttl_ms ({})",
                self.spin_lock.retry_interval_ms, self.spin_lock.ttl_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = StockadeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.strategy, LockStrategy::Pessimistic);
        assert_eq!(config.optimistic.backoff(), Duration::from_millis(50));
        assert_eq!(config.spin_lock.ttl(), Duration::from_secs(3));
        assert_eq!(config.spin_lock.retry_interval(), Duration::from_millis(100));
        assert_eq!(config.notify_lock.wait(), Duration::from_secs(10));
        assert_eq!(config.notify_lock.lease(), Duration::from_secs(1));
    }

    #[test]
    fn test_strategy_parse_and_display() {
        for strategy in LockStrategy::ALL {
            let parsed: LockStrategy = strategy.to_string().parse().unwrap();
            assert_eq!(parsed, strategy);
        }
        assert_eq!("  Notify ".parse::<LockStrategy>().unwrap(), LockStrategy::Notify);
        assert!("synchronized".parse::<LockStrategy>().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = StockadeConfig::from_toml_str(
            r#"
            strategy = "spin"

            [spin_lock]
            retry_interval_ms = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.strategy, LockStrategy::Spin);
        assert_eq!(config.spin_lock.retry_interval_ms, 20);
        assert_eq!(config.spin_lock.ttl_ms, 3_000);
        assert_eq!(config.store, StoreConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let err = StockadeConfig::from_toml_str(r#"strategy = "synchronized""#).unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "strategy = \"optimistic\"\n[optimistic]\nbackoff_ms = 5").unwrap();

        let config = StockadeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.strategy, LockStrategy::Optimistic);
        assert_eq!(config.optimistic.backoff_ms, 5);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = StockadeConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut config = StockadeConfig::default();
        config.notify_lock.wait_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("notify_lock.wait_ms"));
    }

    #[test]
    fn test_zero_backoff_rejected() {
        let config = StockadeConfig::from_toml_str("[optimistic]\nbackoff_ms = 0").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("optimistic.backoff_ms"));
    }

    #[test]
    fn test_lease_shorter_than_transaction_rejected() {
        let mut config = StockadeConfig::default();
        config.store.transaction_timeout_ms = 2_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("notify_lock.lease_ms"));

        config.notify_lock.lease_ms = 2_000;
        config.spin_lock.ttl_ms = 1_500;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("spin_lock.ttl_ms"));
    }

    #[test]
    fn test_named_timeout_shorter_than_transaction_rejected() {
        let mut config = StockadeConfig::default();
        config.named_lock.acquire_timeout_ms = 500;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("named_lock.acquire_timeout_ms"));
    }

    #[test]
    fn test_retry_interval_must_fit_in_ttl() {
        let mut config = StockadeConfig::default();
        config.spin_lock.retry_interval_ms = 3_000;
        assert!(config.validate().is_err());
    }
}
