//! In-process distributed lock service
//!
//! Leases live in a map guarded by a parking_lot mutex. Every release
//! broadcasts on a condition variable, which is what `acquire_wait` sleeps
//! on: waiters wake on release (or on the current lease running out)
//! instead of polling.
//!
//! ## Limitations
//! - Not persistent (leases lost on restart)
//! - Not shared across processes
//! - Expired leases are replaced lazily, on the next acquire for the key

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use stockade_core::{DistributedLockService, Error, HolderToken, LockHandle, Result};

#[derive(Debug, Clone, Copy)]
struct Lease {
    holder: HolderToken,
    expires_at: Instant,
}

impl Lease {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process lock service with TTL leases and wake-on-release waits
#[derive(Debug)]
pub struct MemoryLockService {
    leases: Mutex<FxHashMap<String, Lease>>,
    released: Condvar,
    /// Acquire calls served, a proxy for provider load
    requests: AtomicU64,
    available: AtomicBool,
}

impl MemoryLockService {
    /// Create an empty lock service
    pub fn new() -> Self {
        Self {
            leases: Mutex::new(FxHashMap::default()),
            released: Condvar::new(),
            requests: AtomicU64::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// Number of acquire calls served so far
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Simulate the service going away (`false`) or coming back (`true`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::LockService("distributed lock service unavailable".to_string()))
        }
    }

    /// Insert a lease for `holder` if `key` is free or its lease expired
    fn grant(
        leases: &mut FxHashMap<String, Lease>,
        key: &str,
        holder: HolderToken,
        ttl: Duration,
        now: Instant,
    ) -> Option<LockHandle> {
        if let Some(existing) = leases.get(key) {
            if existing.is_live(now) {
                return None;
            }
            tracing::debug!(key, stale_holder = %existing.holder, "replacing expired lease");
        }
        leases.insert(
            key.to_string(),
            Lease {
                holder,
                expires_at: now + ttl,
            },
        );
        Some(LockHandle {
            key: key.to_string(),
            holder,
            acquired_at: now,
            ttl: Some(ttl),
        })
    }
}

impl Default for MemoryLockService {
    fn default() -> Self {
        Self::new()
    }
}

impl DistributedLockService for MemoryLockService {
    fn try_acquire(
        &self,
        key: &str,
        holder: HolderToken,
        ttl: Duration,
    ) -> Result<Option<LockHandle>> {
        self.ensure_available()?;
        self.requests.fetch_add(1, Ordering::Relaxed);
        let mut leases = self.leases.lock();
        Ok(Self::grant(&mut leases, key, holder, ttl, Instant::now()))
    }

    fn acquire_wait(
        &self,
        key: &str,
        holder: HolderToken,
        wait: Duration,
        lease: Duration,
    ) -> Result<Option<LockHandle>> {
        self.ensure_available()?;
        self.requests.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + wait;
        let mut leases = self.leases.lock();
        loop {
            let now = Instant::now();
            if let Some(handle) = Self::grant(&mut leases, key, holder, lease, now) {
                return Ok(Some(handle));
            }
            if now >= deadline {
                return Ok(None);
            }
            // Wake on the next release, or when the current lease runs out
            let wake_at = leases
                .get(key)
                .map(|current| current.expires_at.min(deadline))
                .unwrap_or(deadline);
            self.released.wait_until(&mut leases, wake_at);
            self.ensure_available()?;
        }
    }

    fn release(&self, handle: &LockHandle) -> Result<bool> {
        self.ensure_available()?;
        let mut leases = self.leases.lock();
        let released = match leases.get(&handle.key).copied() {
            Some(current) if current.holder == handle.holder => {
                let live = current.is_live(Instant::now());
                leases.remove(&handle.key);
                live
            }
            _ => false,
        };
        drop(leases);
        self.released.notify_all();

        if !released {
            tracing::warn!(
                key = %handle.key,
                holder = %handle.holder,
                "lease expired or taken over before release"
            );
        }
        Ok(released)
    }

    fn holder(&self, key: &str) -> Result<Option<HolderToken>> {
        self.ensure_available()?;
        let now = Instant::now();
        Ok(self
            .leases
            .lock()
            .get(key)
            .filter(|lease| lease.is_live(now))
            .map(|lease| lease.holder))
    }
}
