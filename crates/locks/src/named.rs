//! In-process named lock service
//!
//! Named locks are string-keyed mutexes that live outside any store
//! transaction. A holder keeps the lock until it calls `release` (or
//! `release_all`, the equivalent of its session ending); nothing expires on
//! its own. Acquisition by the same holder is counted, so each acquire
//! needs a matching release.

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use stockade_core::{Error, HolderToken, LockHandle, NamedLockService, Result};

#[derive(Debug, Clone, Copy)]
struct NamedEntry {
    holder: HolderToken,
    depth: u32,
}

/// In-process session-scoped named lock service
#[derive(Debug)]
pub struct MemoryNamedLockService {
    locks: Mutex<FxHashMap<String, NamedEntry>>,
    released: Condvar,
    acquire_timeout: Duration,
    available: AtomicBool,
}

impl MemoryNamedLockService {
    /// Create a service whose `acquire` waits at most `acquire_timeout`
    pub fn new(acquire_timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(FxHashMap::default()),
            released: Condvar::new(),
            acquire_timeout,
            available: AtomicBool::new(true),
        }
    }

    /// Configured acquisition wait bound
    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }

    /// Simulate the service going away (`false`) or coming back (`true`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::LockService("named lock service unavailable".to_string()))
        }
    }
}

impl NamedLockService for MemoryNamedLockService {
    fn acquire(&self, key: &str, holder: HolderToken) -> Result<LockHandle> {
        self.ensure_available()?;
        let started = Instant::now();
        let deadline = started + self.acquire_timeout;
        let mut locks = self.locks.lock();
        loop {
            match locks.get(key).map(|entry| entry.holder) {
                None => {
                    locks.insert(key.to_string(), NamedEntry { holder, depth: 1 });
                    return Ok(LockHandle::new(key, holder, None));
                }
                Some(owner) if owner == holder => {
                    if let Some(entry) = locks.get_mut(key) {
                        entry.depth += 1;
                    }
                    return Ok(LockHandle::new(key, holder, None));
                }
                Some(_) => {
                    if self.released.wait_until(&mut locks, deadline).timed_out()
                        && locks.contains_key(key)
                    {
                        tracing::debug!(key, %holder, "named lock wait timed out");
                        return Err(Error::LockAcquisitionTimeout {
                            key: key.to_string(),
                            waited: started.elapsed(),
                        });
                    }
                    self.ensure_available()?;
                }
            }
        }
    }

    fn release(&self, handle: &LockHandle) -> Result<bool> {
        self.ensure_available()?;
        let mut locks = self.locks.lock();
        let released = match locks.get(&handle.key).copied() {
            Some(entry) if entry.holder == handle.holder => {
                if entry.depth > 1 {
                    locks.insert(
                        handle.key.clone(),
                        NamedEntry {
                            depth: entry.depth - 1,
                            ..entry
                        },
                    );
                } else {
                    locks.remove(&handle.key);
                }
                true
            }
            _ => false,
        };
        drop(locks);
        if released {
            self.released.notify_all();
        }
        Ok(released)
    }

    fn is_locked(&self, key: &str) -> Result<bool> {
        self.ensure_available()?;
        Ok(self.locks.lock().contains_key(key))
    }

    fn release_all(&self, holder: HolderToken) -> Result<usize> {
        self.ensure_available()?;
        let mut locks = self.locks.lock();
        let before = locks.len();
        locks.retain(|_, entry| entry.holder != holder);
        let freed = before - locks.len();
        drop(locks);
        if freed > 0 {
            self.released.notify_all();
        }
        Ok(freed)
    }
}
