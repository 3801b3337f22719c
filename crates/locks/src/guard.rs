//! Scoped lock release
//!
//! A [`LockGuard`] owns a [`LockHandle`] and gives it back to the service
//! that issued it exactly once: either through [`LockGuard::release`] or,
//! on any other exit path (early return, `?`, panic unwinding), in `Drop`.
//! Failures during the implicit release are logged, never raised, so they
//! cannot mask the outcome of the critical section.

use stockade_core::{DistributedLockService, LockHandle, NamedLockService, Result};

#[derive(Clone, Copy)]
enum Issuer<'a> {
    Distributed(&'a dyn DistributedLockService),
    Named(&'a dyn NamedLockService),
}

impl Issuer<'_> {
    fn release(&self, handle: &LockHandle) -> Result<bool> {
        match self {
            Issuer::Distributed(service) => service.release(handle),
            Issuer::Named(service) => service.release(handle),
        }
    }
}

/// Held lock that releases itself when dropped
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    handle: Option<LockHandle>,
    issuer: Issuer<'a>,
}

impl<'a> LockGuard<'a> {
    /// Guard a grant from a distributed lock service
    pub fn distributed(service: &'a dyn DistributedLockService, handle: LockHandle) -> Self {
        tracing::debug!(key = %handle.key, holder = %handle.holder, "distributed lock held");
        Self {
            handle: Some(handle),
            issuer: Issuer::Distributed(service),
        }
    }

    /// Guard a grant from a named lock service
    pub fn named(service: &'a dyn NamedLockService, handle: LockHandle) -> Self {
        tracing::debug!(key = %handle.key, holder = %handle.holder, "named lock held");
        Self {
            handle: Some(handle),
            issuer: Issuer::Named(service),
        }
    }

    /// The guarded grant
    pub fn handle(&self) -> Option<&LockHandle> {
        self.handle.as_ref()
    }

    /// Release now and report the service's answer
    pub fn release(mut self) -> Result<bool> {
        match self.handle.take() {
            Some(handle) => {
                let released = self.issuer.release(&handle)?;
                tracing::debug!(key = %handle.key, released, "lock released");
                Ok(released)
            }
            None => Ok(false),
        }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        match self.issuer.release(&handle) {
            Ok(true) => tracing::debug!(key = %handle.key, "lock released"),
            Ok(false) => tracing::warn!(
                key = %handle.key,
                holder = %handle.holder,
                "lock was no longer held at release"
            ),
            Err(e) => tracing::warn!(
                key = %handle.key,
                holder = %handle.holder,
                error = %e,
                "failed to release lock"
            ),
        }
    }
}
