//! Record store wrapper that stalls the first unit of work

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use stockade_core::{ProductId, RecordStore, Result, StockRecord, StoreTransaction};
use stockade_storage::ShardedRecordStore;

/// Delays the first transaction after `begin` and again before its write
pub(crate) struct StallingStore {
    inner: ShardedRecordStore,
    stalled: AtomicBool,
    begin_delay: Duration,
    write_delay: Duration,
}

impl StallingStore {
    pub(crate) fn new(begin_delay: Duration, write_delay: Duration) -> Self {
        Self {
            inner: ShardedRecordStore::new(),
            stalled: AtomicBool::new(false),
            begin_delay,
            write_delay,
        }
    }

    fn wrap<'a>(
        &self,
        stall: bool,
        inner: Box<dyn StoreTransaction + 'a>,
    ) -> Box<dyn StoreTransaction + 'a> {
        Box::new(StallingTransaction {
            inner,
            write_delay: stall.then_some(self.write_delay),
        })
    }

    /// True for the first caller only
    fn claim_stall(&self) -> bool {
        let stall = !self.stalled.swap(true, Ordering::AcqRel);
        if stall {
            thread::sleep(self.begin_delay);
        }
        stall
    }
}

struct StallingTransaction<'a> {
    inner: Box<dyn StoreTransaction + 'a>,
    write_delay: Option<Duration>,
}

impl StoreTransaction for StallingTransaction<'_> {
    fn read(&mut self, id: ProductId) -> Result<StockRecord> {
        self.inner.read(id)
    }

    fn read_for_update(&mut self, id: ProductId) -> Result<StockRecord> {
        self.inner.read_for_update(id)
    }

    fn write(&mut self, id: ProductId, quantity: u64) -> Result<()> {
        if let Some(delay) = self.write_delay {
            thread::sleep(delay);
        }
        self.inner.write(id, quantity)
    }

    fn commit(self: Box<Self>) -> Result<Vec<StockRecord>> {
        self.inner.commit()
    }

    fn rollback(self: Box<Self>) {
        self.inner.rollback()
    }
}

impl RecordStore for StallingStore {
    fn read(&self, id: ProductId) -> Result<StockRecord> {
        self.inner.read(id)
    }

    fn write(&self, id: ProductId, quantity: u64) -> Result<StockRecord> {
        self.inner.write(id, quantity)
    }

    fn write_if_version(
        &self,
        id: ProductId,
        quantity: u64,
        expected_version: u64,
    ) -> Result<StockRecord> {
        self.inner.write_if_version(id, quantity, expected_version)
    }

    fn insert(&self, id: ProductId, quantity: u64) -> Result<StockRecord> {
        self.inner.insert(id, quantity)
    }

    fn remove(&self, id: ProductId) -> Result<Option<StockRecord>> {
        self.inner.remove(id)
    }

    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>> {
        let stall = self.claim_stall();
        Ok(self.wrap(stall, self.inner.begin()?))
    }

    fn begin_until(&self, deadline: Instant) -> Result<Box<dyn StoreTransaction + '_>> {
        let stall = self.claim_stall();
        Ok(self.wrap(stall, self.inner.begin_until(deadline)?))
    }
}
