//! Row lock held for the length of a store transaction

use super::DecreaseStock;
use crate::service::{committed_record, StockService};
use stockade_core::{ProductId, Result, StockRecord};

/// Serializes decrements with `read_for_update`
///
/// Concurrent callers queue on the product's row lock, bounded by the
/// store's row-lock wait timeout. Any failure rolls the transaction back,
/// which releases the row.
#[derive(Debug, Clone)]
pub struct PessimisticLockFacade {
    stock: StockService,
}

impl PessimisticLockFacade {
    /// Create the facade
    pub fn new(stock: StockService) -> Self {
        Self { stock }
    }
}

impl DecreaseStock for PessimisticLockFacade {
    fn decrease(&self, id: ProductId, amount: u64) -> Result<StockRecord> {
        let mut txn = self.stock.store().begin()?;
        if let Err(e) = self.stock.decrease_in(txn.as_mut(), id, amount) {
            tracing::debug!(product_id = %id, error = %e, "pessimistic decrease rolled back");
            txn.rollback();
            return Err(e);
        }
        let record = committed_record(txn.commit()?, id)?;
        tracing::debug!(product_id = %id, version = record.version, "pessimistic decrease committed");
        Ok(record)
    }
}
