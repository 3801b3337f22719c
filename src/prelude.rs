//! Convenient imports for Stockade.
//!
//! ```ignore
//! use stockade::prelude::*;
//!
//! let stockade = Stockade::open()?;
//! ```

// Main entry point
pub use crate::stockade::{Stockade, StockadeBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Core types
pub use stockade_core::{LockStrategy, ProductId, StockRecord, StockadeConfig};

// Decrement capability
pub use stockade_engine::{DecreaseStock, StockFacade};
