//! Grid store contract and the stores rowport ships with.
//!
//! A grid store is the remote spreadsheet service rowport reads from and
//! writes to. The library only relies on [`GridStore`]; transport, auth and
//! caching belong to implementations.

pub mod backends;
pub mod error;
pub mod retry;
pub mod traits;

#[cfg(feature = "csv")]
pub use backends::{CsvStore, CsvStoreOptions};
pub use backends::MemoryStore;
pub use error::StoreError;
pub use retry::{RetryConfig, RetryStore};
pub use traits::{GridStore, RawGrid, UpdateInstruction, WorksheetRef};

// Re-export for convenience
pub use rowport_common::{AddressError, CellSpan, RangeExpr};
