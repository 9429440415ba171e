#[cfg(feature = "csv")]
pub mod csv;
pub mod memory;

#[cfg(feature = "csv")]
pub use csv::{CsvStore, CsvStoreOptions};
pub use memory::MemoryStore;
