//! Store doubles and grid fixtures shared by rowport's tests.

mod fixtures;
mod flaky;
mod recording;

pub use fixtures::{employees, grid, products, temp_csv};
pub use flaky::FlakyStore;
pub use recording::{RecordingStore, StoreCall};

/// Build a [`rowport_store::RawGrid`] from string-literal rows.
///
/// ```
/// let g = rowport_testkit::grid![["name", "age"], ["Alice", "30"], []];
/// assert_eq!(g.len(), 3);
/// assert!(g[2].is_empty());
/// ```
#[macro_export]
macro_rules! grid {
    ($([$($cell:expr),* $(,)?]),* $(,)?) => {
        vec![$(vec![$(::std::string::String::from($cell)),*]),*]
    };
}
