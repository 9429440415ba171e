pub mod address;
pub mod coord;
pub mod range;

pub use address::*;
pub use coord::{column_to_letters, letters_to_column};
pub use range::*;
