pub mod config;
pub mod error;
pub mod types;

pub use error::{ErrorKind, SharkeyError, SharkeyResult};
pub use types::{ThresholdScheme, MAX_SHARES, MIN_SHARES};
