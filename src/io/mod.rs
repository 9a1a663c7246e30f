//! Input/output helpers.
//!
//! - training sample CSV read/write (`training_csv`)
//! - saved model directories (`model_store`)

pub mod model_store;
pub mod training_csv;

pub use model_store::*;
pub use training_csv::*;
