//! Terminal reports for estimates, market snapshots and analyses.

pub mod format;

pub use format::*;
