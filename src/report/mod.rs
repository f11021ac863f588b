//! Report module - importance ranking, summary tables and the JSON run report

pub mod importance;
pub mod inspect;
pub mod run_report;
pub mod summary;

pub use importance::*;
pub use inspect::*;
pub use run_report::*;
pub use summary::*;
