//! Pipeline module - ingestion, cleaning, encoding and export stages

pub mod dataset;
pub mod encode;
pub mod export;
pub mod impute;
pub mod loader;
pub mod missing;
pub mod regression;
pub mod schema;

pub use dataset::*;
pub use encode::*;
pub use export::*;
pub use impute::*;
pub use loader::*;
pub use missing::*;
pub use regression::*;
pub use schema::*;
