//! Shinkansen: passenger satisfaction classification
//!
//! Joins travel and survey records, imputes and one-hot encodes them with a
//! policy fitted on the training split, compares tree-ensemble classifiers
//! on a seeded validation split and predicts the test split.

pub mod cli;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod utils;
