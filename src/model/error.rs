//! Error types for the model layer

use thiserror::Error;

/// Errors raised while fitting or applying a classifier
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("model has not been fitted")]
    NotFitted,

    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("labels must be 0 or 1, found {0}")]
    InvalidLabel(f64),

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Verify that `y` is a non-empty 0/1 vector with one entry per row of `x`
pub(crate) fn check_xy(n_rows: usize, y: &ndarray::Array1<f64>) -> Result<()> {
    if n_rows == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }
    if y.len() != n_rows {
        return Err(ModelError::ShapeMismatch {
            expected: format!("{} labels", n_rows),
            actual: format!("{} labels", y.len()),
        });
    }
    if let Some(&bad) = y.iter().find(|&&v| v != 0.0 && v != 1.0) {
        return Err(ModelError::InvalidLabel(bad));
    }
    Ok(())
}
