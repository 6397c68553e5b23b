use gprn_data::DataError;
use gprn_gp::GpError;
use thiserror::Error;

/// A result type for GPRN inference
pub type Result<T> = std::result::Result<T, InferenceError>;

/// An error when configuring or evaluating a GPRN model
#[derive(Error, Debug)]
pub enum InferenceError {
    /// When data loading fails
    #[error(transparent)]
    DataError(#[from] DataError),
    /// When the network computation fails
    #[error(transparent)]
    GpError(#[from] GpError),
    /// When a configuration file cannot be read
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// When a configuration cannot be (de)serialized
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    /// When the configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfigError(String),
    /// When a value is out of its valid range
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
}
