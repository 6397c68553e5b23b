use thiserror::Error;

/// A result type for GPRN computations
pub type Result<T> = std::result::Result<T, GpError>;

/// An error when building or evaluating a [`Gprn`](crate::Gprn)
#[derive(Error, Debug)]
pub enum GpError {
    /// When LikelihoodComputation computation fails
    #[error("LikelihoodComputation computation error: {0}")]
    LikelihoodComputationError(String),
    #[error(transparent)]
    /// When linear algebra computation fails
    LinalgError(#[from] linfa_linalg::LinalgError),
    /// When a covariance matrix stays not positive definite even with nugget
    #[error("Not positive definite: {0}")]
    NotPositiveDefiniteError(String),
    /// When a value is out of its valid range
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
}
