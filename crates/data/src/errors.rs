use thiserror::Error;

/// A result type for data loading and access
pub type Result<T> = std::result::Result<T, DataError>;

/// An error when loading or accessing observed time series
#[derive(Error, Debug)]
pub enum DataError {
    /// When the data file cannot be read
    #[error("Load IO error")]
    LoadIoError(#[from] std::io::Error),
    /// When a value of the data file is not a number
    #[error("Parse error at line {line}: {msg}")]
    ParseError {
        /// Line number (1-based) in the data file
        line: usize,
        /// Parser message
        msg: String,
    },
    /// When a row has fewer columns than the expected series
    #[error("Missing columns at line {line}: expected at least {expected}, found {found}")]
    MissingColumns {
        /// Line number (1-based) in the data file
        line: usize,
        /// Expected minimum number of columns
        expected: usize,
        /// Number of columns found
        found: usize,
    },
    /// When no observation is available
    #[error("Empty data: {0}")]
    EmptyData(String),
    /// When series are inconsistent (lengths, ordering, non finite values)
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
    /// When the process-wide data instance is used before being loaded
    #[error("Data instance not loaded")]
    NotLoaded,
    /// When the process-wide data instance is loaded twice
    #[error("Data instance already loaded")]
    AlreadyLoaded,
}
