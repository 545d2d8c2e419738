//! Query Pipeline Error Types

use thiserror::Error;

use crate::session::StoreError;

/// Result-conversion errors: the query ran, but the raw result could not be
/// mapped onto the declared return shape. Kept distinct from [`StoreError`]
/// so callers can tell "shape mismatch" from "query failed".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// Single-object shape received more than one row
    #[error("expected at most one result row, got {0}")]
    TooManyRows(usize),

    /// Scalar shape did not receive exactly one row with one cell
    #[error("expected a single scalar cell, got {rows} row(s) of {columns} column(s)")]
    NotScalar { rows: usize, columns: usize },

    /// Projection target references a column absent from the result
    #[error("projection '{target}' requires field '{field}' missing from result columns")]
    MissingField { target: String, field: String },

    /// Projection target type is not known to the store metadata
    #[error("unknown projection target type '{0}'")]
    UnknownTarget(String),

    /// Row arity does not match the result's column header
    #[error("row has {actual} cells but result declares {expected} columns")]
    RowArity { expected: usize, actual: usize },
}

/// Errors surfaced by the repository-query pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Template references a placeholder with no bound parameter
    #[error("unresolved query parameter '{{{placeholder}}}' in query for method '{method}'")]
    UnresolvedParameter { method: String, placeholder: String },

    /// Argument count does not match the declared parameter list
    #[error("method '{method}' declares {expected} parameter(s) but was called with {actual}")]
    ArityMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },

    /// Two non-special parameters declare the same name
    #[error("duplicate parameter name '{name}' at indices {first} and {second}")]
    DuplicateParameterName {
        name: String,
        first: usize,
        second: usize,
    },

    /// Parameter descriptors are not a dense, ordered index sequence
    #[error("parameter at position {position} declares index {declared}, expected {position}")]
    IndexOutOfOrder { position: usize, declared: usize },

    /// Method name already present in the registry
    #[error("query method '{0}' is already registered")]
    AlreadyRegistered(String),

    /// Store-side execution failure, propagated verbatim
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Result could not be shaped to the declared return type
    #[error("result conversion failed: {0}")]
    Conversion(#[from] ConversionError),
}

/// Result type for pipeline operations
pub type QueryResult<T> = Result<T, QueryError>;
