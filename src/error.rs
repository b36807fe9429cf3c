//! Error types for recomendar operations.
//!
//! Provides rich error context for library consumers.
//!
//! Note that "no prediction available for this cell" is deliberately *not* an
//! error: predictors return `Ok(None)` for cells they cannot score, and the
//! evaluator counts those separately. Only construction-time and
//! parameter-validation failures surface here.

use std::fmt;

/// Main error type for recomendar operations.
///
/// # Examples
///
/// ```
/// use recomendar::error::RecomendarError;
///
/// let err = RecomendarError::UnknownEntity {
///     kind: "item".to_string(),
///     id: 99,
/// };
/// assert!(err.to_string().contains("unknown item"));
/// ```
#[derive(Debug)]
pub enum RecomendarError {
    /// No ratings were supplied where at least one is required.
    EmptyInput {
        /// What was empty
        context: String,
    },

    /// Two ratings collapse to the same (user, item) cell.
    DuplicateEntry {
        /// User id of the conflicting cell
        user: u32,
        /// Item id of the conflicting cell
        item: u32,
    },

    /// A query references a user or item id absent from the matrix.
    UnknownEntity {
        /// Entity kind ("user" or "item")
        kind: String,
        /// The offending id
        id: u32,
    },

    /// Invalid parameter value provided.
    InvalidParameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// An evaluation split cannot satisfy its given-ratings constraint.
    InsufficientData {
        /// What ran short
        context: String,
        /// How much was required
        required: usize,
        /// How much was available
        available: usize,
    },

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for RecomendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecomendarError::EmptyInput { context } => {
                write!(f, "empty input: {context}")
            }
            RecomendarError::DuplicateEntry { user, item } => {
                write!(f, "duplicate rating for user {user}, item {item}")
            }
            RecomendarError::UnknownEntity { kind, id } => {
                write!(f, "unknown {kind}: id {id} is not in the matrix")
            }
            RecomendarError::InvalidParameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "invalid parameter: {param} = {value}, expected {constraint}"
                )
            }
            RecomendarError::InsufficientData {
                context,
                required,
                available,
            } => {
                write!(
                    f,
                    "insufficient data: {context} (required {required}, available {available})"
                )
            }
            RecomendarError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for RecomendarError {}

impl From<&str> for RecomendarError {
    fn from(msg: &str) -> Self {
        RecomendarError::Other(msg.to_string())
    }
}

impl From<String> for RecomendarError {
    fn from(msg: String) -> Self {
        RecomendarError::Other(msg)
    }
}

impl RecomendarError {
    /// Create an unknown-user error.
    #[must_use]
    pub fn unknown_user(id: u32) -> Self {
        Self::UnknownEntity {
            kind: "user".to_string(),
            id,
        }
    }

    /// Create an unknown-item error.
    #[must_use]
    pub fn unknown_item(id: u32) -> Self {
        Self::UnknownEntity {
            kind: "item".to_string(),
            id,
        }
    }

    /// Create an invalid-parameter error with descriptive context.
    #[must_use]
    pub fn invalid_parameter(param: &str, value: impl fmt::Display, constraint: &str) -> Self {
        Self::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }

    /// Create an empty-input error.
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::EmptyInput {
            context: context.to_string(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, RecomendarError>;
