//! Error types for set declarations and set accessors.

use std::error::Error as StdError;
use std::fmt;

/// Result alias used throughout `simpleset-core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while declaring a set or operating on its storage field.
///
/// Declaration errors (`InvalidInput`, `UnknownOption`) abort the declaration
/// before anything is registered. `InvalidValue` aborts a write before the
/// storage field is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed declaration input: bad bit-name table source, bad option
    /// value, invalid identifier or a name clash.
    InvalidInput(String),
    /// An option key outside `column`, `prefix`, `slim`, `whiny`.
    UnknownOption(String),
    /// A write named a value the set does not define (whiny sets only).
    InvalidValue {
        /// Set being written.
        set: String,
        /// The offending element, as normalized.
        value: String,
    },
    /// The record has no field with this name.
    MissingField {
        /// Requested storage column.
        column: String,
    },
    /// No operation is bound under this name.
    UnknownOperation(String),
    /// The storage field holds something other than an integer or null.
    FieldType {
        /// Storage column.
        column: String,
        /// Type name of the value found.
        found: &'static str,
    },
}

impl Error {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "invalid set declaration: {}", msg),
            Error::UnknownOption(key) => write!(
                f,
                "unknown set option `{}` (expected one of: column, prefix, slim, whiny)",
                key
            ),
            Error::InvalidValue { set, value } => {
                write!(f, "invalid set value for `{}`: {}", set, value)
            }
            Error::UnknownOperation(name) => write!(f, "no set operation named `{}`", name),
            Error::MissingField { column } => write!(f, "record has no field `{}`", column),
            Error::FieldType { column, found } => write!(
                f,
                "field `{}` must hold an integer or null, found {}",
                column, found
            ),
        }
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_offending_value() {
        let err = Error::InvalidValue {
            set: "values".to_string(),
            value: "c".to_string(),
        };
        assert_eq!(err.to_string(), "invalid set value for `values`: c");
    }
}
