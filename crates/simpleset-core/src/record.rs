//! The contract a target entity must satisfy to carry sets.
//!
//! A set never owns storage. It reads and writes one integer column on the
//! record by name, exactly as configured by the declaration's `column`.

use crate::error::{Error, Result};
use crate::value::Value;

/// A record exposing gettable/settable fields by column name.
///
/// Implementations must return [`Error::MissingField`] for columns they do
/// not have, so that a misconfigured `column` surfaces as an error instead of
/// silently reading `NULL`.
pub trait Record {
    /// Current value of `column`.
    fn field(&self, column: &str) -> Result<Value>;

    /// Replace the value of `column`.
    fn set_field(&mut self, column: &str, value: Value) -> Result<()>;
}

impl<R: Record + ?Sized> Record for &mut R {
    fn field(&self, column: &str) -> Result<Value> {
        (**self).field(column)
    }

    fn set_field(&mut self, column: &str, value: Value) -> Result<()> {
        (**self).set_field(column, value)
    }
}

impl<R: Record + ?Sized> Record for Box<R> {
    fn field(&self, column: &str) -> Result<Value> {
        (**self).field(column)
    }

    fn set_field(&mut self, column: &str, value: Value) -> Result<()> {
        (**self).set_field(column, value)
    }
}

/// Read a set storage column: `None` for null, the integer otherwise.
pub(crate) fn read_code<R: Record + ?Sized>(record: &R, column: &str) -> Result<Option<i64>> {
    let value = record.field(column)?;
    if value.is_null() {
        return Ok(None);
    }
    value.as_i64().map(Some).ok_or_else(|| Error::FieldType {
        column: column.to_string(),
        found: value.type_name(),
    })
}

/// Write a set storage column; `None` stores null.
pub(crate) fn write_code<R: Record + ?Sized>(
    record: &mut R,
    column: &str,
    code: Option<i64>,
) -> Result<()> {
    tracing::trace!(column = column, code = ?code, "Writing set storage field");
    record.set_field(column, Value::from(code))
}
