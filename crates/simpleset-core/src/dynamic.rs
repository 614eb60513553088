//! Records whose columns are defined at runtime.
//!
//! Provides `DynamicRecord`, a [`Record`] implementation for entities whose
//! shape is not known at compile time. It is also the simplest way to give a
//! set a storage column in tests.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::record::Record;
use crate::value::Value;

/// A column definition for dynamic records.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Value the column takes when the record is created.
    pub default: Option<Value>,
}

impl ColumnDef {
    /// Create a new column definition with no default (starts as `NULL`).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// Set the value the column starts with.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A dynamically-defined record.
///
/// Column definitions are kept in insertion order; values live in a map.
/// Reading a declared column that was never written yields its default, or
/// `NULL`.
///
/// # Example
///
/// ```
/// use simpleset_core::dynamic::{ColumnDef, DynamicRecord};
/// use simpleset_core::{Record, Value};
///
/// let mut record = DynamicRecord::new("dummies");
/// record.add_column(ColumnDef::new("values_cd"));
/// record.add_column(ColumnDef::new("values_with_default_cd").with_default(2_i64));
///
/// assert_eq!(record.field("values_cd").unwrap(), Value::Null);
/// assert_eq!(record.field("values_with_default_cd").unwrap(), Value::BigInt(2));
/// ```
#[derive(Debug, Clone)]
pub struct DynamicRecord {
    /// Entity name, used in diagnostics.
    entity: String,
    /// Column definitions in insertion order.
    columns: Vec<ColumnDef>,
    /// Current values by column name.
    values: HashMap<String, Value>,
}

impl DynamicRecord {
    /// Create an empty record for the given entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            columns: Vec::new(),
            values: HashMap::new(),
        }
    }

    /// Create a record with the given columns, applying their defaults.
    pub fn with_columns(entity: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        let mut record = Self::new(entity);
        for column in columns {
            record.add_column(column);
        }
        record
    }

    /// Add a column definition. Its default, if any, becomes the current value.
    pub fn add_column(&mut self, column: ColumnDef) {
        if let Some(default) = &column.default {
            self.values.insert(column.name.clone(), default.clone());
        }
        self.columns.push(column);
    }

    /// Get the entity name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Get column definitions.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Check whether a column is declared.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.name == column)
    }

    /// Get the current value of a column, if one was ever stored.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    fn missing(&self, column: &str) -> Error {
        tracing::debug!(
            entity = %self.entity,
            column = column,
            "Access to undeclared column"
        );
        Error::MissingField {
            column: column.to_string(),
        }
    }
}

impl Record for DynamicRecord {
    fn field(&self, column: &str) -> Result<Value> {
        if !self.has_column(column) {
            return Err(self.missing(column));
        }
        Ok(self.values.get(column).cloned().unwrap_or(Value::Null))
    }

    fn set_field(&mut self, column: &str, value: Value) -> Result<()> {
        if !self.has_column(column) {
            return Err(self.missing(column));
        }
        self.values.insert(column.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_record_basic() {
        let mut record = DynamicRecord::new("dummies");
        record.add_column(ColumnDef::new("values_cd"));
        record.add_column(ColumnDef::new("custom_name"));

        record.set_field("custom_name", Value::BigInt(6)).unwrap();

        assert_eq!(record.entity(), "dummies");
        assert_eq!(record.field("values_cd").unwrap(), Value::Null);
        assert_eq!(record.field("custom_name").unwrap(), Value::BigInt(6));
        assert!(record.get("values_cd").is_none());
    }

    #[test]
    fn test_defaults_applied_on_add() {
        let record = DynamicRecord::with_columns(
            "dummies",
            vec![ColumnDef::new("values_with_default_cd").with_default(2_i64)],
        );
        assert_eq!(
            record.field("values_with_default_cd").unwrap(),
            Value::BigInt(2)
        );
    }

    #[test]
    fn test_undeclared_column_is_an_error() {
        let mut record = DynamicRecord::new("dummies");
        assert_eq!(
            record.field("roles_cd").unwrap_err(),
            Error::MissingField {
                column: "roles_cd".into()
            }
        );
        assert!(record.set_field("roles_cd", Value::BigInt(1)).is_err());
    }

    #[test]
    fn test_column_order_preserved() {
        let record = DynamicRecord::with_columns(
            "dummies",
            vec![ColumnDef::new("b"), ColumnDef::new("a")],
        );
        let names: Vec<&str> = record.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
