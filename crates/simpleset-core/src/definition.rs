//! A declared set and the operations it provides.
//!
//! `SetDefinition` binds a frozen [`SetHash`] to a storage column. Its
//! operations come in two layers:
//!
//! - pure functions over the raw storage value (`Option<i64>`), used by the
//!   code `#[derive(SimpleSet)]` generates;
//! - the same operations bound to a [`Record`], used by
//!   [`SetRegistry`](crate::SetRegistry).
//!
//! Both layers share one implementation, so a set behaves the same whether it
//! was declared at compile time or at runtime.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::key::SetKey;
use crate::options::SetOptions;
use crate::record::{Record, read_code, write_code};
use crate::table::SetHash;
use crate::validate::is_identifier;

/// Where an operation is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Called on a record.
    Instance,
    /// Called on the target type itself.
    Class,
}

/// What an operation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "position", rename_all = "snake_case")]
pub enum OperationKind {
    /// Read the set as a list of names.
    Read,
    /// Write the set from a list of names.
    Write,
    /// Test one value.
    Query(usize),
    /// Switch one value on or off.
    Toggle(usize),
    /// Type-level accessor for one value (its name and bits).
    Accessor(usize),
    /// Type-level list of every declared name.
    Values,
}

/// One generated operation: its name, scope and behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    /// Name the operation is bound under, e.g. `speaks_english?`.
    pub name: String,
    /// Instance- or type-level.
    pub scope: Scope,
    /// Behaviour.
    pub kind: OperationKind,
}

/// An immutable set declaration.
#[derive(Debug, Clone, Serialize)]
pub struct SetDefinition {
    /// Set name, e.g. `roles`.
    name: String,
    /// Storage column, e.g. `roles_cd`.
    column: String,
    /// Bit-name table.
    table: Arc<SetHash>,
    /// Options as resolved at declaration time.
    options: SetOptions,
    /// Resolved per-value prefix, separator included.
    #[serde(skip)]
    prefix: String,
}

impl SetDefinition {
    /// Declare a set from a table and options.
    ///
    /// Fails with [`Error::InvalidInput`] if the set name, the column or a
    /// custom prefix is not an identifier.
    pub fn new(name: impl Into<String>, table: SetHash, options: SetOptions) -> Result<Self> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(Error::invalid_input(format!(
                "set name `{}` is not a valid identifier",
                name
            )));
        }
        options.validate()?;

        let column = options.column_for(&name);
        let prefix = options.prefix_for(&name);
        Ok(Self {
            name,
            column,
            table: Arc::new(table),
            options,
            prefix,
        })
    }

    /// Declaration emitted by `#[derive(SimpleSet)]`, already validated at
    /// compile time.
    #[doc(hidden)]
    pub fn from_static(
        name: &str,
        entries: &[(&str, i64)],
        options: SetOptions,
    ) -> Self {
        let column = options.column_for(name);
        let prefix = options.prefix_for(name);
        Self {
            name: name.to_string(),
            column,
            table: Arc::new(SetHash::from_static(entries)),
            options,
            prefix,
        }
    }

    /// Set name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage column.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The bit-name table.
    #[must_use]
    pub fn table(&self) -> &SetHash {
        &self.table
    }

    /// Resolved options.
    #[must_use]
    pub fn options(&self) -> &SetOptions {
        &self.options
    }

    /// Every declared name, in declaration order.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        self.table.names().collect()
    }

    /// Type-level accessor, name half: the declared name itself.
    #[must_use]
    pub fn value_name(&self, name: &str) -> Option<&str> {
        self.table.position(name).and_then(|i| self.table.get(i)).map(|(n, _)| n)
    }

    /// Type-level accessor, bits half: the bit value of `name`.
    #[must_use]
    pub fn value_code(&self, name: &str) -> Option<i64> {
        self.table.code(name)
    }

    // Pure operations on the storage value.

    /// Names covered by a storage value; `None` stays `None`.
    #[must_use]
    pub fn decode(&self, current: Option<i64>) -> Option<Vec<&str>> {
        current.map(|bits| self.table.covered(bits))
    }

    /// Combine names into a storage value, honouring `whiny`.
    pub fn encode<I>(&self, keys: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: SetKey,
    {
        self.table.encode(&self.name, keys, self.options.is_whiny())
    }

    /// True if every bit of `code` is set in `current` (null counts as `0`).
    #[must_use]
    pub const fn is_set(code: i64, current: Option<i64>) -> bool {
        let bits = match current {
            Some(bits) => bits,
            None => 0,
        };
        code & bits == code
    }

    /// `current` with `code` switched on or off (null counts as `0`).
    #[must_use]
    pub const fn toggled(code: i64, current: Option<i64>, on: bool) -> i64 {
        let bits = match current {
            Some(bits) => bits,
            None => 0,
        };
        if on { bits | code } else { bits & !code }
    }

    fn code_of(&self, name: &str) -> Result<i64> {
        self.table.code(name).ok_or_else(|| Error::InvalidValue {
            set: self.name.clone(),
            value: name.to_string(),
        })
    }

    // Operations bound to a record.

    /// Read the set: `None` when the storage field is null, else the covered
    /// names in declaration order.
    pub fn read<R: Record + ?Sized>(&self, record: &R) -> Result<Option<Vec<&str>>> {
        let current = read_code(record, &self.column)?;
        Ok(self.decode(current))
    }

    /// Write the set. `None` stores null; `Some(keys)` stores the OR of their
    /// bits.
    ///
    /// Encoding happens before the storage field is touched, so a rejected
    /// value leaves the record unchanged.
    pub fn write<R, I>(&self, record: &mut R, values: Option<I>) -> Result<()>
    where
        R: Record + ?Sized,
        I: IntoIterator,
        I::Item: SetKey,
    {
        let code = values.map(|keys| self.encode(keys)).transpose()?;
        write_code(record, &self.column, code)
    }

    /// Write the set from `keys`.
    pub fn assign<R, I>(&self, record: &mut R, keys: I) -> Result<()>
    where
        R: Record + ?Sized,
        I: IntoIterator,
        I::Item: SetKey,
    {
        self.write(record, Some(keys))
    }

    /// Reset the storage field to null.
    pub fn clear<R: Record + ?Sized>(&self, record: &mut R) -> Result<()> {
        write_code(record, &self.column, None)
    }

    /// Test one value by name.
    pub fn query<R: Record + ?Sized>(&self, record: &R, name: &str) -> Result<bool> {
        let code = self.code_of(name)?;
        Ok(Self::is_set(code, read_code(record, &self.column)?))
    }

    /// Switch one value on or off and return whether it is set afterwards.
    ///
    /// Always leaves an integer in the storage field, even when switching a
    /// value off on a null field.
    pub fn toggle<R: Record + ?Sized>(&self, record: &mut R, name: &str, on: bool) -> Result<bool> {
        let code = self.code_of(name)?;
        self.toggle_code(record, code, on)
    }

    pub(crate) fn query_at<R: Record + ?Sized>(&self, record: &R, position: usize) -> Result<bool> {
        let code = self.code_at(position);
        Ok(Self::is_set(code, read_code(record, &self.column)?))
    }

    pub(crate) fn toggle_at<R: Record + ?Sized>(
        &self,
        record: &mut R,
        position: usize,
        on: bool,
    ) -> Result<bool> {
        let code = self.code_at(position);
        self.toggle_code(record, code, on)
    }

    fn toggle_code<R: Record + ?Sized>(&self, record: &mut R, code: i64, on: bool) -> Result<bool> {
        let next = Self::toggled(code, read_code(&*record, &self.column)?, on);
        write_code(record, &self.column, Some(next))?;
        Ok(Self::is_set(code, Some(next)))
    }

    fn code_at(&self, position: usize) -> i64 {
        self.table.get(position).map_or(0, |(_, code)| code)
    }

    // Operation naming.

    /// Resolved per-value prefix, e.g. `speaks_`.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Every operation this declaration binds, honouring `slim`.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        let op = |name: String, scope, kind| Operation { name, scope, kind };
        let mut ops = vec![
            op(format!("get_{}", self.name), Scope::Instance, OperationKind::Read),
            op(format!("set_{}", self.name), Scope::Instance, OperationKind::Write),
            op(self.name.clone(), Scope::Instance, OperationKind::Read),
            op(format!("{}=", self.name), Scope::Instance, OperationKind::Write),
            op(self.name.clone(), Scope::Class, OperationKind::Values),
        ];

        let slim = self.options.slim_level();
        for (position, value) in self.table.names().enumerate() {
            let base = format!("{}{}", self.prefix, value);
            if slim.instance_methods() {
                ops.push(op(
                    format!("{}?", base),
                    Scope::Instance,
                    OperationKind::Query(position),
                ));
                ops.push(op(
                    format!("{}=", base),
                    Scope::Instance,
                    OperationKind::Toggle(position),
                ));
            }
            if slim.class_methods() {
                ops.push(op(base, Scope::Class, OperationKind::Accessor(position)));
            }
        }
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::{ColumnDef, DynamicRecord};
    use crate::options::Slim;
    use crate::value::Value;

    fn record(column: &str) -> DynamicRecord {
        DynamicRecord::with_columns("dummies", vec![ColumnDef::new(column)])
    }

    fn ab() -> SetDefinition {
        SetDefinition::new(
            "values",
            SetHash::from_names(["a", "b"]).unwrap(),
            SetOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn default_column_has_cd_suffix() {
        assert_eq!(ab().column(), "values_cd");
    }

    #[test]
    fn invalid_set_name_rejected() {
        let err = SetDefinition::new(
            "bad name",
            SetHash::from_names(["a"]).unwrap(),
            SetOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn decode_keeps_null_apart_from_empty() {
        let set = ab();
        assert_eq!(set.decode(None), None);
        assert_eq!(set.decode(Some(0)), Some(vec![]));
        assert_eq!(set.decode(Some(3)), Some(vec!["a", "b"]));
    }

    #[test]
    fn toggle_arithmetic() {
        assert_eq!(SetDefinition::toggled(4, None, true), 4);
        assert_eq!(SetDefinition::toggled(4, None, false), 0);
        assert_eq!(SetDefinition::toggled(2, Some(15), false), 13);
        assert!(SetDefinition::is_set(0, None));
        assert!(!SetDefinition::is_set(1, None));
    }

    #[test]
    fn write_then_read() {
        let set = ab();
        let mut r = record("values_cd");
        set.assign(&mut r, ["b"]).unwrap();
        assert_eq!(r.field("values_cd").unwrap(), Value::BigInt(2));
        assert_eq!(set.read(&r).unwrap(), Some(vec!["b"]));

        set.write(&mut r, None::<Vec<&str>>).unwrap();
        assert_eq!(set.read(&r).unwrap(), None);
    }

    #[test]
    fn rejected_write_leaves_field_untouched() {
        let set = ab();
        let mut r = record("values_cd");
        set.assign(&mut r, ["a"]).unwrap();
        assert!(set.assign(&mut r, ["b", "c"]).is_err());
        assert_eq!(r.field("values_cd").unwrap(), Value::BigInt(1));
    }

    #[test]
    fn toggle_reports_state() {
        let set = ab();
        let mut r = record("values_cd");
        assert!(set.toggle(&mut r, "a", true).unwrap());
        assert!(!set.toggle(&mut r, "a", false).unwrap());
        assert_eq!(r.field("values_cd").unwrap(), Value::BigInt(0));
        assert!(set.query(&r, "z").is_err());
    }

    #[test]
    fn operations_follow_prefix_and_slim() {
        let set = SetDefinition::new(
            "spoken_languages",
            SetHash::from_names(["english", "french"]).unwrap(),
            SetOptions::new().prefix_with("speaks").slim(Slim::Class),
        )
        .unwrap();
        let names: Vec<(String, Scope)> = set
            .operations()
            .into_iter()
            .map(|op| (op.name, op.scope))
            .collect();
        assert!(names.contains(&("speaks_english?".to_string(), Scope::Instance)));
        assert!(names.contains(&("speaks_french=".to_string(), Scope::Instance)));
        assert!(!names.contains(&("speaks_english".to_string(), Scope::Class)));
        assert!(names.contains(&("spoken_languages".to_string(), Scope::Class)));
    }

    #[test]
    fn aggregate_operations_have_both_names() {
        let ops = ab().operations();
        let kind_of = |name: &str| {
            ops.iter()
                .find(|op| op.name == name && op.scope == Scope::Instance)
                .map(|op| op.kind)
        };
        assert_eq!(kind_of("get_values"), Some(OperationKind::Read));
        assert_eq!(kind_of("values"), Some(OperationKind::Read));
        assert_eq!(kind_of("set_values"), Some(OperationKind::Write));
        assert_eq!(kind_of("values="), Some(OperationKind::Write));
    }

    #[test]
    fn type_level_accessor_halves() {
        let set = ab();
        assert_eq!(set.value_name("b"), Some("b"));
        assert_eq!(set.value_code("b"), Some(2));
        assert_eq!(set.value_code("c"), None);
        assert_eq!(set.values(), vec!["a", "b"]);
    }
}
