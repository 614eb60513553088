//! Per-type registry of declared sets.
//!
//! `SetRegistry<T>` is the runtime form of `declare_set`: each declaration
//! binds its operations under their generated names, and callers look them
//! up and invoke them directly. There is no reflection involved; a name maps
//! to a typed handle.
//!
//! # Example
//!
//! ```
//! use simpleset_core::dynamic::{ColumnDef, DynamicRecord};
//! use simpleset_core::{SetHash, SetOptions, SetRegistry};
//!
//! let mut users = SetRegistry::<DynamicRecord>::new();
//! users
//!     .declare_set(
//!         "roles",
//!         SetHash::from_names(["management", "accounting"]).unwrap(),
//!         SetOptions::default(),
//!     )
//!     .unwrap();
//!
//! let mut john = DynamicRecord::with_columns("users", vec![ColumnDef::new("roles_cd")]);
//! users.write(&mut john, "roles", Some(["accounting"])).unwrap();
//! assert_eq!(users.read(&john, "roles").unwrap(), Some(vec!["accounting"]));
//! assert!(users.query(&john, "accounting?").unwrap());
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

use crate::definition::{OperationKind, Scope, SetDefinition};
use crate::error::{Error, Result};
use crate::key::SetKey;
use crate::options::SetOptions;
use crate::record::Record;
use crate::table::SetHash;

/// Where a bound name points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    set: usize,
    kind: OperationKind,
}

/// A per-value operation bound to one declared name.
#[derive(Debug, Clone, Copy)]
pub struct ValueMethod<'a> {
    definition: &'a SetDefinition,
    position: usize,
}

impl<'a> ValueMethod<'a> {
    /// The set this value belongs to.
    #[must_use]
    pub fn definition(&self) -> &'a SetDefinition {
        self.definition
    }

    /// The declared value name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.definition
            .table()
            .get(self.position)
            .map_or("", |(name, _)| name)
    }

    /// The value's bit pattern.
    #[must_use]
    pub fn code(&self) -> i64 {
        self.definition
            .table()
            .get(self.position)
            .map_or(0, |(_, code)| code)
    }

    /// Test the value on a record.
    pub fn query<R: Record + ?Sized>(&self, record: &R) -> Result<bool> {
        self.definition.query_at(record, self.position)
    }

    /// Switch the value on or off; returns whether it is set afterwards.
    pub fn toggle<R: Record + ?Sized>(&self, record: &mut R, on: bool) -> Result<bool> {
        self.definition.toggle_at(record, self.position, on)
    }
}

/// An instance-level operation found by name.
#[derive(Debug, Clone, Copy)]
pub enum InstanceMethod<'a> {
    /// `get_<set>` (or `<set>`): read the set.
    Read(&'a SetDefinition),
    /// `set_<set>` (or `<set>=`): write the set.
    Write(&'a SetDefinition),
    /// `<prefix><value>?`: test one value.
    Query(ValueMethod<'a>),
    /// `<prefix><value>=`: switch one value.
    Toggle(ValueMethod<'a>),
}

/// A type-level operation found by name.
#[derive(Debug, Clone, Copy)]
pub enum ClassMethod<'a> {
    /// `<set>`: every declared name.
    Values(&'a SetDefinition),
    /// `<prefix><value>`: the value's name and bits.
    Accessor(ValueMethod<'a>),
}

/// Sets declared on the target type `T`.
pub struct SetRegistry<T: ?Sized> {
    target: &'static str,
    defaults: SetOptions,
    sets: Vec<SetDefinition>,
    instance: HashMap<String, Binding>,
    class: HashMap<String, Binding>,
    _target: PhantomData<fn(&T)>,
}

impl<T: ?Sized> fmt::Debug for SetRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetRegistry")
            .field("target", &self.target)
            .field("defaults", &self.defaults)
            .field("sets", &self.sets)
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized> Default for SetRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> SetRegistry<T> {
    /// Create an empty registry with the stock defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::with_defaults(SetOptions::default())
    }

    /// Create an empty registry whose declarations start from `defaults`.
    ///
    /// Options given to [`declare_set`](Self::declare_set) override these
    /// key by key.
    #[must_use]
    pub fn with_defaults(defaults: SetOptions) -> Self {
        Self {
            target: std::any::type_name::<T>(),
            defaults,
            sets: Vec::new(),
            instance: HashMap::new(),
            class: HashMap::new(),
            _target: PhantomData,
        }
    }

    /// Type name of the target, for diagnostics.
    #[must_use]
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Declare a set on the target type.
    ///
    /// All-or-nothing: the definition is built and every generated name is
    /// checked before anything is bound. Declaring a set name twice, or
    /// generating a name that is already bound, fails with
    /// [`Error::InvalidInput`].
    #[tracing::instrument(level = "debug", skip(self, values, options), fields(entity = self.target))]
    pub fn declare_set(
        &mut self,
        set_name: &str,
        values: SetHash,
        options: SetOptions,
    ) -> Result<&SetDefinition> {
        if self.definition(set_name).is_some() {
            return Err(Error::invalid_input(format!(
                "set `{}` is already declared on {}",
                set_name, self.target
            )));
        }

        let options = options.merged_over(&self.defaults);
        let definition = SetDefinition::new(set_name, values, options)?;
        let operations = definition.operations();

        let mut seen: HashSet<(Scope, &str)> = HashSet::with_capacity(operations.len());
        for op in &operations {
            let bound = match op.scope {
                Scope::Instance => &self.instance,
                Scope::Class => &self.class,
            };
            if bound.contains_key(&op.name) || !seen.insert((op.scope, op.name.as_str())) {
                return Err(Error::invalid_input(format!(
                    "operation `{}` generated by set `{}` is already defined on {}",
                    op.name, set_name, self.target
                )));
            }
        }

        let set = self.sets.len();
        for op in operations {
            let binding = Binding { set, kind: op.kind };
            match op.scope {
                Scope::Instance => self.instance.insert(op.name, binding),
                Scope::Class => self.class.insert(op.name, binding),
            };
        }

        tracing::debug!(
            set = definition.name(),
            column = definition.column(),
            values = definition.table().len(),
            whiny = definition.options().is_whiny(),
            "Declared set"
        );
        self.sets.push(definition);
        Ok(&self.sets[set])
    }

    /// Declare a set from JSON: `values` is a list of names or a map of name
    /// to bits, `options` an object (or `null`).
    pub fn declare_set_json(
        &mut self,
        set_name: &str,
        values: &serde_json::Value,
        options: &serde_json::Value,
    ) -> Result<&SetDefinition> {
        let options = SetOptions::from_json(options)?;
        let values = SetHash::from_json(values)?;
        self.declare_set(set_name, values, options)
    }

    /// A declared set by name.
    #[must_use]
    pub fn definition(&self, set_name: &str) -> Option<&SetDefinition> {
        self.sets.iter().find(|s| s.name() == set_name)
    }

    /// Every declared set, in declaration order.
    #[must_use]
    pub fn definitions(&self) -> &[SetDefinition] {
        &self.sets
    }

    /// True if an instance-level operation is bound under `name`.
    #[must_use]
    pub fn respond_to(&self, name: &str) -> bool {
        self.instance.contains_key(name)
    }

    /// True if a type-level operation is bound under `name`.
    #[must_use]
    pub fn class_respond_to(&self, name: &str) -> bool {
        self.class.contains_key(name)
    }

    fn value_method(&self, binding: Binding, position: usize) -> ValueMethod<'_> {
        ValueMethod {
            definition: &self.sets[binding.set],
            position,
        }
    }

    /// Look up an instance-level operation.
    #[must_use]
    pub fn instance_method(&self, name: &str) -> Option<InstanceMethod<'_>> {
        let binding = *self.instance.get(name)?;
        let definition = &self.sets[binding.set];
        match binding.kind {
            OperationKind::Read => Some(InstanceMethod::Read(definition)),
            OperationKind::Write => Some(InstanceMethod::Write(definition)),
            OperationKind::Query(position) => {
                Some(InstanceMethod::Query(self.value_method(binding, position)))
            }
            OperationKind::Toggle(position) => {
                Some(InstanceMethod::Toggle(self.value_method(binding, position)))
            }
            OperationKind::Accessor(_) | OperationKind::Values => None,
        }
    }

    /// Look up a type-level operation.
    #[must_use]
    pub fn class_method(&self, name: &str) -> Option<ClassMethod<'_>> {
        let binding = *self.class.get(name)?;
        match binding.kind {
            OperationKind::Values => Some(ClassMethod::Values(&self.sets[binding.set])),
            OperationKind::Accessor(position) => {
                Some(ClassMethod::Accessor(self.value_method(binding, position)))
            }
            _ => None,
        }
    }

    /// Type-level per-value accessor `<prefix><value>`.
    #[must_use]
    pub fn accessor(&self, name: &str) -> Option<ValueMethod<'_>> {
        match self.class_method(name)? {
            ClassMethod::Accessor(method) => Some(method),
            ClassMethod::Values(_) => None,
        }
    }

    /// Type-level `<set>`: every declared name of the set.
    pub fn values(&self, set_name: &str) -> Result<Vec<&str>> {
        Ok(self.require(set_name)?.values())
    }

    fn require(&self, set_name: &str) -> Result<&SetDefinition> {
        self.definition(set_name)
            .ok_or_else(|| Error::UnknownOperation(set_name.to_string()))
    }

    fn unknown(name: &str) -> Error {
        Error::UnknownOperation(name.to_string())
    }
}

impl<T: Record + ?Sized> SetRegistry<T> {
    /// `get_<set>`: read a set from a record.
    pub fn read<'a>(&'a self, record: &T, set_name: &str) -> Result<Option<Vec<&'a str>>> {
        self.require(set_name)?.read(record)
    }

    /// `set_<set>`: write a set on a record; `None` stores null.
    pub fn write<I>(&self, record: &mut T, set_name: &str, values: Option<I>) -> Result<()>
    where
        I: IntoIterator,
        I::Item: SetKey,
    {
        self.require(set_name)?.write(record, values)
    }

    /// `<prefix><value>?`: test one value through its bound name.
    pub fn query(&self, record: &T, method: &str) -> Result<bool> {
        match self.instance_method(method) {
            Some(InstanceMethod::Query(m)) => m.query(record),
            _ => Err(Self::unknown(method)),
        }
    }

    /// `<prefix><value>=`: switch one value through its bound name.
    pub fn toggle(&self, record: &mut T, method: &str, on: bool) -> Result<bool> {
        match self.instance_method(method) {
            Some(InstanceMethod::Toggle(m)) => m.toggle(record, on),
            _ => Err(Self::unknown(method)),
        }
    }
}
