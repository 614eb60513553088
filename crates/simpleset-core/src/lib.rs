//! Core types for SimpleSet.
//!
//! `simpleset-core` implements named sets stored in one integer column: each
//! declared name maps to a bit (or any bit pattern) of that integer, and the
//! set can be read and written as a list of names or queried and toggled one
//! name at a time.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: [`Record`] is what a target entity implements so a set
//!   can reach its storage column; [`Value`] is the value exchanged with it.
//! - **Declaration**: [`SetHash`] (the frozen bit-name table), [`SetOptions`]
//!   and [`SetDefinition`] describe one declared set and carry its operations.
//! - **Runtime binding**: [`SetRegistry`] is `declare_set` for a target type,
//!   mapping generated operation names to typed handles.
//!
//! `simpleset-macros` generates typed methods over the same [`SetDefinition`]
//! at compile time. Most applications should use the `simpleset` facade.

pub mod definition;
pub mod dynamic;
pub mod error;
pub mod key;
pub mod options;
pub mod record;
pub mod registry;
pub mod table;
pub mod validate;
pub mod value;

pub use definition::{Operation, OperationKind, Scope, SetDefinition};
pub use dynamic::{ColumnDef, DynamicRecord};
pub use error::{Error, Result};
pub use key::SetKey;
pub use options::{OPTION_KEYS, Prefix, SetOptions, Slim};
pub use record::Record;
pub use registry::{ClassMethod, InstanceMethod, SetRegistry, ValueMethod};
pub use table::{MAX_LIST_NAMES, SetHash};
pub use validate::{IDENTIFIER_PATTERN, is_identifier};
pub use value::Value;
