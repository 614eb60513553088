//! SimpleSet: named sets stored as bitmasks in one integer column.
//!
//! A set is declared once per target type with a list of names (bits assigned
//! as successive powers of two) or a map of name to bit pattern. The
//! declaration yields:
//!
//! - a reader returning the covered names, or `None` while the column is null;
//! - a writer taking a list of names (unknown names rejected unless the set
//!   is declared with `whiny = false`);
//! - per-value query and toggle operations;
//! - type-level per-value accessors for each name and its bits.
//!
//! Sets can be declared at compile time with `#[derive(SimpleSet)]`, or at
//! runtime on a [`SetRegistry`] for any type implementing [`Record`].
//!
//! # Example
//!
//! ```
//! use simpleset::prelude::*;
//!
//! #[derive(SimpleSet, Default)]
//! #[simple_set(name = "fruits_i_like", values(apples, bananas, pinaple))]
//! struct FruitsEater {
//!     fruits_i_like_cd: Option<i64>,
//! }
//!
//! let mut sample = FruitsEater::default();
//! sample.set_fruits_i_like(["apples", "pinaple"]).unwrap();
//! assert_eq!(sample.fruits_i_like_cd, Some(5));
//! assert!(sample.is_pinaple());
//! ```

// Generated code names paths through this crate.
extern crate self as simpleset;

pub use simpleset_core::*;
pub use simpleset_macros::SimpleSet;

/// Everything needed to declare and use sets.
pub mod prelude {
    pub use simpleset_core::{
        ColumnDef, DynamicRecord, Error, Prefix, Record, Result, SetDefinition, SetHash, SetKey,
        SetOptions, SetRegistry, Slim, Value,
    };
    pub use simpleset_macros::SimpleSet;
}
