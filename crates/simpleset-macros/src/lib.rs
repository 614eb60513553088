//! Procedural macros for SimpleSet.
//!
//! `#[derive(SimpleSet)]` reads one `#[simple_set(...)]` attribute per set and
//! generates typed inherent methods backed by `simpleset::SetDefinition`.
//! Generated code refers to the `simpleset` facade, so depend on that crate:
//!
//! ```ignore
//! use simpleset::prelude::*;
//!
//! #[derive(SimpleSet, Default)]
//! #[simple_set(name = "roles", values(management, accounting))]
//! struct User {
//!     roles_cd: Option<i64>,
//! }
//!
//! let mut john = User::default();
//! john.set_roles(["accounting"])?;
//! assert_eq!(john.roles(), Some(vec!["accounting"]));
//! assert!(john.is_accounting());
//! assert_eq!(User::accounting_code(), 2);
//! ```
//!
//! Options mirror `simpleset::SetOptions`: `column`, `prefix`, `slim`
//! and `whiny`. Invalid declarations are compile errors.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod set_derive;

/// Derive typed set accessors for a struct.
///
/// See the crate documentation for the attribute syntax.
#[proc_macro_derive(SimpleSet, attributes(simple_set))]
pub fn derive_simple_set(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match set_derive::parse_sets(&input) {
        Ok(def) => set_derive::generate_set_impl(&def).into(),
        Err(err) => err.to_compile_error().into(),
    }
}
