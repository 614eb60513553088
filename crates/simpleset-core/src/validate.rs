//! Identifier validation for set declarations.
//!
//! Set names, storage columns and custom prefixes end up as column and
//! operation names, so they are restricted to plain identifiers. The derive
//! macro applies the same pattern at compile time.

use std::sync::OnceLock;

use regex::Regex;

/// Pattern every set name, column name and custom prefix must match.
pub const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// The compiled identifier pattern, built on first use.
fn identifier_regex() -> Option<&'static Regex> {
    static IDENT: OnceLock<Option<Regex>> = OnceLock::new();
    IDENT
        .get_or_init(|| match Regex::new(IDENTIFIER_PATTERN) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::warn!(
                    pattern = IDENTIFIER_PATTERN,
                    error = %e,
                    "Identifier pattern failed to compile, rejecting every name"
                );
                None
            }
        })
        .as_ref()
}

/// True if `value` is usable as a set, column or prefix name.
pub fn is_identifier(value: &str) -> bool {
    identifier_regex().is_some_and(|regex| regex.is_match(value))
}
