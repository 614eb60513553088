//! Normalization of write inputs into set value names.
//!
//! Every element handed to a set write goes through [`SetKey::set_key`]
//! before table lookup. The rules are:
//!
//! | input | canonical name |
//! |---|---|
//! | `str`, `String`, `Cow<str>` | trimmed text; empty after trimming is skipped |
//! | `i32`, `i64`, `u32`, `u64`, `usize` | decimal rendering, looked up as a name |
//! | `Value::Text` / integer variants | as the corresponding text / integer |
//! | `Value::Bool` | `"true"` / `"false"` |
//! | `Value::Null` | skipped |
//! | `&T`, `Box<T>` | same as `T` |
//!
//! Lookup is case-sensitive. A number is never matched against a bit value:
//! `3` only matches a value literally named `"3"`.

use std::borrow::Cow;

use crate::value::Value;

/// An element accepted by set writes.
pub trait SetKey {
    /// Canonical name for lookup, or `None` if the element is to be skipped.
    fn set_key(&self) -> Option<Cow<'_, str>>;
}

fn normalize_text(s: &str) -> Option<Cow<'_, str>> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(Cow::Borrowed(trimmed))
}

impl SetKey for str {
    fn set_key(&self) -> Option<Cow<'_, str>> {
        normalize_text(self)
    }
}

impl SetKey for String {
    fn set_key(&self) -> Option<Cow<'_, str>> {
        normalize_text(self)
    }
}

impl SetKey for Cow<'_, str> {
    fn set_key(&self) -> Option<Cow<'_, str>> {
        normalize_text(self)
    }
}

macro_rules! impl_set_key_int {
    ($($ty:ty),*) => {
        $(
            impl SetKey for $ty {
                fn set_key(&self) -> Option<Cow<'_, str>> {
                    Some(Cow::Owned(self.to_string()))
                }
            }
        )*
    };
}

impl_set_key_int!(i32, i64, u32, u64, usize);

impl SetKey for Value {
    fn set_key(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Value::Int(v) => v.set_key(),
            Value::BigInt(v) => v.set_key(),
            Value::Text(s) => normalize_text(s),
        }
    }
}

impl<T: SetKey + ?Sized> SetKey for &T {
    fn set_key(&self) -> Option<Cow<'_, str>> {
        (**self).set_key()
    }
}

impl<T: SetKey + ?Sized> SetKey for Box<T> {
    fn set_key(&self) -> Option<Cow<'_, str>> {
        (**self).set_key()
    }
}
