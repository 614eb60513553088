//! The bit-name table: an ordered, frozen mapping from value name to bits.
//!
//! A table is built once per declared set and never mutated afterwards.
//! Names are unique; bit patterns are not, so an alias such as `all` may
//! cover several individual bits.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::key::SetKey;

/// Most names a list can hold: bit 62 is the last one a non-negative `i64`
/// can carry.
pub const MAX_LIST_NAMES: usize = 63;

/// Ordered mapping from value name to bit pattern for one declared set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetHash {
    /// Entries in declaration order.
    entries: Box<[(String, i64)]>,
    /// Name -> position in `entries`.
    index: HashMap<String, usize>,
}

impl SetHash {
    /// Build a table from an ordered list of names.
    ///
    /// The name at position `i` gets the bit value `2^i`.
    ///
    /// # Example
    ///
    /// ```
    /// use simpleset_core::SetHash;
    ///
    /// let table = SetHash::from_names(["a", "b", "c"]).unwrap();
    /// assert_eq!(table.code("c"), Some(4));
    /// ```
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names.into_iter().map(|n| n.as_ref().to_string()).collect();
        if names.len() > MAX_LIST_NAMES {
            return Err(Error::invalid_input(format!(
                "a list of values holds at most {} names, got {}",
                MAX_LIST_NAMES,
                names.len()
            )));
        }
        let entries = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, 1_i64 << i))
            .collect();
        Self::build(entries)
    }

    /// Build a table from explicit `(name, bits)` pairs, kept verbatim.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let entries = pairs
            .into_iter()
            .map(|(name, code)| (name.as_ref().to_string(), code))
            .collect();
        Self::build(entries)
    }

    /// Build a table from JSON: an array of names or an object of
    /// name -> non-negative integer.
    ///
    /// Any other shape, or an array holding anything but strings, is
    /// rejected.
    pub fn from_json(source: &serde_json::Value) -> Result<Self> {
        match source {
            serde_json::Value::Array(items) => {
                let names = items
                    .iter()
                    .map(|item| {
                        item.as_str().ok_or_else(|| {
                            Error::invalid_input(format!(
                                "a list of values may only hold names, found {}",
                                item
                            ))
                        })
                    })
                    .collect::<Result<Vec<&str>>>()?;
                Self::from_names(names)
            }
            serde_json::Value::Object(map) => {
                let pairs = map
                    .iter()
                    .map(|(name, code)| {
                        code.as_i64().map(|c| (name.as_str(), c)).ok_or_else(|| {
                            Error::invalid_input(format!(
                                "bit value for `{}` must be an integer, found {}",
                                name, code
                            ))
                        })
                    })
                    .collect::<Result<Vec<(&str, i64)>>>()?;
                Self::from_pairs(pairs)
            }
            other => Err(Error::invalid_input(format!(
                "values must be a list of names or a map of name to bits, found {}",
                other
            ))),
        }
    }

    /// Build a table from entries already checked at compile time.
    ///
    /// Used by `#[derive(SimpleSet)]`, which rejects blank, duplicate and
    /// negative entries before emitting this call.
    #[doc(hidden)]
    pub fn from_static(entries: &[(&str, i64)]) -> Self {
        let entries: Box<[(String, i64)]> = entries
            .iter()
            .map(|(name, code)| ((*name).to_string(), *code))
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();
        Self { entries, index }
    }

    fn build(raw: Vec<(String, i64)>) -> Result<Self> {
        let mut entries = Vec::with_capacity(raw.len());
        let mut index = HashMap::with_capacity(raw.len());

        for (name, code) in raw {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(Error::invalid_input("value names must not be blank"));
            }
            if code < 0 {
                return Err(Error::invalid_input(format!(
                    "bit value for `{}` must be non-negative, got {}",
                    name, code
                )));
            }
            if index.insert(name.clone(), entries.len()).is_some() {
                return Err(Error::invalid_input(format!(
                    "value `{}` is declared more than once",
                    name
                )));
            }
            entries.push((name, code));
        }

        Ok(Self {
            entries: entries.into_boxed_slice(),
            index,
        })
    }

    /// Number of names in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no names.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// `(name, bits)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.entries.iter().map(|(name, code)| (name.as_str(), *code))
    }

    /// Entry at a declaration position.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<(&str, i64)> {
        self.entries
            .get(position)
            .map(|(name, code)| (name.as_str(), *code))
    }

    /// Declaration position of a name.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Bit value of a name.
    #[must_use]
    pub fn code(&self, name: &str) -> Option<i64> {
        self.position(name).map(|i| self.entries[i].1)
    }

    /// Every name whose bits are fully covered by `current`, in declaration
    /// order. Aliases spanning several bits are included when all of their
    /// bits are set.
    #[must_use]
    pub fn covered(&self, current: i64) -> Vec<&str> {
        self.iter()
            .filter(|&(_, code)| code & current == code)
            .map(|(name, _)| name)
            .collect()
    }

    /// OR together the bit values of `keys`.
    ///
    /// Blank keys are skipped. An unknown key fails with
    /// [`Error::InvalidValue`] when `whiny` is set and contributes nothing
    /// otherwise. An empty input yields `0`.
    pub fn encode<I>(&self, set: &str, keys: I, whiny: bool) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: SetKey,
    {
        let mut combined = 0_i64;
        for key in keys {
            let Some(name) = key.set_key() else {
                continue;
            };
            match self.code(&name) {
                Some(code) => combined |= code,
                None if whiny => {
                    return Err(Error::InvalidValue {
                        set: set.to_string(),
                        value: name.into_owned(),
                    });
                }
                None => {
                    tracing::debug!(set = set, value = %name, "Ignoring unknown set value");
                }
            }
        }
        Ok(combined)
    }
}

impl Serialize for SetHash {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for SetHash {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SetHashVisitor)
    }
}

struct SetHashVisitor;

impl<'de> Visitor<'de> for SetHashVisitor {
    type Value = SetHash;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a list of value names or a map of value name to bits")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<SetHash, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut names: Vec<String> = Vec::new();
        while let Some(name) = seq.next_element::<String>()? {
            names.push(name);
        }
        SetHash::from_names(names).map_err(de::Error::custom)
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<SetHash, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut pairs: Vec<(String, i64)> = Vec::new();
        while let Some((name, code)) = map.next_entry::<String, i64>()? {
            pairs.push((name, code));
        }
        SetHash::from_pairs(pairs).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn all_table() -> SetHash {
        SetHash::from_pairs([("a", 1), ("b", 2), ("c", 4), ("d", 8), ("all", 15)]).unwrap()
    }

    #[test]
    fn list_assigns_powers_of_two() {
        let table = SetHash::from_names(["a", "b", "c", "d", "e", "f"]).unwrap();
        let codes: Vec<i64> = table.iter().map(|(_, c)| c).collect();
        assert_eq!(codes, vec![1, 2, 4, 8, 16, 32]);
    }

    #[test]
    fn pairs_keep_values_and_order() {
        let table = all_table();
        assert_eq!(table.code("all"), Some(15));
        assert_eq!(table.position("all"), Some(4));
        assert_eq!(
            table.names().collect::<Vec<_>>(),
            vec!["a", "b", "c", "d", "all"]
        );
    }

    #[test]
    fn names_are_trimmed_and_case_sensitive() {
        let table = SetHash::from_names([" english", "English "]).unwrap();
        assert_eq!(table.code("english"), Some(1));
        assert_eq!(table.code("English"), Some(2));
    }

    #[test]
    fn duplicate_and_blank_names_rejected() {
        assert!(matches!(
            SetHash::from_names(["a", "a"]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            SetHash::from_names(["a", " "]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn negative_bits_rejected() {
        assert!(SetHash::from_pairs([("a", -1)]).is_err());
    }

    #[test]
    fn list_longer_than_word_rejected() {
        let names: Vec<String> = (0..64).map(|i| format!("v{i}")).collect();
        assert!(SetHash::from_names(&names).is_err());
        assert!(SetHash::from_names(&names[..63]).is_ok());
    }

    #[test]
    fn covered_includes_aliases() {
        let table = all_table();
        assert_eq!(table.covered(15), vec!["a", "b", "c", "d", "all"]);
        assert_eq!(table.covered(13), vec!["a", "c", "d"]);
        assert!(table.covered(0).is_empty());
    }

    #[test]
    fn encode_whiny_names_offender() {
        let table = SetHash::from_names(["a", "b"]).unwrap();
        assert_eq!(
            table.encode("values", ["a", "c"], true).unwrap_err(),
            Error::InvalidValue {
                set: "values".into(),
                value: "c".into()
            }
        );
    }

    #[test]
    fn encode_lenient_drops_unknown() {
        let table = SetHash::from_names(["english", "french", "german", "japanese"]).unwrap();
        let code = table
            .encode("spoken_languages", ["french", "italian", "japanese"], false)
            .unwrap();
        assert_eq!(code, 10);
    }

    #[test]
    fn encode_skips_blank_and_empty_is_zero() {
        let table = SetHash::from_names(["a", "b"]).unwrap();
        assert_eq!(table.encode("values", ["", "b"], true).unwrap(), 2);
        assert_eq!(table.encode("values", Vec::<&str>::new(), true).unwrap(), 0);
    }

    #[test]
    fn from_json_accepts_list_and_map() {
        let list = SetHash::from_json(&json!(["x", "y"])).unwrap();
        assert_eq!(list.code("y"), Some(2));

        let map = SetHash::from_json(&json!({"create": 1, "send": 2, "all": 3})).unwrap();
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["create", "send", "all"]);
    }

    #[test]
    fn from_json_rejects_other_shapes() {
        for bad in [
            json!("a"),
            json!(7),
            json!(null),
            json!([["a", 1], ["b", 2]]),
            json!(["a", ["b", 2]]),
            json!({"a": "one"}),
        ] {
            assert!(
                matches!(SetHash::from_json(&bad), Err(Error::InvalidInput(_))),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn serializes_as_ordered_map() {
        let table = SetHash::from_names(["b", "a"]).unwrap();
        assert_eq!(serde_json::to_string(&table).unwrap(), r#"{"b":1,"a":2}"#);

        let back: SetHash = serde_json::from_str(r#"{"b":1,"a":2}"#).unwrap();
        assert_eq!(back, table);

        let listed: SetHash = serde_json::from_str(r#"["b","a"]"#).unwrap();
        assert_eq!(listed, table);
    }

    proptest! {
        #[test]
        fn prop_position_is_exponent(len in 0usize..=63) {
            let names: Vec<String> = (0..len).map(|i| format!("n{i}")).collect();
            let table = SetHash::from_names(&names).unwrap();
            for (i, name) in names.iter().enumerate() {
                prop_assert_eq!(table.code(name), Some(1_i64 << i));
            }
        }

        #[test]
        fn prop_encode_inverts_covered(bits in 0i64..(1 << 12)) {
            let names: Vec<String> = (0..12).map(|i| format!("n{i}")).collect();
            let table = SetHash::from_names(&names).unwrap();
            let covered = table.covered(bits);
            prop_assert_eq!(table.encode("s", covered, true).unwrap(), bits);
        }
    }
}
