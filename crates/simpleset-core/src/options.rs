//! Declaration options for a set.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validate::is_identifier;

/// Option keys accepted by [`SetOptions::from_json`].
pub const OPTION_KEYS: &[&str] = &["column", "prefix", "slim", "whiny"];

/// Prefix applied to per-value operation names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PrefixRepr", into = "PrefixRepr")]
pub enum Prefix {
    /// No prefix: `english?`.
    #[default]
    None,
    /// The set name: `spoken_languages_english?`.
    SetName,
    /// A literal prefix: `speaks_english?`.
    Custom(String),
}

impl Prefix {
    /// The string prepended to value names, separator included.
    #[must_use]
    pub fn resolve(&self, set_name: &str) -> String {
        match self {
            Prefix::None => String::new(),
            Prefix::SetName => format!("{}_", set_name),
            Prefix::Custom(prefix) => format!("{}_", prefix),
        }
    }
}

/// Which per-value operations to leave out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SlimRepr", into = "SlimRepr")]
pub enum Slim {
    /// Generate every per-value operation.
    #[default]
    Off,
    /// Generate no per-value operation at all.
    All,
    /// Skip only the type-level accessors; instance query/toggle remain.
    Class,
}

impl Slim {
    /// True if instance-level query/toggle operations are generated.
    #[must_use]
    pub const fn instance_methods(self) -> bool {
        !matches!(self, Slim::All)
    }

    /// True if type-level per-value accessors are generated.
    #[must_use]
    pub const fn class_methods(self) -> bool {
        matches!(self, Slim::Off)
    }
}

/// JSON shape of `prefix`: `true`, `false` or a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PrefixRepr {
    Flag(bool),
    Literal(String),
}

impl From<PrefixRepr> for Prefix {
    fn from(repr: PrefixRepr) -> Self {
        match repr {
            PrefixRepr::Flag(false) => Prefix::None,
            PrefixRepr::Flag(true) => Prefix::SetName,
            PrefixRepr::Literal(prefix) => Prefix::Custom(prefix),
        }
    }
}

impl From<Prefix> for PrefixRepr {
    fn from(prefix: Prefix) -> Self {
        match prefix {
            Prefix::None => PrefixRepr::Flag(false),
            Prefix::SetName => PrefixRepr::Flag(true),
            Prefix::Custom(prefix) => PrefixRepr::Literal(prefix),
        }
    }
}

/// JSON shape of `slim`: `true`, `false` or `"class"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum SlimRepr {
    Flag(bool),
    Class(ClassTag),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ClassTag {
    Class,
}

impl From<SlimRepr> for Slim {
    fn from(repr: SlimRepr) -> Self {
        match repr {
            SlimRepr::Flag(false) => Slim::Off,
            SlimRepr::Flag(true) => Slim::All,
            SlimRepr::Class(ClassTag::Class) => Slim::Class,
        }
    }
}

impl From<Slim> for SlimRepr {
    fn from(slim: Slim) -> Self {
        match slim {
            Slim::Off => SlimRepr::Flag(false),
            Slim::All => SlimRepr::Flag(true),
            Slim::Class => SlimRepr::Class(ClassTag::Class),
        }
    }
}

/// Configuration for one set declaration.
///
/// Every key is optional: `None` means "not given", so a
/// [`SetRegistry`](crate::SetRegistry) can layer its own base options
/// underneath (see [`SetOptions::merged_over`]). There are no process-wide
/// defaults. Unset keys resolve to `<set>_cd`, no prefix, no slimming and
/// `whiny = true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetOptions {
    /// Storage column; `<set>_cd` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Prefix for per-value operation names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Prefix>,
    /// Per-value operations to leave out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slim: Option<Slim>,
    /// Reject unknown names on write (`true`) or drop them (`false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whiny: Option<bool>,
}

impl SetOptions {
    /// Options with no key given.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the set in a custom column.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Set the per-value operation prefix.
    pub fn prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Use a literal prefix for per-value operations.
    pub fn prefix_with(self, prefix: impl Into<String>) -> Self {
        self.prefix(Prefix::Custom(prefix.into()))
    }

    /// Use the set name as prefix for per-value operations.
    pub fn prefix_with_set_name(self) -> Self {
        self.prefix(Prefix::SetName)
    }

    /// Choose which per-value operations to leave out.
    pub fn slim(mut self, slim: Slim) -> Self {
        self.slim = Some(slim);
        self
    }

    /// Choose whether unknown names on write are an error.
    pub fn whiny(mut self, whiny: bool) -> Self {
        self.whiny = Some(whiny);
        self
    }

    /// Parse options from a JSON object.
    ///
    /// Keys outside [`OPTION_KEYS`] fail with [`Error::UnknownOption`]; a
    /// non-object or an ill-typed value fails with [`Error::InvalidInput`].
    /// `null` is treated as "no options".
    pub fn from_json(source: &serde_json::Value) -> Result<Self> {
        let map = match source {
            serde_json::Value::Null => return Ok(Self::default()),
            serde_json::Value::Object(map) => map,
            other => {
                return Err(Error::invalid_input(format!(
                    "options must be an object, found {}",
                    other
                )));
            }
        };

        if let Some(unknown) = map.keys().find(|k| !OPTION_KEYS.contains(&k.as_str())) {
            return Err(Error::UnknownOption(unknown.clone()));
        }

        serde_json::from_value(source.clone())
            .map_err(|e| Error::invalid_input(format!("bad option value: {}", e)))
    }

    /// Layer these options over `base`: keys given here win, the rest come
    /// from `base`.
    #[must_use]
    pub fn merged_over(&self, base: &SetOptions) -> SetOptions {
        SetOptions {
            column: self.column.clone().or_else(|| base.column.clone()),
            prefix: self.prefix.clone().or_else(|| base.prefix.clone()),
            slim: self.slim.or(base.slim),
            whiny: self.whiny.or(base.whiny),
        }
    }

    /// Storage column for `set_name`.
    #[must_use]
    pub fn column_for(&self, set_name: &str) -> String {
        self.column
            .clone()
            .unwrap_or_else(|| format!("{}_cd", set_name))
    }

    /// Per-value prefix for `set_name`, separator included.
    #[must_use]
    pub fn prefix_for(&self, set_name: &str) -> String {
        self.prefix
            .as_ref()
            .map_or_else(String::new, |prefix| prefix.resolve(set_name))
    }

    /// Resolved slimming level.
    #[must_use]
    pub fn slim_level(&self) -> Slim {
        self.slim.unwrap_or_default()
    }

    /// Resolved `whiny` flag.
    #[must_use]
    pub fn is_whiny(&self) -> bool {
        self.whiny.unwrap_or(true)
    }

    /// Check identifiers: the column and a custom prefix.
    pub fn validate(&self) -> Result<()> {
        if let Some(column) = &self.column {
            if !is_identifier(column) {
                return Err(Error::invalid_input(format!(
                    "column `{}` is not a valid identifier",
                    column
                )));
            }
        }
        if let Some(Prefix::Custom(prefix)) = &self.prefix {
            if !is_identifier(prefix) {
                return Err(Error::invalid_input(format!(
                    "prefix `{}` is not a valid identifier",
                    prefix
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_whiny_without_prefix() {
        let options = SetOptions::default();
        assert!(options.is_whiny());
        assert_eq!(options.prefix_for("roles"), "");
        assert_eq!(options.slim_level(), Slim::Off);
        assert_eq!(options.column_for("roles"), "roles_cd");
    }

    #[test]
    fn custom_column_wins() {
        let options = SetOptions::new().column("custom_name");
        assert_eq!(options.column_for("languages"), "custom_name");
    }

    #[test]
    fn prefix_resolution() {
        assert_eq!(Prefix::None.resolve("spoken_languages"), "");
        assert_eq!(
            Prefix::SetName.resolve("spoken_languages"),
            "spoken_languages_"
        );
        assert_eq!(
            Prefix::Custom("speaks".into()).resolve("spoken_languages"),
            "speaks_"
        );
    }

    #[test]
    fn slim_levels() {
        assert!(Slim::Off.instance_methods() && Slim::Off.class_methods());
        assert!(Slim::Class.instance_methods() && !Slim::Class.class_methods());
        assert!(!Slim::All.instance_methods() && !Slim::All.class_methods());
    }

    #[test]
    fn from_json_reads_every_key() {
        let options = SetOptions::from_json(&json!({
            "column": "custom_name",
            "prefix": "speaks",
            "slim": "class",
            "whiny": false
        }))
        .unwrap();
        assert_eq!(options.column.as_deref(), Some("custom_name"));
        assert_eq!(options.prefix, Some(Prefix::Custom("speaks".into())));
        assert_eq!(options.slim, Some(Slim::Class));
        assert!(!options.is_whiny());

        let flags = SetOptions::from_json(&json!({"prefix": true, "slim": true})).unwrap();
        assert_eq!(flags.prefix, Some(Prefix::SetName));
        assert_eq!(flags.slim, Some(Slim::All));
        assert_eq!(flags.whiny, None);
    }

    #[test]
    fn from_json_rejects_unknown_key() {
        assert_eq!(
            SetOptions::from_json(&json!({"whiny": true, "colour": "red"})).unwrap_err(),
            Error::UnknownOption("colour".into())
        );
    }

    #[test]
    fn from_json_rejects_bad_values() {
        assert!(matches!(
            SetOptions::from_json(&json!({"slim": "instance"})),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            SetOptions::from_json(&json!({"whiny": "yes"})),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            SetOptions::from_json(&json!(["whiny"])),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(SetOptions::from_json(&json!(null)).unwrap(), SetOptions::default());
    }

    #[test]
    fn merge_keeps_given_keys() {
        let base = SetOptions::new().whiny(false).prefix_with_set_name();
        let own = SetOptions::new().whiny(true).column("custom_name");
        let merged = own.merged_over(&base);
        assert!(merged.is_whiny());
        assert_eq!(merged.prefix, Some(Prefix::SetName));
        assert_eq!(merged.column.as_deref(), Some("custom_name"));

        let untouched = SetOptions::new().merged_over(&base);
        assert!(!untouched.is_whiny());
    }

    #[test]
    fn assigned_fields_survive_merge() {
        let mut own = SetOptions::new();
        own.whiny = Some(false);
        own.column = Some("custom_name".into());

        let merged = own.merged_over(&SetOptions::default());
        assert!(!merged.is_whiny());
        assert_eq!(merged.column_for("languages"), "custom_name");

        let merged = own.merged_over(&SetOptions::new().whiny(true).column("other"));
        assert!(!merged.is_whiny());
        assert_eq!(merged.column_for("languages"), "custom_name");
    }

    #[test]
    fn deserialized_options_survive_merge() {
        let own: SetOptions = serde_json::from_str(r#"{"whiny": false, "slim": "class"}"#).unwrap();
        let merged = own.merged_over(&SetOptions::new().whiny(true));
        assert!(!merged.is_whiny());
        assert_eq!(merged.slim_level(), Slim::Class);
        assert_eq!(own, SetOptions::from_json(&json!({"whiny": false, "slim": "class"})).unwrap());
        assert_eq!(serde_json::to_string(&own).unwrap(), r#"{"slim":"class","whiny":false}"#);
    }

    #[test]
    fn validate_rejects_bad_identifiers() {
        assert!(SetOptions::new().column("bad column").validate().is_err());
        assert!(SetOptions::new().prefix_with("2x").validate().is_err());
        assert!(SetOptions::new().prefix_with("speaks").validate().is_ok());
    }
}
