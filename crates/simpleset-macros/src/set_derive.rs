//! Implementation of the SimpleSet derive macro.
//!
//! This module generates typed set accessors at compile time based on
//! `#[simple_set(...)]` struct attributes.

use std::collections::HashSet;
use std::sync::OnceLock;

use proc_macro2::{Span, TokenStream};
use quote::{ToTokens, format_ident, quote};
use regex::Regex;
use syn::ext::IdentExt;
use syn::{
    Data, DeriveInput, Error, Field, Fields, GenericArgument, Ident, Lit, LitInt, PathArguments,
    Result, Type,
};

/// Pattern set names, columns and prefixes must match.
const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Most names a list of values can hold.
const MAX_LIST_NAMES: usize = 63;

/// Parsed sets from a struct with `#[derive(SimpleSet)]`.
#[derive(Debug)]
pub struct SetsDef {
    /// The struct name.
    pub name: Ident,
    /// One entry per `#[simple_set(...)]` attribute.
    pub sets: Vec<SetDef>,
    /// Generics from the struct.
    pub generics: syn::Generics,
}

/// How per-value methods are prefixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixDef {
    None,
    SetName,
    Custom(String),
}

/// Which per-value methods are left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlimDef {
    Off,
    All,
    Class,
}

/// One declared value and its resolved bits.
#[derive(Debug)]
pub struct ValueDef {
    pub name: String,
    pub code: i64,
}

/// One parsed `#[simple_set(...)]` attribute.
#[derive(Debug)]
pub struct SetDef {
    /// Set name.
    pub name: String,
    /// Storage field (a struct field of type `Option<i64>`).
    pub column: Ident,
    /// Values in declaration order.
    pub values: Vec<ValueDef>,
    pub prefix: PrefixDef,
    pub slim: SlimDef,
    pub whiny: bool,
}

impl SetDef {
    fn resolved_prefix(&self) -> String {
        match &self.prefix {
            PrefixDef::None => String::new(),
            PrefixDef::SetName => format!("{}_", self.name),
            PrefixDef::Custom(prefix) => format!("{prefix}_"),
        }
    }
}

/// Parse a `DeriveInput` into a `SetsDef`.
pub fn parse_sets(input: &DeriveInput) -> Result<SetsDef> {
    let name = input.ident.clone();
    let generics = input.generics.clone();

    let fields: Vec<&Field> = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect(),
            other => {
                return Err(Error::new_spanned(
                    other,
                    "SimpleSet requires a struct with named fields",
                ));
            }
        },
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "SimpleSet can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "SimpleSet can only be derived for structs, not unions",
            ));
        }
    };

    let mut sets: Vec<SetDef> = Vec::new();
    for attr in &input.attrs {
        if !attr.path().is_ident("simple_set") {
            continue;
        }
        let set = parse_set_attr(attr, &fields)?;
        if sets.iter().any(|s| s.name == set.name) {
            return Err(Error::new_spanned(
                attr,
                format!("set `{}` is declared more than once", set.name),
            ));
        }
        sets.push(set);
    }

    if sets.is_empty() {
        return Err(Error::new_spanned(
            &input.ident,
            "SimpleSet requires at least one #[simple_set(name = \"...\", values(...))] attribute",
        ));
    }

    Ok(SetsDef {
        name,
        sets,
        generics,
    })
}

/// Parse one `#[simple_set(...)]` attribute.
fn parse_set_attr(attr: &syn::Attribute, fields: &[&Field]) -> Result<SetDef> {
    let mut name: Option<(String, Span)> = None;
    let mut raw_values: Vec<(String, Option<i64>, Span)> = Vec::new();
    let mut values_seen = false;
    let mut column: Option<(String, Span)> = None;
    let mut prefix = PrefixDef::None;
    let mut slim = SlimDef::Off;
    let mut whiny = true;

    attr.parse_nested_meta(|meta| {
        let path = &meta.path;

        if path.is_ident("name") {
            let value: Lit = meta.value()?.parse()?;
            match value {
                Lit::Str(lit_str) => name = Some((lit_str.value(), lit_str.span())),
                other => {
                    return Err(Error::new_spanned(other, "expected string literal for name"));
                }
            }
        } else if path.is_ident("values") {
            values_seen = true;
            meta.parse_nested_meta(|entry| {
                let ident = entry
                    .path
                    .get_ident()
                    .ok_or_else(|| entry.error("expected a value name"))?;
                let code = if entry.input.peek(syn::Token![=]) {
                    let lit: LitInt = entry.value()?.parse()?;
                    Some(lit.base10_parse::<i64>()?)
                } else {
                    None
                };
                raw_values.push((ident.unraw().to_string(), code, ident.span()));
                Ok(())
            })?;
        } else if path.is_ident("column") {
            let value: Lit = meta.value()?.parse()?;
            match value {
                Lit::Str(lit_str) => column = Some((lit_str.value(), lit_str.span())),
                other => {
                    return Err(Error::new_spanned(
                        other,
                        "expected string literal for column",
                    ));
                }
            }
        } else if path.is_ident("prefix") {
            let value: Lit = meta.value()?.parse()?;
            prefix = match value {
                Lit::Bool(flag) if flag.value => PrefixDef::SetName,
                Lit::Bool(_) => PrefixDef::None,
                Lit::Str(lit_str) => {
                    let custom = lit_str.value();
                    if !is_identifier(&custom) {
                        return Err(Error::new_spanned(
                            lit_str,
                            format!("prefix `{custom}` is not a valid identifier"),
                        ));
                    }
                    PrefixDef::Custom(custom)
                }
                other => {
                    return Err(Error::new_spanned(
                        other,
                        "expected `true`, `false` or a string literal for prefix",
                    ));
                }
            };
        } else if path.is_ident("slim") {
            let value: Lit = meta.value()?.parse()?;
            slim = match value {
                Lit::Bool(flag) if flag.value => SlimDef::All,
                Lit::Bool(_) => SlimDef::Off,
                Lit::Str(lit_str) if lit_str.value() == "class" => SlimDef::Class,
                other => {
                    return Err(Error::new_spanned(
                        other,
                        "expected `true`, `false` or \"class\" for slim",
                    ));
                }
            };
        } else if path.is_ident("whiny") {
            let value: Lit = meta.value()?.parse()?;
            match value {
                Lit::Bool(flag) => whiny = flag.value,
                other => {
                    return Err(Error::new_spanned(other, "expected `true` or `false` for whiny"));
                }
            }
        } else {
            let attr_name = path.to_token_stream().to_string();
            return Err(Error::new_spanned(
                path,
                format!(
                    "unknown simple_set option `{attr_name}`. \
                     Valid options are: name, values, column, prefix, slim, whiny"
                ),
            ));
        }

        Ok(())
    })?;

    let (name, name_span) =
        name.ok_or_else(|| Error::new_spanned(attr, "simple_set requires `name = \"...\"`"))?;
    if !is_identifier(&name) {
        return Err(Error::new(
            name_span,
            format!("set name `{name}` is not a valid identifier"),
        ));
    }
    if !values_seen {
        return Err(Error::new_spanned(attr, "simple_set requires `values(...)`"));
    }

    let values = resolve_values(raw_values, attr)?;

    let (column_name, column_span) =
        column.unwrap_or_else(|| (format!("{name}_cd"), name_span));
    let column = find_storage_field(fields, &column_name, column_span)?;

    Ok(SetDef {
        name,
        column,
        values,
        prefix,
        slim,
        whiny,
    })
}

/// Assign bits: powers of two for a bare list, verbatim for `name = bits`.
fn resolve_values(
    raw: Vec<(String, Option<i64>, Span)>,
    attr: &syn::Attribute,
) -> Result<Vec<ValueDef>> {
    let explicit = raw.iter().filter(|(_, code, _)| code.is_some()).count();
    if explicit != 0 && explicit != raw.len() {
        return Err(Error::new_spanned(
            attr,
            "values must either all be bare names or all be `name = bits`; cannot mix both",
        ));
    }
    if explicit == 0 && raw.len() > MAX_LIST_NAMES {
        return Err(Error::new_spanned(
            attr,
            format!("a list of values holds at most {MAX_LIST_NAMES} names"),
        ));
    }

    let mut seen = HashSet::new();
    let mut values = Vec::with_capacity(raw.len());
    for (i, (name, code, span)) in raw.into_iter().enumerate() {
        if !seen.insert(name.clone()) {
            return Err(Error::new(
                span,
                format!("value `{name}` is declared more than once"),
            ));
        }
        let code = code.unwrap_or(1_i64 << i);
        values.push(ValueDef { name, code });
    }
    Ok(values)
}

/// Find the storage field and check it is `Option<i64>`.
fn find_storage_field(fields: &[&Field], column: &str, span: Span) -> Result<Ident> {
    let field = fields
        .iter()
        .find(|f| f.ident.as_ref().is_some_and(|i| i.unraw() == column))
        .ok_or_else(|| {
            Error::new(
                span,
                format!("storage field `{column}` not found; add `{column}: Option<i64>` or set `column = \"...\"`"),
            )
        })?;

    let is_i64 = extract_option_inner(&field.ty).is_some_and(is_i64_type);
    if !is_i64 {
        return Err(Error::new_spanned(
            &field.ty,
            format!("storage field `{column}` must be `Option<i64>`"),
        ));
    }

    field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))
}

fn is_identifier(value: &str) -> bool {
    static IDENT: OnceLock<Option<Regex>> = OnceLock::new();
    IDENT
        .get_or_init(|| Regex::new(IDENTIFIER_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// Check if a type is `Option<T>`.
fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

/// Extract the inner type from `Option<T>`.
fn extract_option_inner(ty: &Type) -> Option<&Type> {
    if !is_option_type(ty) {
        return None;
    }
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if let PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(GenericArgument::Type(inner)) = args.args.first() {
                    return Some(inner);
                }
            }
        }
    }
    None
}

fn is_i64_type(ty: &Type) -> bool {
    matches!(ty, Type::Path(type_path) if type_path.path.is_ident("i64"))
}

/// Generate the inherent accessor methods for every declared set.
pub fn generate_set_impl(def: &SetsDef) -> TokenStream {
    let name = &def.name;
    let (impl_generics, ty_generics, where_clause) = def.generics.split_for_impl();

    let methods: Vec<TokenStream> = def.sets.iter().map(generate_set_methods).collect();

    quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            #(#methods)*
        }
    }
}

/// Generate the methods of one set.
fn generate_set_methods(set: &SetDef) -> TokenStream {
    let set_name = &set.name;
    let field = &set.column;
    let column_str = field.unraw().to_string();
    let whiny = set.whiny;

    let definition_fn = format_ident!("{}_definition", set_name);
    let reader = format_ident!("{}", set_name);
    let writer = format_ident!("set_{}", set_name);
    let clearer = format_ident!("clear_{}", set_name);
    let lister = format_ident!("{}_values", set_name);

    let entries = set.values.iter().map(|v| {
        let value_name = &v.name;
        let code = v.code;
        quote! { (#value_name, #code) }
    });

    let prefix_expr = match &set.prefix {
        PrefixDef::None => quote! { ::simpleset::Prefix::None },
        PrefixDef::SetName => quote! { ::simpleset::Prefix::SetName },
        PrefixDef::Custom(p) => {
            quote! { ::simpleset::Prefix::Custom(::std::string::String::from(#p)) }
        }
    };
    let slim_expr = match set.slim {
        SlimDef::Off => quote! { ::simpleset::Slim::Off },
        SlimDef::All => quote! { ::simpleset::Slim::All },
        SlimDef::Class => quote! { ::simpleset::Slim::Class },
    };

    let read_doc = format!(
        "Read `{set_name}` from `{column_str}`: `None` while the field is null."
    );
    let write_doc = format!("Write `{set_name}` into `{column_str}`.");

    let prefix = set.resolved_prefix();
    let mut per_value = Vec::new();
    for value in &set.values {
        let value_name = &value.name;
        let code = value.code;
        let base = format!("{prefix}{value_name}");

        if set.slim != SlimDef::All {
            let query = format_ident!("is_{}", base);
            let toggle = format_ident!("set_{}", base);
            per_value.push(quote! {
                #[doc = concat!("True if `", #value_name, "` is set.")]
                pub fn #query(&self) -> bool {
                    ::simpleset::SetDefinition::is_set(#code, self.#field)
                }

                #[doc = concat!("Switch `", #value_name, "` on or off; returns whether it is set afterwards.")]
                pub fn #toggle(&mut self, on: bool) -> bool {
                    let next = ::simpleset::SetDefinition::toggled(#code, self.#field, on);
                    self.#field = ::std::option::Option::Some(next);
                    ::simpleset::SetDefinition::is_set(#code, ::std::option::Option::Some(next))
                }
            });
        }

        if set.slim == SlimDef::Off {
            let name_fn = format_ident!("{}_name", base);
            let code_fn = format_ident!("{}_code", base);
            per_value.push(quote! {
                #[doc = concat!("The name `", #value_name, "`.")]
                pub const fn #name_fn() -> &'static str {
                    #value_name
                }

                #[doc = concat!("Bits of `", #value_name, "`.")]
                pub const fn #code_fn() -> i64 {
                    #code
                }
            });
        }
    }

    quote! {
        /// Declaration backing this set.
        pub fn #definition_fn() -> &'static ::simpleset::SetDefinition {
            static DEFINITION: ::std::sync::OnceLock<::simpleset::SetDefinition> =
                ::std::sync::OnceLock::new();
            DEFINITION.get_or_init(|| {
                ::simpleset::SetDefinition::from_static(
                    #set_name,
                    &[#(#entries),*],
                    ::simpleset::SetOptions::new()
                        .column(#column_str)
                        .prefix(#prefix_expr)
                        .slim(#slim_expr)
                        .whiny(#whiny),
                )
            })
        }

        #[doc = #read_doc]
        pub fn #reader(&self) -> ::std::option::Option<::std::vec::Vec<&'static str>> {
            Self::#definition_fn().decode(self.#field)
        }

        #[doc = #write_doc]
        ///
        /// Fails without touching the field if a name is unknown and the set
        /// is whiny.
        pub fn #writer<SimpleSetKeys>(&mut self, values: SimpleSetKeys) -> ::simpleset::Result<()>
        where
            SimpleSetKeys: ::std::iter::IntoIterator,
            <SimpleSetKeys as ::std::iter::IntoIterator>::Item: ::simpleset::SetKey,
        {
            let code = Self::#definition_fn().encode(values)?;
            self.#field = ::std::option::Option::Some(code);
            ::std::result::Result::Ok(())
        }

        /// Reset the set to null.
        pub fn #clearer(&mut self) {
            self.#field = ::std::option::Option::None;
        }

        /// Every declared name, in declaration order.
        pub fn #lister() -> ::std::vec::Vec<&'static str> {
            Self::#definition_fn().values()
        }

        #(#per_value)*
    }
}
