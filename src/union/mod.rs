//! Declaring unions.
//!
//! A plain [`Union`] keeps its variant constructors and its dispatch methods
//! in one namespace (see [`Union::member`]), so the dispatch method names are
//! reserved. A [`SafeUnion`] keeps them apart as two fields and accepts any
//! variant name.

use std::sync::Arc;

use derive_more::{Deref, Display};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

mod descriptor;

pub use self::descriptor::{Constructor, UnionId};
pub(crate) use self::descriptor::Descriptor;
use crate::{
    error::UnionResult,
    tag::Tag,
    validate::{
        declaration_names, validate_declaration, validate_membership, validate_record, Validation,
    },
};

/// Options recognised when declaring a union.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnionOptions {
    /// Prepended to every discriminant of the union.
    pub prefix: String,
    pub validation: Validation,
}

impl UnionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }
}

/// The dispatch methods of a union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    #[display("match")]
    Match,
    #[display("matcher")]
    Matcher,
    #[display("matches")]
    Matches,
}

impl Method {
    pub const ALL: [Method; 3] = [Method::Match, Method::Matcher, Method::Matches];

    pub fn name(self) -> &'static str {
        match self {
            Method::Match => "match",
            Method::Matcher => "matcher",
            Method::Matches => "matches",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Method::ALL.into_iter().find(|method| method.name() == name)
    }
}

/// One entry of a plain union's shared namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member<'u> {
    Variant(&'u Constructor),
    Method(Method),
}

fn collect_names<I>(names: I) -> Vec<Arc<str>>
where
    I: IntoIterator,
    I::Item: Into<Arc<str>>,
{
    names.into_iter().map(Into::into).collect()
}

/// The variant constructors of a union, by name.
#[derive(Debug, Clone)]
pub struct Variants {
    desc: Arc<Descriptor>,
}

impl Variants {
    pub fn get(&self, name: &str) -> Option<&Constructor> {
        self.desc.constructors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.desc.names.contains(name)
    }

    /// Constructors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Constructor> + '_ {
        self.desc.constructors.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.desc.names.iter().map(|name| &**name)
    }

    pub fn len(&self) -> usize {
        self.desc.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.desc.names.is_empty()
    }
}

/// The dispatch and membership operations of a union.
///
/// The dispatch operations themselves live in [`crate::matcher`].
#[derive(Debug, Clone)]
pub struct Methods {
    pub(crate) desc: Arc<Descriptor>,
}

impl Methods {
    pub fn id(&self) -> UnionId {
        self.desc.id
    }

    pub fn prefix(&self) -> &str {
        self.desc.codec.prefix()
    }

    pub fn validation(&self) -> Validation {
        self.desc.validation
    }

    /// Whether `tag` belongs to this union. Never fails.
    pub fn has<P>(&self, tag: &Tag<P>) -> bool {
        self.desc.member_name(tag.discriminant()).is_some()
    }

    /// Whether a raw wire record is a tag of this union. Never fails.
    pub fn has_value(&self, value: &Value) -> bool {
        validate_record(value)
            .is_ok_and(|discriminant| self.desc.member_name(discriminant).is_some())
    }

    /// Decode a tag from its wire representation and check that it belongs
    /// to this union.
    pub fn decode<P: DeserializeOwned>(&self, text: &str) -> UnionResult<Tag<P>> {
        let value: Value = serde_json::from_str(text)?;
        self.decode_value(value)
    }

    /// Like [`Methods::decode`], for a record that is already parsed.
    pub fn decode_value<P: DeserializeOwned>(&self, value: Value) -> UnionResult<Tag<P>> {
        if self.desc.validation.is_checked() {
            let discriminant = validate_record(&value)?;
            validate_membership(discriminant, &self.desc.codec, &self.desc.names)?;
        }
        Tag::from_value(value)
    }
}

/// A union whose constructors share one namespace with its dispatch methods.
///
/// Dereferences to its [`Methods`].
#[derive(Debug, Clone, Deref)]
pub struct Union {
    #[deref]
    methods: Methods,
    variants: Variants,
}

impl Union {
    /// Declare a union with default options.
    pub fn new<I>(names: I) -> UnionResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Arc<str>>,
    {
        Self::with_options(names, UnionOptions::default())
    }

    pub fn with_options<I>(names: I, options: UnionOptions) -> UnionResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Arc<str>>,
    {
        Self::declare(collect_names(names), options)
    }

    /// Declare a union from a JSON array of names.
    pub fn from_value(names: &Value, options: UnionOptions) -> UnionResult<Self> {
        Self::declare(declaration_names(names)?, options)
    }

    fn declare(names: Vec<Arc<str>>, options: UnionOptions) -> UnionResult<Self> {
        let desc = Descriptor::declare(names, options, false)?;
        Ok(Union::from_descriptor(desc))
    }

    fn from_descriptor(desc: Arc<Descriptor>) -> Self {
        Union {
            methods: Methods { desc: desc.clone() },
            variants: Variants { desc },
        }
    }

    /// The constructor of variant `name`.
    pub fn ctor(&self, name: &str) -> Option<&Constructor> {
        self.variants.get(name)
    }

    /// Look a name up in the shared namespace of constructors and methods.
    pub fn member(&self, name: &str) -> Option<Member<'_>> {
        match Method::from_name(name) {
            Some(method) => Some(Member::Method(method)),
            None => self.ctor(name).map(Member::Variant),
        }
    }

    pub fn variants(&self) -> &Variants {
        &self.variants
    }

    pub fn methods(&self) -> &Methods {
        &self.methods
    }
}

/// A union whose constructors and dispatch methods live in separate fields,
/// so that any string, including `"match"` and `""`, is a legal variant name.
#[derive(Debug, Clone)]
pub struct SafeUnion {
    pub variants: Variants,
    pub methods: Methods,
}

impl SafeUnion {
    pub fn new<I>(names: I) -> UnionResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Arc<str>>,
    {
        Self::with_options(names, UnionOptions::default())
    }

    pub fn with_options<I>(names: I, options: UnionOptions) -> UnionResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Arc<str>>,
    {
        Self::declare(collect_names(names), options)
    }

    pub fn from_value(names: &Value, options: UnionOptions) -> UnionResult<Self> {
        Self::declare(declaration_names(names)?, options)
    }

    fn declare(names: Vec<Arc<str>>, options: UnionOptions) -> UnionResult<Self> {
        let desc = Descriptor::declare(names, options, true)?;
        Ok(SafeUnion {
            variants: Variants { desc: desc.clone() },
            methods: Methods { desc },
        })
    }

    /// Merge both namespaces into a plain union, if none of the variant names
    /// collide with a dispatch method.
    ///
    /// The merged union is the same union: tags and constructors keep working.
    pub fn into_union(self) -> UnionResult<Union> {
        let names: Vec<_> = self.methods.desc.names.iter().cloned().collect();
        validate_declaration(&names, false)?;
        Ok(Union::from_descriptor(self.methods.desc))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{error::UnionError, validate::RESERVED_NAMES};

    #[test]
    fn declares_each_name() {
        let u = Union::new(["Inc", "Dec", "Reset"]).unwrap();
        let names: Vec<_> = u.variants().names().collect();
        assert_eq!(names, ["Inc", "Dec", "Reset"]);
        assert_eq!(u.ctor("Dec").unwrap().name(), "Dec");
        assert!(u.ctor("Nope").is_none());
        assert_eq!(u.variants().len(), 3);
    }

    #[test]
    fn duplicates_rejected() {
        let err = Union::new(["A", "B", "A"]).unwrap_err();
        assert!(matches!(err, UnionError::DuplicateVariant { index: 2, .. }));
        assert!(matches!(
            SafeUnion::new(["", ""]),
            Err(UnionError::DuplicateVariant { .. })
        ));
    }

    #[test]
    fn method_names_match_reserved_set() {
        assert_eq!(Method::ALL.map(Method::name), RESERVED_NAMES);
        assert_eq!(Method::Matches.to_string(), "matches");
    }

    #[test]
    fn plain_namespace_is_shared() {
        let u = Union::new(["Inc"]).unwrap();
        assert_eq!(u.member("match"), Some(Member::Method(Method::Match)));
        assert_eq!(u.member("Inc"), Some(Member::Variant(u.ctor("Inc").unwrap())));
        assert_eq!(u.member("Dec"), None);

        assert!(matches!(
            Union::new(["matcher"]),
            Err(UnionError::ReservedName { .. })
        ));
    }

    #[test]
    fn safe_union_accepts_any_name() {
        let safe = SafeUnion::new(["match", "matches", ""]).unwrap();
        assert!(safe.variants.contains("match"));
        assert_eq!(safe.variants.get("").unwrap().discriminant(), "");

        let err = safe.into_union().unwrap_err();
        assert!(matches!(err, UnionError::ReservedName { ref name } if name == "match"));
    }

    #[test]
    fn safe_union_merges_without_collision() {
        let safe = SafeUnion::new(["Inc", "Dec"]).unwrap();
        let inc = safe.variants.get("Inc").unwrap().clone();
        let merged = safe.into_union().unwrap();
        assert_eq!(merged.ctor("Inc"), Some(&inc));
        assert!(merged.has(&inc.tag(1)));
    }

    #[test]
    fn options_from_config() {
        let options: UnionOptions = serde_json::from_value(json!({
            "prefix": "counter/",
            "validation": "unchecked",
        }))
        .unwrap();
        assert_eq!(
            options,
            UnionOptions::new()
                .with_prefix("counter/")
                .with_validation(Validation::Unchecked)
        );

        let defaults: UnionOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(defaults, UnionOptions::default());

        assert!(serde_json::from_value::<UnionOptions>(json!({ "prefx": "x" })).is_err());
    }

    #[test]
    fn declare_from_json() {
        let options = UnionOptions::new().with_prefix("x/");
        let u = Union::from_value(&json!(["A", "B"]), options).unwrap();
        assert_eq!(u.prefix(), "x/");
        assert_eq!(u.ctor("B").unwrap().discriminant(), "x/B");

        let err = SafeUnion::from_value(&json!("A"), UnionOptions::default()).unwrap_err();
        assert!(matches!(err, UnionError::InvalidDeclaration { .. }));
    }

    #[test]
    fn membership_without_failing() {
        let u = Union::with_options(["Inc"], UnionOptions::new().with_prefix("c/")).unwrap();
        let inc = u.ctor("Inc").unwrap();

        assert!(u.has(&inc.tag(1)));
        assert!(!u.has(&Tag::new("Inc", 1)));
        assert!(!u.has(&Tag::new("c/Dec", 1)));

        assert!(u.has_value(&json!({ "type": "c/Inc", "payload": null })));
        assert!(!u.has_value(&json!({ "type": 1 })));
        assert!(!u.has_value(&json!(4)));
    }

    #[test]
    fn decode_checks_membership() {
        let options = UnionOptions::new()
            .with_prefix("c/")
            .with_validation(Validation::Checked);
        let u = Union::with_options(["Inc"], options).unwrap();

        let tag: Tag<i64> = u.decode(r#"{"type":"c/Inc","payload":7}"#).unwrap();
        assert_eq!(tag, u.ctor("Inc").unwrap().tag(7));

        assert!(matches!(
            u.decode::<i64>(r#"{"type":"c/Dec","payload":7}"#),
            Err(UnionError::NotAMember { .. })
        ));
        assert!(matches!(
            u.decode::<i64>(r#"[1]"#),
            Err(UnionError::NotATag { .. })
        ));
        assert!(matches!(u.decode::<i64>("{"), Err(UnionError::Json(_))));
    }

    #[test]
    fn decode_requires_payload_field() {
        for validation in [Validation::Checked, Validation::Unchecked] {
            let options = UnionOptions::new().with_validation(validation);
            let u = Union::with_options(["Foo"], options).unwrap();

            assert!(matches!(
                u.decode::<Option<i32>>(r#"{"type":"Foo"}"#),
                Err(UnionError::Json(_))
            ));
            assert!(matches!(
                u.decode_value::<Option<i32>>(json!({ "type": "Foo" })),
                Err(UnionError::Json(_))
            ));

            let tag = u.decode::<Option<i32>>(r#"{"type":"Foo","payload":null}"#);
            assert_eq!(tag.unwrap(), u.ctor("Foo").unwrap().tag(None));
        }
    }
}
