//! The immutable description of one declared union, and the per-variant
//! constructors built from it.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use derive_more::Display;
use indexmap::{IndexMap, IndexSet};
use log::debug;

use super::UnionOptions;
use crate::{
    codec::TagCodec,
    error::{UnionError, UnionResult},
    tag::Tag,
    validate::{validate_declaration, Validation},
};

/// Identity of a declared union. Two unions with the same names and prefix
/// still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("union#{_0}")]
pub struct UnionId(u64);

impl UnionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        UnionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug)]
pub(crate) struct Descriptor {
    pub(crate) id: UnionId,
    pub(crate) names: IndexSet<Arc<str>>,
    pub(crate) constructors: IndexMap<Arc<str>, Constructor>,
    pub(crate) codec: TagCodec,
    pub(crate) validation: Validation,
}

impl Descriptor {
    pub(crate) fn declare(
        names: Vec<Arc<str>>,
        options: UnionOptions,
        safe: bool,
    ) -> UnionResult<Arc<Self>> {
        validate_declaration(&names, safe)?;

        let id = UnionId::next();
        let codec = TagCodec::new(options.prefix);
        let constructors = names
            .iter()
            .map(|name| {
                let ctor = Constructor {
                    union: id,
                    name: name.clone(),
                    discriminant: codec.apply_prefix(name).into(),
                };
                (name.clone(), ctor)
            })
            .collect();

        debug!(
            "declared {} {id} with {} variants (prefix {:?}, {:?})",
            if safe { "safe" } else { "plain" },
            names.len(),
            codec.prefix(),
            options.validation,
        );

        Ok(Arc::new(Descriptor {
            id,
            names: names.into_iter().collect(),
            constructors,
            codec,
            validation: options.validation,
        }))
    }

    /// The variant name of a discriminant, if it belongs to this union.
    pub(crate) fn member_name<'d>(&self, discriminant: &'d str) -> Option<&'d str> {
        self.codec
            .strip_prefix(discriminant)
            .filter(|name| self.names.contains(*name))
    }
}

/// Builds tags of one variant.
///
/// Constructors compare equal only when they come from the same union and
/// name the same variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constructor {
    union: UnionId,
    name: Arc<str>,
    discriminant: Arc<str>,
}

impl Constructor {
    /// The unprefixed variant name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The prefixed discriminant every tag of this variant carries.
    pub fn discriminant(&self) -> &str {
        &self.discriminant
    }

    /// The union this constructor belongs to.
    pub fn union_id(&self) -> UnionId {
        self.union
    }

    /// Build a tag of this variant. This never fails.
    pub fn tag<P>(&self, payload: P) -> Tag<P> {
        Tag::new(&*self.discriminant, payload)
    }

    /// Build a tag of this variant carrying no payload.
    pub fn unit(&self) -> Tag<()> {
        self.tag(())
    }

    /// Whether `tag` was built by this variant (or has the same discriminant).
    pub fn is<P>(&self, tag: &Tag<P>) -> bool {
        tag.discriminant() == &*self.discriminant
    }

    /// Hand the payload of a tag of this variant to `f`.
    pub fn unwrap<P, R>(&self, tag: Tag<P>, f: impl FnOnce(P) -> R) -> UnionResult<R> {
        if self.is(&tag) {
            Ok(f(tag.into_payload()))
        } else {
            Err(UnionError::WrongVariant {
                expected: self.discriminant.to_string(),
                found: tag.discriminant().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declare(names: &[&str], prefix: &str) -> Arc<Descriptor> {
        let names = names.iter().map(|&name| Arc::from(name)).collect();
        let options = UnionOptions::new().with_prefix(prefix);
        Descriptor::declare(names, options, false).unwrap()
    }

    #[test]
    fn ids_are_unique() {
        let a = declare(&["Foo"], "");
        let b = declare(&["Foo"], "");
        assert_ne!(a.id, b.id);
        assert_eq!(a.constructors["Foo"].union_id(), a.id);
        assert_eq!(b.constructors["Foo"].union_id(), b.id);
        assert_ne!(a.constructors["Foo"], b.constructors["Foo"]);
    }

    #[test]
    fn constructors_apply_prefix() {
        let desc = declare(&["Inc", "Dec"], "counter/");
        let inc = &desc.constructors["Inc"];
        assert_eq!(inc.name(), "Inc");
        assert_eq!(inc.discriminant(), "counter/Inc");
        assert_eq!(inc.tag(3), Tag::new("counter/Inc", 3));
    }

    #[test]
    fn member_name() {
        let desc = declare(&["Inc"], "c/");
        assert_eq!(desc.member_name("c/Inc"), Some("Inc"));
        assert_eq!(desc.member_name("c/Dec"), None);
        assert_eq!(desc.member_name("Inc"), None);
    }

    #[test]
    fn unwrap_checks_variant() {
        let desc = declare(&["Inc", "Dec"], "");
        let (inc, dec) = (&desc.constructors["Inc"], &desc.constructors["Dec"]);

        assert_eq!(inc.unwrap(inc.tag(4), |n| n * 2).unwrap(), 8);
        assert!(inc.is(&inc.unit()));
        assert!(!inc.is(&dec.unit()));

        let err = inc.unwrap(dec.tag(4), |n| n).unwrap_err();
        assert_eq!(err.to_string(), "cannot unwrap a \"Dec\" tag as \"Inc\"");
    }
}
