//! Exhaustive dispatch over tags.
//!
//! A [`HandlerTable`] maps variant names to handlers, optionally with a
//! catch-all. Dispatching a tag looks its variant name up by exact key: a
//! registered key always fires its own handler and never falls through to the
//! catch-all, which only runs for variants without a key.
//!
//! Handlers take the payload and a context value. [`Methods::match_tag`]
//! always passes `()`; a [`Matcher`] forwards whatever context it is called
//! with, which suits reducers that thread an accumulator through.

use std::{fmt, rc::Rc, sync::Arc};

use indexmap::IndexMap;
use log::{trace, warn};

use crate::{
    error::{UnionError, UnionResult},
    tag::Tag,
    union::{Constructor, Descriptor, Methods},
    validate::{validate_handler_table, validate_membership},
};

/// The handler registered for one variant.
pub enum Handler<'a, P, R, C = ()> {
    Bound(Rc<dyn Fn(P, C) -> R + 'a>),
    /// A handler that was referenced by name but never registered, see
    /// [`HandlerTable::from_routes`].
    Unresolved(String),
}

impl<P, R, C> Handler<'_, P, R, C> {
    pub fn unresolved(&self) -> Option<&str> {
        match self {
            Handler::Bound(_) => None,
            Handler::Unresolved(reference) => Some(reference),
        }
    }
}

impl<P, R, C> Clone for Handler<'_, P, R, C> {
    fn clone(&self) -> Self {
        match self {
            Handler::Bound(f) => Handler::Bound(f.clone()),
            Handler::Unresolved(reference) => Handler::Unresolved(reference.clone()),
        }
    }
}

impl<P, R, C> fmt::Debug for Handler<'_, P, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Bound(_) => f.write_str("Bound(..)"),
            Handler::Unresolved(reference) => f.debug_tuple("Unresolved").field(reference).finish(),
        }
    }
}

/// The fallback for variants without a handler. It receives only the context.
pub enum CatchAll<'a, R, C = ()> {
    Bound(Rc<dyn Fn(C) -> R + 'a>),
    Unresolved(String),
}

impl<R, C> CatchAll<'_, R, C> {
    pub fn unresolved(&self) -> Option<&str> {
        match self {
            CatchAll::Bound(_) => None,
            CatchAll::Unresolved(reference) => Some(reference),
        }
    }
}

impl<R, C> Clone for CatchAll<'_, R, C> {
    fn clone(&self) -> Self {
        match self {
            CatchAll::Bound(f) => CatchAll::Bound(f.clone()),
            CatchAll::Unresolved(reference) => CatchAll::Unresolved(reference.clone()),
        }
    }
}

impl<R, C> fmt::Debug for CatchAll<'_, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatchAll::Bound(_) => f.write_str("Bound(..)"),
            CatchAll::Unresolved(reference) => {
                f.debug_tuple("Unresolved").field(reference).finish()
            }
        }
    }
}

/// Handlers keyed by unprefixed variant name, plus an optional catch-all.
pub struct HandlerTable<'a, P, R, C = ()> {
    handlers: IndexMap<String, Handler<'a, P, R, C>>,
    catch_all: Option<CatchAll<'a, R, C>>,
    duplicates: Vec<String>,
}

impl<'a, P, R, C> HandlerTable<'a, P, R, C> {
    pub fn new() -> Self {
        HandlerTable {
            handlers: IndexMap::new(),
            catch_all: None,
            duplicates: Vec::new(),
        }
    }

    /// Register `handler` for `variant`.
    ///
    /// Registering the same variant twice is reported by validation as
    /// [`UnionError::DuplicateHandler`]; unvalidated dispatch uses the last
    /// registration.
    pub fn with_handler(
        mut self,
        variant: impl Into<String>,
        handler: Handler<'a, P, R, C>,
    ) -> Self {
        let variant = variant.into();
        if self.handlers.insert(variant.clone(), handler).is_some() {
            self.duplicates.push(variant);
        }
        self
    }

    pub fn with_catch_all(mut self, catch_all: CatchAll<'a, R, C>) -> Self {
        self.catch_all = Some(catch_all);
        self
    }

    /// Register a handler that also receives the dispatch context.
    pub fn on_with(self, variant: impl Into<String>, f: impl Fn(P, C) -> R + 'a) -> Self {
        self.with_handler(variant, Handler::Bound(Rc::new(f)))
    }

    /// Set a catch-all that receives the dispatch context.
    pub fn otherwise_with(self, f: impl Fn(C) -> R + 'a) -> Self {
        self.with_catch_all(CatchAll::Bound(Rc::new(f)))
    }

    /// Whether a handler is registered for `variant`, bound or not.
    pub fn handles(&self, variant: &str) -> bool {
        self.handlers.contains_key(variant)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Handler<'a, P, R, C>)> + '_ {
        self.handlers
            .iter()
            .map(|(variant, handler)| (variant.as_str(), handler))
    }

    pub fn catch_all(&self) -> Option<&CatchAll<'a, R, C>> {
        self.catch_all.as_ref()
    }

    pub(crate) fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    /// Run the handler for `name`, or the catch-all when `name` is absent or
    /// has no key in the table.
    fn dispatch(
        &self,
        name: Option<&str>,
        discriminant: &str,
        payload: P,
        context: C,
    ) -> UnionResult<R> {
        if let Some((variant, handler)) = name.and_then(|name| self.handlers.get_key_value(name)) {
            trace!("dispatching {discriminant:?} to its handler");
            return match handler {
                Handler::Bound(f) => Ok(f(payload, context)),
                Handler::Unresolved(reference) => Err(UnionError::HandlerNotCallable {
                    variant: variant.clone(),
                    reference: reference.clone(),
                }),
            };
        }

        trace!("dispatching {discriminant:?} to the catch-all");
        match &self.catch_all {
            Some(CatchAll::Bound(f)) => Ok(f(context)),
            Some(CatchAll::Unresolved(reference)) => Err(UnionError::CatchAllNotCallable {
                reference: reference.clone(),
            }),
            None => Err(UnionError::MissingCatchAll {
                missing: vec![name.unwrap_or(discriminant).to_string()],
            }),
        }
    }
}

impl<'a, P, R> HandlerTable<'a, P, R> {
    /// An empty table whose payload type is taken from `tag`.
    pub fn for_tag(_: &Tag<P>) -> Self {
        Self::new()
    }

    /// Register a handler for `variant`.
    pub fn on(self, variant: impl Into<String>, f: impl Fn(P) -> R + 'a) -> Self {
        self.on_with(variant, move |payload, ()| f(payload))
    }

    /// Set the catch-all.
    pub fn otherwise(self, f: impl Fn() -> R + 'a) -> Self {
        self.otherwise_with(move |()| f())
    }
}

impl<P, R, C> Default for HandlerTable<'_, P, R, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, R, C> Clone for HandlerTable<'_, P, R, C> {
    fn clone(&self) -> Self {
        HandlerTable {
            handlers: self.handlers.clone(),
            catch_all: self.catch_all.clone(),
            duplicates: self.duplicates.clone(),
        }
    }
}

impl<P, R, C> fmt::Debug for HandlerTable<'_, P, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("handlers", &self.handlers)
            .field("catch_all", &self.catch_all)
            .finish()
    }
}

/// Find the variant name of `discriminant` for dispatch. Checked unions fail
/// on non-members; unchecked ones hand back `None` so the catch-all runs.
fn resolve<'d>(desc: &Descriptor, discriminant: &'d str) -> UnionResult<Option<&'d str>> {
    if desc.validation.is_checked() {
        return validate_membership(discriminant, &desc.codec, &desc.names).map(Some);
    }

    let name = desc.codec.strip_prefix(discriminant);
    if name.is_none_or(|name| !desc.names.contains(name)) {
        warn!("{discriminant:?} is not a variant of {}; falling back to the catch-all", desc.id);
    }
    Ok(name)
}

impl Methods {
    /// Dispatch `tag` to the handler registered for its variant.
    ///
    /// Checked unions first verify that the tag belongs to the union and
    /// that the table is exhaustive, so no handler runs unless both hold.
    pub fn match_tag<P, R>(
        &self,
        tag: Tag<P>,
        table: &HandlerTable<'_, P, R>,
    ) -> UnionResult<R> {
        let (discriminant, payload) = tag.into_parts();
        let name = resolve(&self.desc, &discriminant)?;
        if self.desc.validation.is_checked() {
            validate_handler_table(table, &self.desc.names)?;
        }
        table.dispatch(name, &discriminant, payload, ())
    }

    /// Validate `table` once and return a reusable [`Matcher`] over it.
    pub fn matcher<'a, P, R, C>(
        &self,
        table: HandlerTable<'a, P, R, C>,
    ) -> UnionResult<Matcher<'a, P, R, C>> {
        if self.desc.validation.is_checked() {
            validate_handler_table(&table, &self.desc.names)?;
        }
        Ok(Matcher {
            desc: self.desc.clone(),
            table,
        })
    }

    /// Whether `tag` is of the variant built by `ctor`.
    ///
    /// Fails with [`UnionError::TypeNotProvided`] when `ctor` is `None`, which
    /// lets a failed constructor lookup be passed straight through.
    pub fn matches<'c, P>(
        &self,
        tag: &Tag<P>,
        ctor: impl Into<Option<&'c Constructor>>,
    ) -> UnionResult<bool> {
        let ctor = ctor.into().ok_or(UnionError::TypeNotProvided)?;
        if !self.desc.validation.is_checked() {
            return Ok(ctor.discriminant() == tag.discriminant());
        }

        let name = validate_membership(tag.discriminant(), &self.desc.codec, &self.desc.names)?;
        let variant = self
            .desc
            .constructors
            .values()
            .find(|&candidate| candidate == ctor)
            .ok_or_else(|| UnionError::TypeNotOfUnion {
                name: ctor.name().to_string(),
            })?;
        Ok(variant.name() == name)
    }
}

/// A validated handler table bound to one union, ready to be called many times.
pub struct Matcher<'a, P, R, C = ()> {
    desc: Arc<Descriptor>,
    table: HandlerTable<'a, P, R, C>,
}

impl<'a, P, R, C> Matcher<'a, P, R, C> {
    /// Dispatch `tag`, forwarding `context` to the handler or catch-all.
    pub fn call(&self, tag: Tag<P>, context: C) -> UnionResult<R> {
        let (discriminant, payload) = tag.into_parts();
        let name = resolve(&self.desc, &discriminant)?;
        self.table.dispatch(name, &discriminant, payload, context)
    }

    pub fn into_fn(self) -> impl Fn(Tag<P>, C) -> UnionResult<R> + 'a
    where
        P: 'a,
        R: 'a,
        C: 'a,
    {
        move |tag, context| self.call(tag, context)
    }
}

impl<P, R, C> fmt::Debug for Matcher<'_, P, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("union", &self.desc.id)
            .field("table", &self.table)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Union, UnionOptions, Validation};

    fn declare(names: &[&str], validation: Validation) -> Union {
        let options = UnionOptions::new().with_validation(validation);
        Union::with_options(names.iter().copied(), options).unwrap()
    }

    fn checked(names: &[&str]) -> Union {
        declare(names, Validation::Checked)
    }

    fn unchecked(names: &[&str]) -> Union {
        declare(names, Validation::Unchecked)
    }

    #[test]
    fn covered_variant_fires_its_handler() {
        let u = checked(&["Inc", "Dec"]);
        let table = HandlerTable::new()
            .on("Inc", |n: i32| n + 1)
            .on("Dec", |n: i32| n - 1);

        assert_eq!(u.match_tag(u.ctor("Inc").unwrap().tag(1), &table).unwrap(), 2);
        assert_eq!(u.match_tag(u.ctor("Dec").unwrap().tag(1), &table).unwrap(), 0);
    }

    #[test]
    fn empty_table_always_uses_catch_all() {
        let u = checked(&["A", "B", "C"]);
        let table = HandlerTable::<(), &str>::new().otherwise(|| "fallback");
        for ctor in u.variants().iter() {
            assert_eq!(u.match_tag(ctor.unit(), &table).unwrap(), "fallback");
        }
    }

    #[test]
    fn uncovered_variant_uses_catch_all() {
        let u = checked(&["Inc", "Dec"]);
        let table = HandlerTable::new()
            .on("Inc", |n: i32| n + 1)
            .otherwise(|| -1);
        assert_eq!(u.match_tag(u.ctor("Dec").unwrap().tag(5), &table).unwrap(), -1);
    }

    #[test]
    fn no_handler_runs_when_validation_fails() {
        let u = checked(&["Inc", "Dec"]);
        let calls = Cell::new(0);
        let table = HandlerTable::new().on("Inc", |_: i32| calls.set(calls.get() + 1));

        let err = u.match_tag(u.ctor("Inc").unwrap().tag(1), &table).unwrap_err();
        assert!(matches!(
            err,
            UnionError::MissingCatchAll { ref missing } if missing == &["Dec"]
        ));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn foreign_tag_is_rejected() {
        let u = checked(&["Inc"]);
        let table = HandlerTable::new().on("Inc", |n: i32| n);
        let err = u.match_tag(Tag::new("Dec", 1), &table).unwrap_err();
        assert!(matches!(err, UnionError::NotAMember { ref name } if name == "Dec"));
    }

    #[test]
    fn empty_variant_name_is_a_real_key() {
        let safe = crate::SafeUnion::with_options(
            ["", "match"],
            UnionOptions::new().with_validation(Validation::Checked),
        )
        .unwrap();
        let table = HandlerTable::new()
            .on("", |s: &str| format!("empty {s}"))
            .otherwise(|| "other".to_string());

        let tag = safe.variants.get("").unwrap().tag("x");
        assert_eq!(safe.methods.match_tag(tag, &table).unwrap(), "empty x");

        let tag = safe.variants.get("match").unwrap().tag("y");
        assert_eq!(safe.methods.match_tag(tag, &table).unwrap(), "other");
    }

    #[test]
    fn present_key_never_falls_through() {
        let u = unchecked(&["Inc", "Dec"]);
        let table = HandlerTable::<i32, i32>::new()
            .with_handler("Inc", Handler::Unresolved("inc".into()))
            .otherwise(|| 0);

        let err = u.match_tag(u.ctor("Inc").unwrap().tag(1), &table).unwrap_err();
        assert!(matches!(
            err,
            UnionError::HandlerNotCallable { ref variant, .. } if variant == "Inc"
        ));
        assert_eq!(u.match_tag(u.ctor("Dec").unwrap().tag(1), &table).unwrap(), 0);
    }

    #[test]
    fn matcher_forwards_context() {
        let u = checked(&["Inc", "Dec", "Reset"]);
        let m = u
            .matcher(
                HandlerTable::new()
                    .on_with("Inc", |n: i64, memo: i64| memo + n)
                    .on_with("Dec", |n: i64, memo: i64| memo - n)
                    .otherwise_with(|memo: i64| memo * memo),
            )
            .unwrap();

        assert_eq!(m.call(u.ctor("Inc").unwrap().tag(5), 1).unwrap(), 6);
        assert_eq!(m.call(u.ctor("Dec").unwrap().tag(2), 5).unwrap(), 3);
        assert_eq!(m.call(u.ctor("Reset").unwrap().tag(0), 4).unwrap(), 16);
    }

    #[test]
    fn matcher_validates_once_and_checks_membership_per_call() {
        let u = checked(&["Inc", "Dec"]);
        let err = u
            .matcher(HandlerTable::new().on("Inc", |n: i32| n))
            .unwrap_err();
        assert!(matches!(err, UnionError::MissingCatchAll { .. }));

        let m = u
            .matcher(HandlerTable::new().on("Inc", |n: i32| n).otherwise(|| 0))
            .unwrap();
        assert!(matches!(
            m.call(Tag::new("Other", 1), ()),
            Err(UnionError::NotAMember { .. })
        ));
    }

    #[test]
    fn matcher_as_fold() {
        let u = checked(&["Inc", "Dec"]);
        let step = u
            .matcher(
                HandlerTable::new()
                    .on_with("Inc", |n: i64, total: i64| total + n)
                    .on_with("Dec", |n: i64, total: i64| total - n),
            )
            .unwrap()
            .into_fn();

        let (inc, dec) = (u.ctor("Inc").unwrap(), u.ctor("Dec").unwrap());
        let events = [inc.tag(3), inc.tag(4), dec.tag(2)];
        let total = events
            .into_iter()
            .try_fold(0, |total, event| step(event, total))
            .unwrap();
        assert_eq!(total, 5);
    }

    #[test]
    fn unchecked_falls_back_to_catch_all() {
        let u = unchecked(&["Inc", "Dec"]);
        let m = u
            .matcher(
                HandlerTable::new()
                    .on_with("Inc", |n: i64, memo: i64| memo + n)
                    .on_with("Dec", |n: i64, memo: i64| memo - n)
                    .otherwise_with(|memo: i64| memo * memo),
            )
            .unwrap();

        assert_eq!(m.call(Tag::new("Reset", 0), 3).unwrap(), 9);
        assert_eq!(m.call(Tag::new("other/Inc", 0), 2).unwrap(), 4);
    }

    #[test]
    fn unchecked_without_catch_all_reports_discriminant() {
        let u = unchecked(&["Inc"]);
        let table = HandlerTable::new().on("Inc", |n: i32| n);
        let err = u.match_tag(Tag::new("Reset", 0), &table).unwrap_err();
        assert!(matches!(
            err,
            UnionError::MissingCatchAll { ref missing } if missing == &["Reset"]
        ));
    }

    #[test]
    fn matches_compares_variant() {
        let u = checked(&["Inc", "Dec"]);
        let tag = u.ctor("Inc").unwrap().tag(1);

        assert!(u.matches(&tag, u.ctor("Inc")).unwrap());
        assert!(!u.matches(&tag, u.ctor("Dec")).unwrap());
        assert!(matches!(
            u.matches(&tag, u.ctor("Nope")),
            Err(UnionError::TypeNotProvided)
        ));

        let other = checked(&["Inc"]);
        let err = u.matches(&tag, other.ctor("Inc")).unwrap_err();
        assert!(matches!(err, UnionError::TypeNotOfUnion { ref name } if name == "Inc"));
    }

    #[test]
    fn matches_unchecked_compares_discriminants() {
        let u = unchecked(&["Inc"]);
        assert!(u.matches(&Tag::new("Inc", ()), u.ctor("Inc")).unwrap());
        assert!(!u.matches(&Tag::new("Dec", ()), u.ctor("Inc")).unwrap());
        assert!(matches!(
            u.matches(&Tag::new("Inc", ()), None::<&Constructor>),
            Err(UnionError::TypeNotProvided)
        ));
    }
}
