//! Handler tables that arrive as data.
//!
//! A [`Routes`] value names, for each variant, a function registered in a
//! [`Registry`]. Resolving routes against a registry yields a
//! [`HandlerTable`] in which every name that was not registered stays
//! [`Handler::Unresolved`], so the usual table validation reports it.

use std::{fmt, rc::Rc};

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::matcher::{CatchAll, Handler, HandlerTable};

/// A serialized handler table: variant name to function name, plus an
/// optional catch-all function name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Routes {
    #[serde(default)]
    pub handlers: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catch_all: Option<String>,
}

/// Named functions that routes can refer to.
pub struct Registry<'a, P, R, C = ()> {
    handlers: IndexMap<String, Rc<dyn Fn(P, C) -> R + 'a>>,
    fallbacks: IndexMap<String, Rc<dyn Fn(C) -> R + 'a>>,
}

impl<'a, P, R, C> Registry<'a, P, R, C> {
    pub fn new() -> Self {
        Registry {
            handlers: IndexMap::new(),
            fallbacks: IndexMap::new(),
        }
    }

    /// Register a handler that receives the payload and the dispatch context.
    pub fn register_with(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(P, C) -> R + 'a,
    ) -> &mut Self {
        self.handlers.insert(name.into(), Rc::new(f));
        self
    }

    /// Register a catch-all that receives the dispatch context.
    pub fn register_fallback_with(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(C) -> R + 'a,
    ) -> &mut Self {
        self.fallbacks.insert(name.into(), Rc::new(f));
        self
    }

    pub fn handler(&self, name: &str) -> Option<Handler<'a, P, R, C>> {
        self.handlers.get(name).map(|f| Handler::Bound(f.clone()))
    }

    pub fn fallback(&self, name: &str) -> Option<CatchAll<'a, R, C>> {
        self.fallbacks.get(name).map(|f| CatchAll::Bound(f.clone()))
    }
}

impl<'a, P, R> Registry<'a, P, R> {
    pub fn register(&mut self, name: impl Into<String>, f: impl Fn(P) -> R + 'a) -> &mut Self {
        self.register_with(name, move |payload, ()| f(payload))
    }

    pub fn register_fallback(
        &mut self,
        name: impl Into<String>,
        f: impl Fn() -> R + 'a,
    ) -> &mut Self {
        self.register_fallback_with(name, move |()| f())
    }
}

impl<P, R, C> Default for Registry<'_, P, R, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, R, C> fmt::Debug for Registry<'_, P, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("fallbacks", &self.fallbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a, P, R, C> HandlerTable<'a, P, R, C> {
    /// Build a handler table from routes, looking each function up in
    /// `registry`.
    pub fn from_routes(routes: &Routes, registry: &Registry<'a, P, R, C>) -> Self {
        let mut table = HandlerTable::new();
        for (variant, reference) in &routes.handlers {
            let handler = registry
                .handler(reference)
                .unwrap_or_else(|| Handler::Unresolved(reference.clone()));
            table = table.with_handler(variant.as_str(), handler);
        }

        if let Some(reference) = &routes.catch_all {
            let catch_all = registry
                .fallback(reference)
                .unwrap_or_else(|| CatchAll::Unresolved(reference.clone()));
            table = table.with_catch_all(catch_all);
        }

        debug!(
            "resolved routes for {} variants (catch-all: {})",
            routes.handlers.len(),
            routes.catch_all.is_some()
        );
        table
    }
}
