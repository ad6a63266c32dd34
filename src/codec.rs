//! Prefix handling for discriminants. This is the only place that knows about
//! a union's namespace prefix.

use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagCodec {
    prefix: Arc<str>,
}

impl TagCodec {
    pub fn new(prefix: impl Into<Arc<str>>) -> Self {
        TagCodec { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Turn a variant name into the discriminant stored on a tag.
    pub fn apply_prefix(&self, name: &str) -> String {
        let mut discriminant = String::with_capacity(self.prefix.len() + name.len());
        discriminant.push_str(&self.prefix);
        discriminant.push_str(name);
        discriminant
    }

    /// Recover the variant name from a discriminant, or `None` if the
    /// discriminant is outside this union's namespace.
    ///
    /// An empty name is a valid result and is distinct from `None`.
    pub fn strip_prefix<'d>(&self, discriminant: &'d str) -> Option<&'d str> {
        discriminant.strip_prefix(&*self.prefix)
    }
}
