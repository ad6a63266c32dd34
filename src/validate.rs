//! Declaration-time and call-time checks.
//!
//! Declarations are always checked. The per-dispatch checks (tag membership
//! and handler table completeness) only run for unions declared with
//! [`Validation::Checked`].

use std::{collections::HashSet, sync::Arc};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    codec::TagCodec,
    error::{UnionError, UnionResult},
    matcher::HandlerTable,
    tag::DISCRIMINANT_FIELD,
};

/// Names that a plain union cannot use as variants, since its constructors
/// share one namespace with the dispatch methods.
pub const RESERVED_NAMES: [&str; 3] = ["match", "matcher", "matches"];

/// Whether a union validates tags and handler tables on every dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validation {
    Checked,
    Unchecked,
}

impl Default for Validation {
    fn default() -> Self {
        if cfg!(feature = "unchecked") {
            Validation::Unchecked
        } else {
            Validation::Checked
        }
    }
}

impl Validation {
    pub fn is_checked(self) -> bool {
        self == Validation::Checked
    }
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Short description of a JSON value's kind for diagnostics.
pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Read a list of variant names out of a JSON value.
pub fn declaration_names(value: &Value) -> UnionResult<Vec<Arc<str>>> {
    let Value::Array(items) = value else {
        return Err(UnionError::InvalidDeclaration {
            reason: format!("variant names must be an array, not {}", describe(value)),
        });
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(name) => Ok(Arc::from(name.as_str())),
            other => Err(UnionError::InvalidDeclaration {
                reason: format!("name at index {index} must be a string, not {}", describe(other)),
            }),
        })
        .collect()
}

/// Check a list of variant names before a union is built from it.
///
/// Safe unions keep their constructors apart from the dispatch methods, so
/// reserved and empty names are only rejected for plain unions.
pub fn validate_declaration(names: &[Arc<str>], safe: bool) -> UnionResult<()> {
    let mut seen = HashSet::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        if !seen.insert(&**name) {
            return Err(UnionError::DuplicateVariant {
                name: name.to_string(),
                index,
            });
        }

        if safe {
            continue;
        }

        if name.is_empty() {
            return Err(UnionError::InvalidDeclaration {
                reason: format!("name at index {index} is empty; only safe unions allow it"),
            });
        }
        if is_reserved(name) {
            return Err(UnionError::ReservedName {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Check that a handler table is usable for a union with the given variants:
/// every key is a variant, every handler resolved, and the catch-all present
/// exactly when some variant is not covered.
pub fn validate_handler_table<P, R, C>(
    table: &HandlerTable<'_, P, R, C>,
    names: &IndexSet<Arc<str>>,
) -> UnionResult<()> {
    if let Some(variant) = table.duplicates().first() {
        return Err(UnionError::DuplicateHandler {
            variant: variant.clone(),
        });
    }

    let mut covered = 0;
    for (key, handler) in table.entries() {
        if !names.contains(key) {
            return Err(UnionError::UnknownVariant {
                name: key.to_string(),
            });
        }
        if let Some(reference) = handler.unresolved() {
            return Err(UnionError::HandlerNotCallable {
                variant: key.to_string(),
                reference: reference.to_string(),
            });
        }
        covered += 1;
    }

    match table.catch_all() {
        Some(catch_all) => {
            if covered == names.len() {
                return Err(UnionError::RedundantCatchAll);
            }
            if let Some(reference) = catch_all.unresolved() {
                return Err(UnionError::CatchAllNotCallable {
                    reference: reference.to_string(),
                });
            }
        }
        None if covered < names.len() => {
            let missing = names
                .iter()
                .filter(|name| !table.handles(name))
                .map(|name| name.to_string())
                .collect();
            return Err(UnionError::MissingCatchAll { missing });
        }
        None => {}
    }
    Ok(())
}

/// Check the shape of a raw wire record and return its discriminant.
pub fn validate_record(value: &Value) -> UnionResult<&str> {
    let Value::Object(fields) = value else {
        return Err(UnionError::NotATag {
            found: describe(value).to_string(),
        });
    };

    match fields.get(DISCRIMINANT_FIELD) {
        Some(Value::String(discriminant)) => Ok(discriminant),
        Some(other) => Err(UnionError::DiscriminantNotString {
            found: describe(other).to_string(),
        }),
        None => Err(UnionError::DiscriminantNotString {
            found: "a missing field".to_string(),
        }),
    }
}

/// Check that a discriminant belongs to the union and return its variant name.
pub fn validate_membership<'d>(
    discriminant: &'d str,
    codec: &TagCodec,
    names: &IndexSet<Arc<str>>,
) -> UnionResult<&'d str> {
    let name = codec.strip_prefix(discriminant).ok_or_else(|| {
        UnionError::DiscriminantNotPrefixed {
            discriminant: discriminant.to_string(),
            prefix: codec.prefix().to_string(),
        }
    })?;

    if names.contains(name) {
        Ok(name)
    } else {
        Err(UnionError::NotAMember {
            name: name.to_string(),
        })
    }
}
