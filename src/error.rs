//! Errors raised while declaring unions and dispatching on their tags.

use itertools::Itertools;
use thiserror::Error;

/// Every way a declaration or a dispatch can be rejected.
///
/// All of these are programmer errors: a malformed declaration, an incomplete
/// handler table, or a tag that does not belong to the union it is matched
/// against. None of them are transient.
#[derive(Debug, Error)]
pub enum UnionError {
    #[error("invalid union declaration: {reason}")]
    InvalidDeclaration { reason: String },

    #[error("duplicate variant \"{name}\" at index {index}; variant names must be unique")]
    DuplicateVariant { name: String, index: usize },

    #[error("variant name \"{name}\" is reserved on the union; declare a safe union to use it")]
    ReservedName { name: String },

    #[error("key \"{name}\" is not a variant of the union")]
    UnknownVariant { name: String },

    #[error("variant \"{variant}\" is handled more than once")]
    DuplicateHandler { variant: String },

    #[error("the handler for \"{variant}\" must be a function; `{reference}` is not registered")]
    HandlerNotCallable { variant: String, reference: String },

    #[error("all variants are handled; remove the unnecessary catch-all")]
    RedundantCatchAll,

    #[error("the catch-all must be a function; `{reference}` is not registered")]
    CatchAllNotCallable { reference: String },

    #[error(
        "not all variants are handled; add a catch-all. Missing variants: {}",
        .missing.iter().join(", ")
    )]
    MissingCatchAll { missing: Vec<String> },

    #[error("value must be a tag record, not {found}")]
    NotATag { found: String },

    #[error("the tag discriminant must be a string, not {found}")]
    DiscriminantNotString { found: String },

    #[error("discriminant \"{discriminant}\" does not start with the union prefix \"{prefix}\"")]
    DiscriminantNotPrefixed { discriminant: String, prefix: String },

    #[error("\"{name}\" is not a variant of the union")]
    NotAMember { name: String },

    #[error("a variant constructor must be provided")]
    TypeNotProvided,

    #[error("constructor \"{name}\" is not a variant of this union")]
    TypeNotOfUnion { name: String },

    #[error("cannot unwrap a \"{found}\" tag as \"{expected}\"")]
    WrongVariant { expected: String, found: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl UnionError {
    /// Whether this error says the tag does not belong to the union, either
    /// because its prefix is foreign or because its name is undeclared.
    pub fn is_membership(&self) -> bool {
        matches!(
            self,
            UnionError::NotATag { .. }
                | UnionError::DiscriminantNotString { .. }
                | UnionError::DiscriminantNotPrefixed { .. }
                | UnionError::NotAMember { .. }
        )
    }
}

pub type UnionResult<T> = Result<T, UnionError>;
