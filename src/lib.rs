#![doc = include_str!("../README.md")]
#![deny(future_incompatible)]
#![deny(rust_2018_idioms)]

// Lets `match_tag!` expansions in unit tests name this crate.
#[cfg(test)]
extern crate self as tunion;

mod codec;
pub mod error;
mod macros;
pub mod matcher;
pub mod registry;
pub mod tag;
pub mod union;
pub mod validate;

pub use tunion_macros::match_tag;

pub use self::{
    codec::TagCodec,
    error::{UnionError, UnionResult},
    matcher::{CatchAll, Handler, HandlerTable, Matcher},
    registry::{Registry, Routes},
    tag::Tag,
    union::{
        Constructor, Member, Method, Methods, SafeUnion, Union, UnionId, UnionOptions, Variants,
    },
    validate::{Validation, RESERVED_NAMES},
};
