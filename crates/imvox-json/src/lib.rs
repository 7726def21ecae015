//! imvox-json - Typed wrappers over raw JSON for viewer state trees
//!
//! This crate provides the machinery the imvox state model is built on:
//!
//! - **FromJson/ToJson**: eager, validating decode and lossless encode
//! - **AccessMode**: read-only trees that reject every mutation
//! - **JsonObject**: a decode cursor that preserves unknown keys verbatim
//! - **TypedList/TypedMap/TypedSet**: order-preserving validated containers
//! - **StateError**: the five failure kinds shared by the whole model
//!
//! Raw JSON is `serde_json::Value` throughout, with object key order
//! preserved so decoded trees re-encode the way they arrived.

pub mod error;
pub mod list;
pub mod map;
pub mod object;
pub mod set;
pub mod value;

pub use error::{StateError, StateResult};
pub use list::TypedList;
pub use map::{JsonKey, TypedMap};
pub use object::{emit, emit_field, emit_nonempty, extend_extra, JsonObject};
pub use set::TypedSet;
pub use value::{
    deep_mutable_copy, parse_uint64, AccessMode, BoolOrString, EmptyWithMode, FromJson,
    NumberOrString, ToJson,
};
