//! Shared types for the detour workspace.
//!
//! This crate provides the type model every other crate speaks:
//!
//! - [`type_ref`]: type definitions, generic parameters, placeholders and [`TypeRef`]
//! - [`value`]: dynamic runtime values and zero/default values per type
//! - [`well_known`]: the `System` types the rest of the workspace relies on
//! - [`universe`]: name-indexed definitions for metadata loading
//! - [`type_parsing`]: reflection-form type strings back into [`TypeRef`]s
//! - [`env_utils`]: environment overrides used by configuration

pub mod env_utils;
pub mod type_parsing;
pub mod type_ref;
pub mod universe;
pub mod value;
pub mod well_known;

pub use type_parsing::{parse_type, split_type_args, GenericScope};
pub use type_ref::{
    open_type, FieldDef, GenericOwner, GenericParam, Placeholder, Primitive, TypeDef, TypeKind,
    TypeRef,
};
pub use universe::TypeUniverse;
pub use value::{date_time_min, Value};
