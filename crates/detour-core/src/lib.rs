//! Detour Core
//!
//! Indirection stubs and the scoped context that gates them.
//!
//! This crate provides:
//! - [`stub`]: [`IndirectionStub`], the per-target holder of the active behavior
//! - [`behavior`]: caller-supplied and synthesized [`Behavior`]s
//! - [`context`]: [`IndirectionsContext`], the per-thread substitution mode stack
//! - [`registry`]: [`StubRegistry`], alias-keyed stubs cleared on scope teardown
//! - [`config`]: [`IndirectionConfig`]
//! - [`errors`]: [`IndirectionError`]
//!
//! # Example
//!
//! ```
//! use detour_core::{BehaviorKind, IndirectionStub, IndirectionsContext};
//! use detour_extractor::MethodMetadata;
//! use detour_types::{well_known, Value};
//!
//! let now = MethodMetadata::builder("get_Now")
//!     .declared_by(&well_known::DATE_TIME_DEF)
//!     .returns(well_known::date_time())
//!     .build();
//! let stub = IndirectionStub::new("NowGet", "Now", "", now)?;
//! stub.set_body(stub.create_delegate_of_default_behavior(BehaviorKind::DefaultValue, &[], &[])?)?;
//!
//! let scope = IndirectionsContext::new();
//! let result = stub.dispatch(&mut [], |_| Ok(Some(Value::Null)))?;
//! assert_eq!(result, Some(Value::DateTime(detour_types::date_time_min())));
//! scope.dispose()?;
//! # Ok::<(), detour_core::IndirectionError>(())
//! ```

pub mod behavior;
pub mod config;
pub mod context;
pub mod errors;
pub mod registry;
pub mod stub;

pub use behavior::{Behavior, BehaviorFn, BehaviorKind, BehaviorResult};
pub use config::IndirectionConfig;
pub use context::{ContextMode, IndirectionsContext, OriginalScope};
pub use errors::IndirectionError;
pub use registry::StubRegistry;
pub use stub::IndirectionStub;
