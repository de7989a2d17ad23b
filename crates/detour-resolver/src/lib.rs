//! Detour Resolver
//!
//! Picks the indirection delegate template for a target's signature shape.
//!
//! This crate provides:
//! - [`catalog`]: the closed, process-wide set of delegate templates
//! - [`resolver`]: [`DelegateResolver`], which instantiates a template with
//!   the target's types and fresh placeholders for open generic parameters
//!
//! # Example
//!
//! ```
//! use detour_extractor::MethodMetadata;
//! use detour_resolver::DelegateResolver;
//! use detour_types::well_known;
//!
//! let mut b = MethodMetadata::builder("GetProperty");
//! let t = b.generic_param("T");
//! let method = b
//!     .param("key", well_known::string())
//!     .param("defaultValue", t.clone())
//!     .returns(t)
//!     .build();
//!
//! let resolution = DelegateResolver::new().resolve_method(&method)?;
//! let delegate = resolution.delegate().expect("supported shape");
//! assert_eq!(
//!     delegate.to_string(),
//!     "Indirection.Delegates.IndirectionFunc`3[System.String,T,T]"
//! );
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod catalog;
pub mod resolver;

pub use catalog::{
    Catalog, CatalogEntry, DelegateFamily, ShapeKey, SlotMode, DELEGATES_NAMESPACE,
    MAX_BY_VALUE_PARAMS,
};
pub use resolver::{
    CloseError, DelegateResolver, InvokeParameter, InvokeSignature, Resolution, ResolvedDelegate,
};
