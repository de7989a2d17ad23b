//! Detour Sandbox
//!
//! Signature-shaped function indirection for tests:
//!
//! - **Shape extraction**: reduce method metadata to a canonical signature shape
//! - **Delegate resolution**: pick and instantiate a template from a closed catalog
//! - **Default behaviors**: synthesize zero-returning bodies of any resolved shape
//! - **Scoped substitution**: switch between substituted and original execution
//!
//! See [`core`] for stubs and scopes and [`resolver`] for the delegate catalog.

#![allow(clippy::result_large_err)]

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

pub use detour_core as core;
pub use detour_extractor as extractor;
pub use detour_resolver as resolver;
pub use detour_types as types;

use detour_core::StubRegistry;
use detour_extractor::JsonMetadataProvider;

/// Commonly used items.
pub mod prelude {
    pub use detour_core::{
        Behavior, BehaviorKind, ContextMode, IndirectionConfig, IndirectionError,
        IndirectionStub, IndirectionsContext, StubRegistry,
    };
    pub use detour_extractor::{
        JsonMetadataProvider, MetadataProvider, MethodMetadata, ShapeDescriptor,
    };
    pub use detour_resolver::{DelegateResolver, Resolution, ResolvedDelegate};
    pub use detour_types::{well_known, Primitive, TypeRef, Value};
}

/// Load a JSON metadata document and build one stub per method in it.
pub fn load_registry(path: impl AsRef<Path>) -> Result<StubRegistry> {
    let path = path.as_ref();
    let provider = JsonMetadataProvider::from_file(path)?;
    let registry = StubRegistry::from_provider(&provider)
        .with_context(|| format!("failed to build stubs from {}", path.display()))?;
    info!(path = %path.display(), stubs = registry.len(), "loaded indirection stubs");
    Ok(registry)
}
