//! Detour Extractor
//!
//! Method metadata and shape extraction for indirection targets.
//!
//! This crate provides:
//! - [`metadata`]: method metadata records and a builder for them
//! - [`provider`]: the [`MetadataProvider`] seam and a JSON-backed implementation
//! - [`types`]: the JSON metadata document schema
//! - [`shape`]: [`ShapeDescriptor`] extraction, the canonical signature key
//!
//! # Example
//!
//! ```
//! use detour_extractor::{MethodMetadata, ReceiverMode, ShapeDescriptor};
//! use detour_types::well_known;
//!
//! let now = MethodMetadata::builder("get_Now")
//!     .declared_by(&well_known::DATE_TIME_DEF)
//!     .returns(well_known::date_time())
//!     .build();
//! let shape = ShapeDescriptor::extract(&now)?;
//! assert_eq!(shape.receiver(), ReceiverMode::None);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod metadata;
pub mod provider;
pub mod shape;
pub mod types;

pub use metadata::{CallingConvention, MethodBuilder, MethodKind, MethodMetadata, ParameterInfo};
pub use provider::{JsonMetadataProvider, MetadataProvider};
pub use shape::{
    GenericSlot, ParameterSlot, PassingMode, ReceiverMode, ReturnMode, ShapeDescriptor,
};
pub use types::{MetadataDocumentJson, SCHEMA_VERSION};
