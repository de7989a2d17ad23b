//! Metadata providers.
//!
//! The [`MetadataProvider`] trait is the seam between the indirection core
//! and whatever reads compiled binaries. [`JsonMetadataProvider`] normalizes
//! a [`MetadataDocumentJson`] into [`MethodMetadata`] records.
//!
//! # Example
//!
//! ```
//! use detour_extractor::{JsonMetadataProvider, MetadataProvider};
//!
//! let json = r#"{
//!     "schema_version": 1,
//!     "methods": [{
//!         "alias": "NowGet",
//!         "name": "get_Now",
//!         "declaring_type": "System.DateTime",
//!         "kind": "static",
//!         "returns": "System.DateTime"
//!     }]
//! }"#;
//! let provider = JsonMetadataProvider::from_json_str(json).unwrap();
//! assert!(provider.method("NowGet").is_some());
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use detour_types::{
    parse_type, FieldDef, GenericParam, GenericScope, TypeDef, TypeKind, TypeUniverse,
};

use crate::metadata::{MethodMetadata, ParameterInfo};
use crate::types::{MetadataDocumentJson, MethodJson, TypeDefJson, TypeKindJson, SCHEMA_VERSION};

/// Source of target method metadata.
pub trait MetadataProvider {
    /// Look up a method by alias (or full name when no alias was given).
    fn method(&self, key: &str) -> Option<&MethodMetadata>;

    /// All known methods in key order.
    fn methods(&self) -> Vec<(&str, &MethodMetadata)>;
}

/// Metadata loaded from a JSON document.
#[derive(Debug, Clone)]
pub struct JsonMetadataProvider {
    universe: TypeUniverse,
    methods: BTreeMap<String, MethodMetadata>,
}

impl JsonMetadataProvider {
    pub fn from_document(doc: MetadataDocumentJson) -> Result<Self> {
        if doc.schema_version != SCHEMA_VERSION {
            return Err(anyhow!(
                "unsupported metadata schema version {} (expected {})",
                doc.schema_version,
                SCHEMA_VERSION
            ));
        }

        let mut universe = TypeUniverse::with_system_types();
        for ty in &doc.types {
            let def = type_def_from_json(ty, &universe)
                .with_context(|| format!("while loading type {}", ty.name))?;
            universe.register(def)?;
        }

        let mut methods = BTreeMap::new();
        for m in &doc.methods {
            let method = method_from_json(m, &universe)
                .with_context(|| format!("while loading method {}", m.name))?;
            let key = m.alias.clone().unwrap_or_else(|| method.full_name());
            if methods.insert(key.clone(), method).is_some() {
                return Err(anyhow!("duplicate method key {}", key));
            }
        }

        debug!(
            types = universe.len(),
            methods = methods.len(),
            "loaded metadata document"
        );
        Ok(Self { universe, methods })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: MetadataDocumentJson =
            serde_json::from_str(json).context("invalid metadata document")?;
        Self::from_document(doc)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn universe(&self) -> &TypeUniverse {
        &self.universe
    }
}

impl MetadataProvider for JsonMetadataProvider {
    fn method(&self, key: &str) -> Option<&MethodMetadata> {
        self.methods.get(key)
    }

    fn methods(&self) -> Vec<(&str, &MethodMetadata)> {
        self.methods.iter().map(|(k, m)| (k.as_str(), m)).collect()
    }
}

fn type_def_from_json(ty: &TypeDefJson, universe: &TypeUniverse) -> Result<TypeDef> {
    let kind = match ty.kind {
        TypeKindJson::Class => TypeKind::Class,
        TypeKindJson::Interface => TypeKind::Interface,
        TypeKindJson::Delegate => TypeKind::Delegate,
        TypeKindJson::Struct => TypeKind::Struct,
        TypeKindJson::Enum => TypeKind::Enum,
    };
    let mut def = TypeDef::new(ty.namespace.clone(), ty.name.clone(), kind)
        .with_generic_params(ty.generic_params.iter().cloned());
    if let Some(outer) = &ty.declaring_type {
        let outer = universe
            .get(outer)
            .ok_or_else(|| anyhow!("unknown declaring type {}", outer))?;
        def = def.nested_in(outer);
    }

    let fields = {
        let scope = GenericScope::new(def.generic_params(), &[]);
        ty.fields
            .iter()
            .map(|f| {
                Ok(FieldDef {
                    name: f.name.clone(),
                    ty: parse_type(&f.r#type, universe, &scope)
                        .with_context(|| format!("field {}", f.name))?,
                })
            })
            .collect::<Result<Vec<_>>>()?
    };
    Ok(def.with_fields_from(|_| fields))
}

fn method_from_json(m: &MethodJson, universe: &TypeUniverse) -> Result<MethodMetadata> {
    let declaring_type = m
        .declaring_type
        .as_ref()
        .map(|name| {
            universe
                .get(name)
                .ok_or_else(|| anyhow!("unknown declaring type {}", name))
        })
        .transpose()?;

    let generic_params: Vec<Arc<GenericParam>> = m
        .generic_params
        .iter()
        .enumerate()
        .map(|(i, n)| GenericParam::method_param(n.clone(), i))
        .collect();

    let type_params = declaring_type
        .as_deref()
        .map(TypeDef::generic_params)
        .unwrap_or(&[]);
    let scope = GenericScope::new(type_params, &generic_params);

    let parameters = m
        .params
        .iter()
        .map(|p| {
            let ty = parse_type(&p.r#type, universe, &scope)
                .with_context(|| format!("parameter {}", p.name))?;
            Ok(ParameterInfo {
                name: p.name.clone(),
                ty,
                is_out: p.out,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let return_type = parse_type(&m.returns, universe, &scope).context("return type")?;

    Ok(MethodMetadata {
        name: m.name.clone(),
        declaring_type,
        kind: m.kind,
        calling_convention: m.calling_convention,
        generic_params,
        parameters,
        return_type,
    })
}
