//! JSON metadata document schema.
//!
//! Type strings use the reflection form understood by
//! [`detour_types::parse_type`]. Types must be listed after the types their
//! fields and declaring types reference.

use serde::{Deserialize, Serialize};

use crate::metadata::{CallingConvention, MethodKind};

pub const SCHEMA_VERSION: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataDocumentJson {
    pub schema_version: u64,
    #[serde(default)]
    pub types: Vec<TypeDefJson>,
    #[serde(default)]
    pub methods: Vec<MethodJson>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKindJson {
    Class,
    Interface,
    Delegate,
    Struct,
    Enum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDefJson {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    pub kind: TypeKindJson,
    /// Full name of the enclosing type for nested types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaring_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_params: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldJson {
    pub name: String,
    pub r#type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodJson {
    /// Lookup key; defaults to the method's full name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaring_type: Option<String>,
    pub kind: MethodKind,
    #[serde(default)]
    pub calling_convention: CallingConvention,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_params: Vec<String>,
    #[serde(default)]
    pub params: Vec<ParamJson>,
    #[serde(default = "default_return")]
    pub returns: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamJson {
    pub name: String,
    pub r#type: String,
    #[serde(default)]
    pub out: bool,
}

fn default_return() -> String {
    "System.Void".to_string()
}
