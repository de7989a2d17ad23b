//! Method metadata records.
//!
//! A [`MethodMetadata`] is what a metadata provider hands over for a target
//! function: declaring type, kind, calling convention, generic parameters,
//! ordered parameters and return type. Records can be built in code with
//! [`MethodBuilder`] or loaded from a JSON document through
//! [`crate::provider::JsonMetadataProvider`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use detour_types::{open_type, well_known, GenericParam, TypeDef, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Static,
    Instance,
    Constructor,
    /// Type initializer; runs without a receiver.
    StaticConstructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallingConvention {
    #[default]
    Managed,
    /// Foreign function imported from a native library.
    PlatformInvoke,
}

#[derive(Debug, Clone)]
pub struct ParameterInfo {
    pub name: String,
    /// Declared type; by-reference parameters carry a `TypeRef::ByRef`.
    pub ty: TypeRef,
    /// The `out` modifier. Only meaningful on by-reference parameters.
    pub is_out: bool,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            is_out: false,
        }
    }

    /// A by-reference (`ref`) parameter of the given element type.
    pub fn by_ref(name: impl Into<String>, element: TypeRef) -> Self {
        Self::new(name, TypeRef::by_ref(element))
    }

    /// An output (`out`) parameter of the given element type.
    pub fn out(name: impl Into<String>, element: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty: TypeRef::by_ref(element),
            is_out: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodMetadata {
    pub name: String,
    pub declaring_type: Option<Arc<TypeDef>>,
    pub kind: MethodKind,
    pub calling_convention: CallingConvention,
    pub generic_params: Vec<Arc<GenericParam>>,
    pub parameters: Vec<ParameterInfo>,
    pub return_type: TypeRef,
}

impl MethodMetadata {
    pub fn builder(name: impl Into<String>) -> MethodBuilder {
        MethodBuilder::new(name)
    }

    /// `Ns.Type.Method`, or just the method name without a declaring type.
    pub fn full_name(&self) -> String {
        match &self.declaring_type {
            Some(def) => format!("{}.{}", def.full_name(), self.name),
            None => self.name.clone(),
        }
    }

    /// Open form of the declaring type, e.g. ``System.Nullable`1[T]``.
    pub fn declaring_open_type(&self) -> Option<TypeRef> {
        self.declaring_type.as_ref().map(open_type)
    }

    pub fn is_generic_method(&self) -> bool {
        !self.generic_params.is_empty()
    }

    pub fn is_foreign(&self) -> bool {
        self.calling_convention == CallingConvention::PlatformInvoke
    }

    pub fn type_generic_params(&self) -> &[Arc<GenericParam>] {
        self.declaring_type
            .as_deref()
            .map(TypeDef::generic_params)
            .unwrap_or(&[])
    }
}

/// Incremental construction of a [`MethodMetadata`].
///
/// ```
/// use detour_extractor::MethodMetadata;
/// use detour_types::well_known;
///
/// let mut b = MethodMetadata::builder("GetProperty");
/// let t = b.generic_param("T");
/// let method = b
///     .param("key", well_known::string())
///     .param("defaultValue", t.clone())
///     .returns(t)
///     .build();
/// assert!(method.is_generic_method());
/// ```
#[derive(Debug)]
pub struct MethodBuilder {
    method: MethodMetadata,
}

impl MethodBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            method: MethodMetadata {
                name: name.into(),
                declaring_type: None,
                kind: MethodKind::Static,
                calling_convention: CallingConvention::Managed,
                generic_params: Vec::new(),
                parameters: Vec::new(),
                return_type: well_known::void(),
            },
        }
    }

    pub fn declared_by(mut self, def: &Arc<TypeDef>) -> Self {
        self.method.declaring_type = Some(Arc::clone(def));
        self
    }

    pub fn kind(mut self, kind: MethodKind) -> Self {
        self.method.kind = kind;
        self
    }

    pub fn instance(self) -> Self {
        self.kind(MethodKind::Instance)
    }

    pub fn constructor(self) -> Self {
        self.kind(MethodKind::Constructor)
    }

    pub fn platform_invoke(mut self) -> Self {
        self.method.calling_convention = CallingConvention::PlatformInvoke;
        self
    }

    /// Declare the next method-level generic parameter and return a
    /// reference to it for use in parameter and return types.
    pub fn generic_param(&mut self, name: impl Into<String>) -> TypeRef {
        let param = GenericParam::method_param(name, self.method.generic_params.len());
        let ty = TypeRef::param(&param);
        self.method.generic_params.push(param);
        ty
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.method.parameters.push(ParameterInfo::new(name, ty));
        self
    }

    pub fn ref_param(mut self, name: impl Into<String>, element: TypeRef) -> Self {
        self.method.parameters.push(ParameterInfo::by_ref(name, element));
        self
    }

    pub fn out_param(mut self, name: impl Into<String>, element: TypeRef) -> Self {
        self.method.parameters.push(ParameterInfo::out(name, element));
        self
    }

    pub fn push_param(mut self, param: ParameterInfo) -> Self {
        self.method.parameters.push(param);
        self
    }

    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.method.return_type = ty;
        self
    }

    pub fn build(self) -> MethodMetadata {
        self.method
    }
}
