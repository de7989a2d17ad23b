//! Type references for indirection targets.
//!
//! A [`TypeRef`] describes a type the way runtime reflection prints it:
//! `System.Nullable`1[T]`, `System.Boolean&`, `List`1[D`1[Baz][]][,]`.
//!
//! ## Identity vs. form
//!
//! Two distinct notions of "the same type" coexist here:
//!
//! - **Identity** (`==`): generic parameters and placeholders compare by
//!   pointer identity. A [`Placeholder`] never equals the [`GenericParam`] it
//!   stands for, even when both print as `T`.
//! - **Form** ([`TypeRef::same_form`]): the printed representations match.
//!
//! The delegate resolver relies on this split: it builds instantiations whose
//! form matches the open construct while staying distinct from it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// =============================================================================
// Definitions
// =============================================================================

/// Built-in types with a fixed runtime representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Void,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    IntPtr,
    UIntPtr,
    Decimal,
    String,
    Object,
}

impl Primitive {
    pub const ALL: [Primitive; 18] = [
        Primitive::Void,
        Primitive::Boolean,
        Primitive::Char,
        Primitive::SByte,
        Primitive::Byte,
        Primitive::Int16,
        Primitive::UInt16,
        Primitive::Int32,
        Primitive::UInt32,
        Primitive::Int64,
        Primitive::UInt64,
        Primitive::Single,
        Primitive::Double,
        Primitive::IntPtr,
        Primitive::UIntPtr,
        Primitive::Decimal,
        Primitive::String,
        Primitive::Object,
    ];

    /// Simple name inside the `System` namespace.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Void => "Void",
            Primitive::Boolean => "Boolean",
            Primitive::Char => "Char",
            Primitive::SByte => "SByte",
            Primitive::Byte => "Byte",
            Primitive::Int16 => "Int16",
            Primitive::UInt16 => "UInt16",
            Primitive::Int32 => "Int32",
            Primitive::UInt32 => "UInt32",
            Primitive::Int64 => "Int64",
            Primitive::UInt64 => "UInt64",
            Primitive::Single => "Single",
            Primitive::Double => "Double",
            Primitive::IntPtr => "IntPtr",
            Primitive::UIntPtr => "UIntPtr",
            Primitive::Decimal => "Decimal",
            Primitive::String => "String",
            Primitive::Object => "Object",
        }
    }

    /// Source-language keyword for this primitive, if it has one.
    pub fn keyword(self) -> Option<&'static str> {
        let kw = match self {
            Primitive::Void => "void",
            Primitive::Boolean => "bool",
            Primitive::Char => "char",
            Primitive::SByte => "sbyte",
            Primitive::Byte => "byte",
            Primitive::Int16 => "short",
            Primitive::UInt16 => "ushort",
            Primitive::Int32 => "int",
            Primitive::UInt32 => "uint",
            Primitive::Int64 => "long",
            Primitive::UInt64 => "ulong",
            Primitive::Single => "float",
            Primitive::Double => "double",
            Primitive::Decimal => "decimal",
            Primitive::String => "string",
            Primitive::Object => "object",
            Primitive::IntPtr | Primitive::UIntPtr => return None,
        };
        Some(kw)
    }

    pub fn is_value_type(self) -> bool {
        !matches!(self, Primitive::String | Primitive::Object)
    }
}

/// Category of a type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Delegate,
    Struct,
    Enum,
    Primitive(Primitive),
}

impl TypeKind {
    /// Whether instances are copied on assignment (and thus need a
    /// by-reference receiver to observe mutation).
    pub fn is_value_type(self) -> bool {
        match self {
            TypeKind::Struct | TypeKind::Enum => true,
            TypeKind::Primitive(p) => p.is_value_type(),
            TypeKind::Class | TypeKind::Interface | TypeKind::Delegate => false,
        }
    }
}

/// Which construct declares a generic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericOwner {
    Type,
    Method,
}

impl fmt::Display for GenericOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericOwner::Type => write!(f, "type"),
            GenericOwner::Method => write!(f, "method"),
        }
    }
}

/// An open generic parameter declared by a type or a method.
///
/// Shared as `Arc`; two parameters are the same parameter only when they are
/// the same allocation.
#[derive(Debug)]
pub struct GenericParam {
    name: String,
    position: usize,
    owner: GenericOwner,
}

impl GenericParam {
    pub fn new(name: impl Into<String>, position: usize, owner: GenericOwner) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            position,
            owner,
        })
    }

    pub fn type_param(name: impl Into<String>, position: usize) -> Arc<Self> {
        Self::new(name, position, GenericOwner::Type)
    }

    pub fn method_param(name: impl Into<String>, position: usize) -> Arc<Self> {
        Self::new(name, position, GenericOwner::Method)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn owner(&self) -> GenericOwner {
        self.owner
    }
}

/// A stand-in for a generic parameter that has not been chosen yet.
///
/// Carries the name, position and owner of the parameter it replaces but is
/// a new allocation every time, so it is never identical to the original
/// parameter or to another placeholder.
#[derive(Debug)]
pub struct Placeholder {
    name: String,
    position: usize,
    owner: GenericOwner,
}

impl Placeholder {
    pub fn for_param(param: &GenericParam) -> Arc<Self> {
        Arc::new(Self {
            name: param.name.clone(),
            position: param.position,
            owner: param.owner,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn owner(&self) -> GenericOwner {
        self.owner
    }
}

/// A field of a struct or class definition.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
}

/// A named type definition.
#[derive(Debug)]
pub struct TypeDef {
    namespace: String,
    name: String,
    declaring: Option<Arc<TypeDef>>,
    kind: TypeKind,
    generic_params: Vec<Arc<GenericParam>>,
    fields: Vec<FieldDef>,
}

impl TypeDef {
    /// Start a definition. `name` is the simple name without arity suffix.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            declaring: None,
            kind,
            generic_params: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Declare type-level generic parameters, in order.
    pub fn with_generic_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let start = self.generic_params.len();
        self.generic_params.extend(
            names
                .into_iter()
                .enumerate()
                .map(|(i, n)| GenericParam::type_param(n, start + i)),
        );
        self
    }

    /// Make this a nested type of `outer`.
    pub fn nested_in(mut self, outer: Arc<TypeDef>) -> Self {
        self.declaring = Some(outer);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty,
        });
        self
    }

    /// Add fields whose types mention this definition's own generic parameters.
    pub fn with_fields_from<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&[Arc<GenericParam>]) -> Vec<FieldDef>,
    {
        let fields = build(&self.generic_params);
        self.fields.extend(fields);
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring(&self) -> Option<&Arc<TypeDef>> {
        self.declaring.as_ref()
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn generic_params(&self) -> &[Arc<GenericParam>] {
        &self.generic_params
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn arity(&self) -> usize {
        self.generic_params.len()
    }

    pub fn is_value_type(&self) -> bool {
        self.kind.is_value_type()
    }

    /// Name with arity suffix, e.g. ``Nullable`1``.
    pub fn metadata_name(&self) -> String {
        if self.generic_params.is_empty() {
            self.name.clone()
        } else {
            format!("{}`{}", self.name, self.generic_params.len())
        }
    }

    /// Fully qualified name, e.g. ``System.Nullable`1`` or ``Ns.Outer+Inner``.
    pub fn full_name(&self) -> String {
        match &self.declaring {
            Some(outer) => format!("{}+{}", outer.full_name(), self.metadata_name()),
            None if self.namespace.is_empty() => self.metadata_name(),
            None => format!("{}.{}", self.namespace, self.metadata_name()),
        }
    }
}

/// The open form of a definition: the definition applied to its own
/// generic parameters.
pub fn open_type(def: &Arc<TypeDef>) -> TypeRef {
    TypeRef::Named {
        def: Arc::clone(def),
        args: def
            .generic_params
            .iter()
            .map(|p| TypeRef::Param(Arc::clone(p)))
            .collect(),
    }
}

// =============================================================================
// Type references
// =============================================================================

/// A reference to a type, possibly still depending on generic parameters.
#[derive(Debug, Clone)]
pub enum TypeRef {
    /// A definition applied to type arguments (empty for non-generic types).
    Named {
        def: Arc<TypeDef>,
        args: Vec<TypeRef>,
    },
    /// An open generic parameter of a type or method.
    Param(Arc<GenericParam>),
    /// A resolver-made stand-in for a generic parameter.
    Placeholder(Arc<Placeholder>),
    Array {
        element: Box<TypeRef>,
        rank: u32,
    },
    ByRef(Box<TypeRef>),
    Pointer(Box<TypeRef>),
}

impl TypeRef {
    /// A non-generic named type.
    pub fn named(def: &Arc<TypeDef>) -> Self {
        TypeRef::Named {
            def: Arc::clone(def),
            args: Vec::new(),
        }
    }

    pub fn generic(def: &Arc<TypeDef>, args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            def: Arc::clone(def),
            args,
        }
    }

    pub fn param(param: &Arc<GenericParam>) -> Self {
        TypeRef::Param(Arc::clone(param))
    }

    pub fn placeholder(placeholder: &Arc<Placeholder>) -> Self {
        TypeRef::Placeholder(Arc::clone(placeholder))
    }

    pub fn array(element: TypeRef, rank: u32) -> Self {
        TypeRef::Array {
            element: Box::new(element),
            rank: rank.max(1),
        }
    }

    pub fn by_ref(element: TypeRef) -> Self {
        TypeRef::ByRef(Box::new(element))
    }

    pub fn pointer(element: TypeRef) -> Self {
        TypeRef::Pointer(Box::new(element))
    }

    pub fn definition(&self) -> Option<&Arc<TypeDef>> {
        match self {
            TypeRef::Named { def, .. } => Some(def),
            _ => None,
        }
    }

    pub fn generic_arguments(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            _ => &[],
        }
    }

    /// Element of an array, by-ref or pointer type.
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array { element, .. } | TypeRef::ByRef(element) | TypeRef::Pointer(element) => {
                Some(element)
            }
            _ => None,
        }
    }

    pub fn is_by_ref(&self) -> bool {
        matches!(self, TypeRef::ByRef(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(
            self,
            TypeRef::Named { def, .. } if def.kind() == TypeKind::Primitive(Primitive::Void)
        )
    }

    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            TypeRef::Named { def, .. } => match def.kind() {
                TypeKind::Primitive(p) => Some(p),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether the type is known to be a value type. Generic parameters and
    /// placeholders are unknown and report `false`.
    pub fn is_value_type(&self) -> bool {
        match self {
            TypeRef::Named { def, .. } => def.is_value_type(),
            TypeRef::Pointer(_) => true,
            _ => false,
        }
    }

    /// True when no generic parameter or placeholder occurs anywhere.
    pub fn is_closed(&self) -> bool {
        match self {
            TypeRef::Named { args, .. } => args.iter().all(TypeRef::is_closed),
            TypeRef::Param(_) | TypeRef::Placeholder(_) => false,
            TypeRef::Array { element, .. } | TypeRef::ByRef(element) | TypeRef::Pointer(element) => {
                element.is_closed()
            }
        }
    }

    /// Compare printed forms, ignoring parameter/placeholder identity.
    pub fn same_form(&self, other: &TypeRef) -> bool {
        self.to_string() == other.to_string()
    }

    /// Rebuild the type, replacing every parameter or placeholder for which
    /// `replace` returns `Some`.
    pub fn substitute<F>(&self, replace: &F) -> TypeRef
    where
        F: Fn(&TypeRef) -> Option<TypeRef>,
    {
        match self {
            TypeRef::Param(_) | TypeRef::Placeholder(_) => {
                replace(self).unwrap_or_else(|| self.clone())
            }
            TypeRef::Named { def, args } => TypeRef::Named {
                def: Arc::clone(def),
                args: args.iter().map(|a| a.substitute(replace)).collect(),
            },
            TypeRef::Array { element, rank } => TypeRef::Array {
                element: Box::new(element.substitute(replace)),
                rank: *rank,
            },
            TypeRef::ByRef(element) => TypeRef::ByRef(Box::new(element.substitute(replace))),
            TypeRef::Pointer(element) => TypeRef::Pointer(Box::new(element.substitute(replace))),
        }
    }

    /// Collect distinct placeholders in first-occurrence order.
    #[cfg(test)]
    fn collect_placeholders(&self, out: &mut Vec<Arc<Placeholder>>) {
        match self {
            TypeRef::Placeholder(p) => {
                if !out.iter().any(|q| Arc::ptr_eq(p, q)) {
                    out.push(Arc::clone(p));
                }
            }
            TypeRef::Param(_) => {}
            TypeRef::Named { args, .. } => {
                for a in args {
                    a.collect_placeholders(out);
                }
            }
            TypeRef::Array { element, .. } | TypeRef::ByRef(element) | TypeRef::Pointer(element) => {
                element.collect_placeholders(out)
            }
        }
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeRef::Named { def: a, args: x }, TypeRef::Named { def: b, args: y }) => {
                (Arc::ptr_eq(a, b) || (a.kind() == b.kind() && a.full_name() == b.full_name()))
                    && x == y
            }
            (TypeRef::Param(a), TypeRef::Param(b)) => Arc::ptr_eq(a, b),
            (TypeRef::Placeholder(a), TypeRef::Placeholder(b)) => Arc::ptr_eq(a, b),
            (
                TypeRef::Array {
                    element: a,
                    rank: r,
                },
                TypeRef::Array {
                    element: b,
                    rank: s,
                },
            ) => r == s && a == b,
            (TypeRef::ByRef(a), TypeRef::ByRef(b)) | (TypeRef::Pointer(a), TypeRef::Pointer(b)) => {
                a == b
            }
            _ => false,
        }
    }
}

impl Eq for TypeRef {}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { def, args } => {
                write!(f, "{}", def.full_name())?;
                if !args.is_empty() {
                    write!(f, "[")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{}", a)?;
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
            TypeRef::Param(p) => write!(f, "{}", p.name()),
            TypeRef::Placeholder(p) => write!(f, "{}", p.name()),
            TypeRef::Array { element, rank } => {
                write!(f, "{}[", element)?;
                for _ in 1..*rank {
                    write!(f, ",")?;
                }
                write!(f, "]")
            }
            TypeRef::ByRef(element) => write!(f, "{}&", element),
            TypeRef::Pointer(element) => write!(f, "{}*", element),
        }
    }
}
