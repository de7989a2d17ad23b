//! Shape resolution: from a [`ShapeDescriptor`] to an instantiated delegate
//! template.
//!
//! Type arguments are laid out in the order the target receives them: the
//! receiver type (if any), then each parameter's element type in declared
//! order, then the return type (if any). Every open generic parameter of the
//! target is replaced by a fresh [`Placeholder`], so the resolved delegate
//! prints like the open construct without being identical to it.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use rayon::prelude::*;
use tracing::debug;

use detour_extractor::{GenericSlot, MethodMetadata, ShapeDescriptor};
use detour_types::{GenericOwner, GenericParam, Placeholder, TypeDef, TypeRef};

use crate::catalog::{Catalog, CatalogEntry, DelegateFamily, ShapeKey, SlotMode};

/// Outcome of resolving a shape. `Unsupported` is a normal answer, not an error.
#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved(ResolvedDelegate),
    Unsupported(ShapeKey),
}

impl Resolution {
    pub fn is_supported(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn delegate(&self) -> Option<&ResolvedDelegate> {
        match self {
            Resolution::Resolved(d) => Some(d),
            Resolution::Unsupported(_) => None,
        }
    }

    pub fn into_delegate(self) -> Option<ResolvedDelegate> {
        match self {
            Resolution::Resolved(d) => Some(d),
            Resolution::Unsupported(_) => None,
        }
    }
}

/// Why a resolved delegate could not be closed over concrete arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseError {
    Count {
        owner: GenericOwner,
        expected: usize,
        actual: usize,
    },
    OpenArgument {
        owner: GenericOwner,
        position: usize,
        ty: String,
    },
}

impl fmt::Display for CloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseError::Count {
                owner,
                expected,
                actual,
            } => write!(
                f,
                "expected {} {} generic argument(s), got {}",
                expected, owner, actual
            ),
            CloseError::OpenArgument {
                owner,
                position,
                ty,
            } => write!(
                f,
                "{} generic argument {} ({}) is not a closed type",
                owner, position, ty
            ),
        }
    }
}

impl std::error::Error for CloseError {}

/// One argument of a delegate's invoke method.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeParameter {
    pub mode: SlotMode,
    /// Declared type; by-reference slots are wrapped in [`TypeRef::ByRef`].
    pub ty: TypeRef,
}

/// The invoke signature of a resolved delegate.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeSignature {
    pub parameters: Vec<InvokeParameter>,
    pub return_type: Option<TypeRef>,
}

impl fmt::Display for InvokeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, p) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match p.mode {
                SlotMode::Out => write!(f, "out ")?,
                SlotMode::ByRef | SlotMode::RefThis => write!(f, "ref ")?,
                SlotMode::ByValue => {}
            }
            write!(f, "{}", p.ty)?;
        }
        write!(f, ")")?;
        match &self.return_type {
            Some(ret) => write!(f, " -> {}", ret),
            None => write!(f, " -> System.Void"),
        }
    }
}

/// A catalog template instantiated for one target.
#[derive(Debug, Clone)]
pub struct ResolvedDelegate {
    entry: CatalogEntry,
    type_args: Vec<TypeRef>,
    /// Placeholders for the target's open slots: type slots, then method slots.
    open: Vec<Arc<Placeholder>>,
}

impl ResolvedDelegate {
    pub fn family(&self) -> DelegateFamily {
        self.entry.family()
    }

    pub fn definition(&self) -> &Arc<TypeDef> {
        self.entry.definition()
    }

    pub fn type_args(&self) -> &[TypeRef] {
        &self.type_args
    }

    /// Placeholders still awaiting a concrete type.
    pub fn placeholders(&self) -> &[Arc<Placeholder>] {
        &self.open
    }

    pub fn is_closed(&self) -> bool {
        self.type_args.iter().all(TypeRef::is_closed)
    }

    pub fn as_type_ref(&self) -> TypeRef {
        TypeRef::generic(self.entry.definition(), self.type_args.clone())
    }

    pub fn invoke_signature(&self) -> InvokeSignature {
        let slots = self.entry.slots();
        let parameters = slots
            .iter()
            .zip(&self.type_args)
            .map(|(&mode, ty)| {
                let ty = match mode {
                    SlotMode::ByValue => ty.clone(),
                    SlotMode::ByRef | SlotMode::Out | SlotMode::RefThis => TypeRef::by_ref(ty.clone()),
                };
                InvokeParameter { mode, ty }
            })
            .collect();
        let return_type = if self.entry.returns() {
            self.type_args.last().cloned()
        } else {
            None
        };
        InvokeSignature {
            parameters,
            return_type,
        }
    }

    /// Substitute concrete types for the placeholders.
    ///
    /// `type_args` close the declaring type's parameters and `method_args`
    /// the method's own, each in declaration order. Counts must match the
    /// number of open slots exactly.
    pub fn close(
        &self,
        type_args: &[TypeRef],
        method_args: &[TypeRef],
    ) -> std::result::Result<ResolvedDelegate, CloseError> {
        let mut bindings: Vec<(&Arc<Placeholder>, &TypeRef)> = Vec::with_capacity(self.open.len());
        for (owner, args) in [(GenericOwner::Type, type_args), (GenericOwner::Method, method_args)] {
            let slots: Vec<&Arc<Placeholder>> =
                self.open.iter().filter(|p| p.owner() == owner).collect();
            if slots.len() != args.len() {
                return Err(CloseError::Count {
                    owner,
                    expected: slots.len(),
                    actual: args.len(),
                });
            }
            for (position, (ph, arg)) in slots.into_iter().zip(args).enumerate() {
                if !arg.is_closed() {
                    return Err(CloseError::OpenArgument {
                        owner,
                        position,
                        ty: arg.to_string(),
                    });
                }
                bindings.push((ph, arg));
            }
        }

        let replace = |t: &TypeRef| match t {
            TypeRef::Placeholder(p) => bindings
                .iter()
                .find(|(q, _)| Arc::ptr_eq(p, q))
                .map(|(_, ty)| (*ty).clone()),
            _ => None,
        };
        Ok(ResolvedDelegate {
            entry: self.entry.clone(),
            type_args: self.type_args.iter().map(|a| a.substitute(&replace)).collect(),
            open: Vec::new(),
        })
    }

    /// Whether `other` is an instance of this delegate: same template, and
    /// each of this delegate's placeholders can be bound to one type so that
    /// the arguments match.
    pub fn is_compatible_with(&self, other: &ResolvedDelegate) -> bool {
        if !Arc::ptr_eq(self.definition(), other.definition()) {
            return false;
        }
        let mut bindings: Vec<(Arc<Placeholder>, TypeRef)> = Vec::new();
        self.type_args
            .iter()
            .zip(&other.type_args)
            .all(|(pattern, ty)| unify(pattern, ty, &mut bindings))
    }
}

fn unify(pattern: &TypeRef, ty: &TypeRef, bindings: &mut Vec<(Arc<Placeholder>, TypeRef)>) -> bool {
    match (pattern, ty) {
        (TypeRef::Placeholder(p), _) => {
            if let Some((_, bound)) = bindings.iter().find(|(q, _)| Arc::ptr_eq(p, q)) {
                return bound == ty;
            }
            bindings.push((Arc::clone(p), ty.clone()));
            true
        }
        (TypeRef::Named { def: a, args: x }, TypeRef::Named { def: b, args: y }) => {
            (Arc::ptr_eq(a, b) || a.full_name() == b.full_name())
                && x.len() == y.len()
                && x.iter().zip(y).all(|(p, t)| unify(p, t, bindings))
        }
        (
            TypeRef::Array {
                element: a,
                rank: r,
            },
            TypeRef::Array {
                element: b,
                rank: s,
            },
        ) => r == s && unify(a, b, bindings),
        (TypeRef::ByRef(a), TypeRef::ByRef(b)) | (TypeRef::Pointer(a), TypeRef::Pointer(b)) => {
            unify(a, b, bindings)
        }
        _ => pattern == ty,
    }
}

impl PartialEq for ResolvedDelegate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self.definition(), other.definition()) && self.type_args == other.type_args
    }
}

impl fmt::Display for ResolvedDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_type_ref())
    }
}

/// Maps shapes to catalog templates. Read-only; share freely across threads.
#[derive(Debug, Clone, Copy)]
pub struct DelegateResolver {
    catalog: &'static Catalog,
}

impl Default for DelegateResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DelegateResolver {
    pub fn new() -> Self {
        Self {
            catalog: Catalog::global(),
        }
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    pub fn resolve(&self, shape: &ShapeDescriptor) -> Resolution {
        let key = ShapeKey::of(shape);
        let Some(entry) = self.catalog.lookup(&key) else {
            debug!(
                shape = %shape,
                key = %key,
                over_limit = ?Catalog::family_for(&key),
                "no delegate template for shape"
            );
            return Resolution::Unsupported(key);
        };

        let mut open = Vec::new();
        let mapping: Vec<(&Arc<GenericParam>, TypeRef)> = shape
            .generic_slots()
            .iter()
            .map(|slot| match slot {
                GenericSlot::Open(param) => {
                    let ph = Placeholder::for_param(param);
                    open.push(Arc::clone(&ph));
                    (param, TypeRef::Placeholder(ph))
                }
                GenericSlot::Bound { param, ty } => (param, ty.clone()),
            })
            .collect();
        let replace = |t: &TypeRef| match t {
            TypeRef::Param(p) => mapping
                .iter()
                .find(|(q, _)| Arc::ptr_eq(p, q))
                .map(|(_, ty)| ty.clone()),
            _ => None,
        };

        let type_args: Vec<TypeRef> = shape
            .receiver_type()
            .into_iter()
            .chain(shape.parameters().iter().map(|p| &p.ty))
            .chain(shape.return_type())
            .map(|t| t.substitute(&replace))
            .collect();
        debug_assert_eq!(type_args.len(), entry.arity());

        let resolved = ResolvedDelegate {
            entry: entry.clone(),
            type_args,
            open,
        };
        debug!(shape = %shape, delegate = %resolved, "resolved delegate");
        Resolution::Resolved(resolved)
    }

    /// Extract the shape of `method` and resolve it.
    pub fn resolve_method(&self, method: &MethodMetadata) -> Result<Resolution> {
        let shape = ShapeDescriptor::extract(method)?;
        Ok(self.resolve(&shape))
    }

    /// Resolve a batch of methods in parallel. Results keep input order.
    pub fn resolve_all(&self, methods: &[MethodMetadata]) -> Vec<Result<Resolution>> {
        methods.par_iter().map(|m| self.resolve_method(m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detour_types::{open_type, well_known, Primitive, TypeKind};

    fn fixture() -> Arc<TypeDef> {
        Arc::new(TypeDef::new("Tests", "Fixture", TypeKind::Class))
    }

    fn get_property() -> MethodMetadata {
        let mut b = MethodMetadata::builder("GetProperty").declared_by(&fixture());
        let t = b.generic_param("T");
        b.param("name", well_known::string())
            .param("defaultValue", t.clone())
            .returns(t)
            .build()
    }

    #[test]
    fn test_static_getter() {
        let m = MethodMetadata::builder("get_Now")
            .declared_by(&well_known::DATE_TIME_DEF)
            .returns(well_known::date_time())
            .build();
        let d = DelegateResolver::new().resolve_method(&m).unwrap().into_delegate().unwrap();
        assert_eq!(d.to_string(), "Indirection.Delegates.IndirectionFunc`1[System.DateTime]");
        assert!(d.is_closed());
        assert_eq!(d.invoke_signature().to_string(), "() -> System.DateTime");
    }

    #[test]
    fn test_generic_method_gets_placeholders() {
        let m = get_property();
        let d = DelegateResolver::new().resolve_method(&m).unwrap().into_delegate().unwrap();
        assert_eq!(
            d.to_string(),
            "Indirection.Delegates.IndirectionFunc`3[System.String,T,T]"
        );
        assert!(!d.is_closed());
        assert_eq!(d.placeholders().len(), 1);

        // The placeholder is not the method's own parameter.
        let t = TypeRef::param(&m.generic_params[0]);
        assert!(d.type_args()[1].same_form(&t));
        assert_ne!(d.type_args()[1], t);
        // Both occurrences are the same placeholder.
        assert_eq!(d.type_args()[1], d.type_args()[2]);
    }

    #[test]
    fn test_each_resolution_makes_new_placeholders() {
        let m = get_property();
        let resolver = DelegateResolver::new();
        let a = resolver.resolve_method(&m).unwrap().into_delegate().unwrap();
        let b = resolver.resolve_method(&m).unwrap().into_delegate().unwrap();
        assert_eq!(a.to_string(), b.to_string());
        assert_ne!(a, b);
        assert!(a.is_compatible_with(&b));
    }

    #[test]
    fn test_value_type_constructor() {
        let nullable = Arc::clone(&*well_known::NULLABLE_DEF);
        let t = TypeRef::param(&nullable.generic_params()[0]);
        let ctor = MethodMetadata::builder(".ctor")
            .declared_by(&nullable)
            .constructor()
            .param("value", t)
            .build();
        let d = DelegateResolver::new().resolve_method(&ctor).unwrap().into_delegate().unwrap();
        assert_eq!(d.family(), DelegateFamily::RefThisAction);
        assert_eq!(
            d.to_string(),
            "Indirection.Delegates.IndirectionRefThisAction`2[System.Nullable`1[T],T]"
        );

        let receiver = &d.invoke_signature().parameters[0];
        assert_eq!(receiver.mode, SlotMode::RefThis);
        let element = receiver.ty.element_type().unwrap();
        assert!(element.same_form(&open_type(&nullable)));
        assert_ne!(*element, open_type(&nullable));
    }

    #[test]
    fn test_close() {
        let d = DelegateResolver::new()
            .resolve_method(&get_property())
            .unwrap()
            .into_delegate()
            .unwrap();
        let int = well_known::primitive(Primitive::Int32);

        let closed = d.close(&[], &[int.clone()]).unwrap();
        assert!(closed.is_closed());
        assert_eq!(
            closed.to_string(),
            "Indirection.Delegates.IndirectionFunc`3[System.String,System.Int32,System.Int32]"
        );
        assert!(d.is_compatible_with(&closed));
        assert!(!closed.is_compatible_with(&d));

        assert_eq!(
            d.close(&[], &[]).unwrap_err(),
            CloseError::Count {
                owner: GenericOwner::Method,
                expected: 1,
                actual: 0
            }
        );
        assert!(matches!(
            d.close(&[int.clone()], &[int.clone()]),
            Err(CloseError::Count {
                owner: GenericOwner::Type,
                ..
            })
        ));
        let open_arg = d.type_args()[1].clone();
        assert!(matches!(
            d.close(&[], &[open_arg]),
            Err(CloseError::OpenArgument { .. })
        ));
    }

    #[test]
    fn test_inconsistent_binding_is_incompatible() {
        let d = DelegateResolver::new()
            .resolve_method(&get_property())
            .unwrap()
            .into_delegate()
            .unwrap();
        let other = ResolvedDelegate {
            entry: d.entry.clone(),
            type_args: vec![
                well_known::string(),
                well_known::primitive(Primitive::Int32),
                well_known::string(),
            ],
            open: Vec::new(),
        };
        assert!(!d.is_compatible_with(&other));
    }

    #[test]
    fn test_unsupported_shape() {
        let m = MethodMetadata::builder("GetContractDetails")
            .declared_by(&fixture())
            .instance()
            .param("symbol", well_known::string())
            .ref_param("ok", well_known::primitive(Primitive::Boolean))
            .ref_param("bid", well_known::primitive(Primitive::Decimal))
            .ref_param("ask", well_known::primitive(Primitive::Decimal))
            .build();
        let res = DelegateResolver::new().resolve_method(&m).unwrap();
        assert!(!res.is_supported());
        assert!(res.delegate().is_none());
    }

    #[test]
    fn test_resolve_all_keeps_order() {
        let ok = get_property();
        let bad = MethodMetadata::builder("Orphan").instance().build();
        let results = DelegateResolver::new().resolve_all(&[ok.clone(), bad, ok]);
        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().unwrap().is_supported());
        assert!(results[1].is_err());
        assert!(results[2].as_ref().unwrap().is_supported());
    }
}
