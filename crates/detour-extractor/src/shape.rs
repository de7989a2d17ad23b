//! Shape descriptors: the canonical signature key of a target function.
//!
//! A [`ShapeDescriptor`] reduces a method to what matters for picking a
//! delegate template: how the receiver is passed, how each parameter is
//! passed, whether a value is returned, and which generic slots are still
//! open. It also keeps the element type of every slot so the resolver can
//! instantiate a template without going back to the metadata.

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::trace;

use detour_types::{GenericOwner, GenericParam, TypeRef};

use crate::metadata::{MethodKind, MethodMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassingMode {
    ByValue,
    /// `ref`: read and written by the callee.
    ByReference,
    /// `out`: written by the callee. Same type-level representation as
    /// `ByReference`.
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnMode {
    None,
    ByValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiverMode {
    /// Static context: no receiver.
    None,
    /// Reference-type instance.
    ByValue,
    /// Value-type instance, passed by reference so mutation is visible.
    ByReference,
}

/// One generic slot of the target: a type or method generic parameter,
/// either still open or bound to a concrete type.
#[derive(Debug, Clone)]
pub enum GenericSlot {
    Open(Arc<GenericParam>),
    Bound {
        param: Arc<GenericParam>,
        ty: TypeRef,
    },
}

impl GenericSlot {
    pub fn param(&self) -> &Arc<GenericParam> {
        match self {
            GenericSlot::Open(param) | GenericSlot::Bound { param, .. } => param,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, GenericSlot::Open(_))
    }
}

#[derive(Debug, Clone)]
pub struct ParameterSlot {
    pub name: String,
    pub mode: PassingMode,
    /// Element type for by-reference and output slots, declared type otherwise.
    pub ty: TypeRef,
}

#[derive(Debug, Clone)]
pub struct ShapeDescriptor {
    receiver: ReceiverMode,
    receiver_type: Option<TypeRef>,
    parameters: Vec<ParameterSlot>,
    return_type: Option<TypeRef>,
    generic_slots: Vec<GenericSlot>,
    is_constructor: bool,
    is_foreign: bool,
}

impl ShapeDescriptor {
    /// Extract the shape of a method. Pure function of the metadata.
    ///
    /// Fails on metadata that cannot describe a callable: an instance member
    /// without a declaring type, a foreign function with a receiver, a
    /// `void` parameter, a constructor returning a value, or a by-reference
    /// return type.
    pub fn extract(method: &MethodMetadata) -> Result<Self> {
        let name = method.full_name();

        let has_receiver = matches!(method.kind, MethodKind::Instance | MethodKind::Constructor);
        if has_receiver && method.is_foreign() {
            return Err(anyhow!(
                "{}: foreign-call-convention functions cannot take a receiver",
                name
            ));
        }

        let (receiver, receiver_type) = if has_receiver {
            let def = method.declaring_type.as_ref().ok_or_else(|| {
                anyhow!("{}: instance member without a declaring type", name)
            })?;
            let mode = if def.is_value_type() {
                ReceiverMode::ByReference
            } else {
                ReceiverMode::ByValue
            };
            (mode, method.declaring_open_type())
        } else {
            (ReceiverMode::None, None)
        };

        let parameters = method
            .parameters
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let (mode, ty) = match &p.ty {
                    TypeRef::ByRef(element) if p.is_out => (PassingMode::Output, (**element).clone()),
                    TypeRef::ByRef(element) => (PassingMode::ByReference, (**element).clone()),
                    // `out` on a by-value parameter is a marshaling hint only.
                    other => (PassingMode::ByValue, other.clone()),
                };
                if ty.is_void() {
                    return Err(anyhow!("{}: parameter {} ({}) has type void", name, i, p.name));
                }
                Ok(ParameterSlot {
                    name: p.name.clone(),
                    mode,
                    ty,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if method.return_type.is_by_ref() {
            return Err(anyhow!(
                "{}: by-reference return type {} is not representable",
                name,
                method.return_type
            ));
        }
        let return_type = if method.return_type.is_void() {
            None
        } else {
            Some(method.return_type.clone())
        };
        if method.kind == MethodKind::Constructor && return_type.is_some() {
            return Err(anyhow!("{}: constructors cannot return a value", name));
        }

        let generic_slots = method
            .type_generic_params()
            .iter()
            .chain(method.generic_params.iter())
            .map(|p| GenericSlot::Open(Arc::clone(p)))
            .collect();

        let shape = Self {
            receiver,
            receiver_type,
            parameters,
            return_type,
            generic_slots,
            is_constructor: method.kind == MethodKind::Constructor,
            is_foreign: method.is_foreign(),
        };
        trace!(method = %name, shape = %shape, "extracted shape");
        Ok(shape)
    }

    pub fn receiver(&self) -> ReceiverMode {
        self.receiver
    }

    /// Open form of the declaring type when there is a receiver.
    pub fn receiver_type(&self) -> Option<&TypeRef> {
        self.receiver_type.as_ref()
    }

    pub fn parameters(&self) -> &[ParameterSlot] {
        &self.parameters
    }

    /// Number of call arguments, receiver included.
    pub fn arity(&self) -> usize {
        usize::from(self.receiver != ReceiverMode::None) + self.parameters.len()
    }

    pub fn modes(&self) -> impl Iterator<Item = PassingMode> + '_ {
        self.parameters.iter().map(|p| p.mode)
    }

    pub fn return_mode(&self) -> ReturnMode {
        if self.return_type.is_some() {
            ReturnMode::ByValue
        } else {
            ReturnMode::None
        }
    }

    pub fn return_type(&self) -> Option<&TypeRef> {
        self.return_type.as_ref()
    }

    pub fn generic_slots(&self) -> &[GenericSlot] {
        &self.generic_slots
    }

    #[cfg(test)]
    fn has_open_slots(&self) -> bool {
        self.generic_slots.iter().any(GenericSlot::is_open)
    }

    #[cfg(test)]
    fn open_slot_count(&self, owner: GenericOwner) -> usize {
        self.generic_slots
            .iter()
            .filter(|s| s.is_open() && s.param().owner() == owner)
            .count()
    }

    pub fn is_constructor(&self) -> bool {
        self.is_constructor
    }

    pub fn is_foreign(&self) -> bool {
        self.is_foreign
    }

    /// Bind an open generic slot to a concrete type, e.g. to describe the
    /// `Nullable<int>` instantiation of a generic constructor.
    pub fn bind(mut self, owner: GenericOwner, position: usize, ty: TypeRef) -> Result<Self> {
        if !ty.is_closed() {
            return Err(anyhow!("cannot bind {} generic slot {} to open type {}", owner, position, ty));
        }
        let slot = self
            .generic_slots
            .iter_mut()
            .find(|s| s.param().owner() == owner && s.param().position() == position)
            .ok_or_else(|| anyhow!("no {} generic slot at position {}", owner, position))?;
        let param = Arc::clone(slot.param());
        *slot = GenericSlot::Bound { param, ty };
        Ok(self)
    }
}

impl fmt::Display for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let receiver = match self.receiver {
            ReceiverMode::None => "static",
            ReceiverMode::ByValue => "this",
            ReceiverMode::ByReference => "ref this",
        };
        write!(f, "{}(", receiver)?;
        for (i, p) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let mode = match p.mode {
                PassingMode::ByValue => "",
                PassingMode::ByReference => "ref ",
                PassingMode::Output => "out ",
            };
            write!(f, "{}{}", mode, p.ty)?;
        }
        write!(f, ")")?;
        if let Some(ret) = &self.return_type {
            write!(f, " -> {}", ret)?;
        }
        Ok(())
    }
}
