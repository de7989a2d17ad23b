//! Behaviors: callables of an exact, closed delegate shape.
//!
//! A behavior receives its arguments in invoke order (receiver first, then
//! parameters as declared) as a mutable slice of [`Value`]s and writes
//! by-reference and output slots in place.
//!
//! Targets whose shape has no delegate template take an untyped behavior
//! instead: a body over the raw argument array whose only checked contract
//! is the argument count.

use std::fmt;
use std::sync::Arc;

use detour_resolver::{InvokeSignature, ResolvedDelegate, SlotMode};
use detour_types::{TypeRef, Value};

use crate::errors::IndirectionError;

pub type BehaviorResult = Result<Option<Value>, IndirectionError>;

/// The callable stored in a [`Behavior`].
pub type BehaviorFn = dyn Fn(&mut [Value]) -> BehaviorResult + Send + Sync;

/// Policies available for synthesized behaviors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BehaviorKind {
    /// Zero every output, reset a by-reference receiver, return the zero value.
    #[default]
    DefaultValue,
    /// Fail with [`IndirectionError::NotImplemented`] when invoked.
    NotImplemented,
}

#[derive(Clone)]
enum Form {
    Typed {
        delegate: ResolvedDelegate,
        signature: InvokeSignature,
    },
    Untyped {
        arity: usize,
    },
}

#[derive(Clone)]
pub struct Behavior {
    form: Form,
    kind: Option<BehaviorKind>,
    body: Arc<BehaviorFn>,
}

impl Behavior {
    /// Wrap a caller-supplied body. The delegate must be closed.
    pub fn new<F>(delegate: ResolvedDelegate, body: F) -> Result<Self, IndirectionError>
    where
        F: Fn(&mut [Value]) -> BehaviorResult + Send + Sync + 'static,
    {
        if !delegate.is_closed() {
            return Err(IndirectionError::OpenBehavior {
                delegate: delegate.to_string(),
            });
        }
        Ok(Self {
            form: Form::Typed {
                signature: delegate.invoke_signature(),
                delegate,
            },
            kind: None,
            body: Arc::new(body),
        })
    }

    /// Wrap a body over the raw argument array of a target with `arity`
    /// arguments (receiver included). Argument and return types are not
    /// checked.
    pub fn untyped<F>(arity: usize, body: F) -> Self
    where
        F: Fn(&mut [Value]) -> BehaviorResult + Send + Sync + 'static,
    {
        Self {
            form: Form::Untyped { arity },
            kind: None,
            body: Arc::new(body),
        }
    }

    /// Build a behavior of `kind` for `delegate`, closed over the given
    /// type-level and method-level generic arguments.
    pub fn synthesize(
        delegate: &ResolvedDelegate,
        kind: BehaviorKind,
        type_args: &[TypeRef],
        method_args: &[TypeRef],
    ) -> Result<Self, IndirectionError> {
        let closed = delegate
            .close(type_args, method_args)
            .map_err(|source| IndirectionError::GenericArguments {
                delegate: delegate.to_string(),
                source,
            })?;
        let signature = closed.invoke_signature();

        let body: Arc<BehaviorFn> = match kind {
            BehaviorKind::DefaultValue => {
                let writes = signature
                    .parameters
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| matches!(p.mode, SlotMode::Out | SlotMode::RefThis))
                    .map(|(i, p)| Ok((i, zero(&p.ty)?)))
                    .collect::<Result<Vec<_>, IndirectionError>>()?;
                let ret = signature.return_type.as_ref().map(zero).transpose()?;
                Arc::new(move |args: &mut [Value]| -> BehaviorResult {
                    for (i, value) in &writes {
                        args[*i] = value.clone();
                    }
                    Ok(ret.clone())
                })
            }
            BehaviorKind::NotImplemented => {
                let name = closed.to_string();
                Arc::new(move |_: &mut [Value]| -> BehaviorResult {
                    Err(IndirectionError::NotImplemented {
                        delegate: name.clone(),
                    })
                })
            }
        };

        Ok(Self {
            form: Form::Typed {
                delegate: closed,
                signature,
            },
            kind: Some(kind),
            body,
        })
    }

    /// The closed delegate, or `None` for an untyped behavior.
    pub fn delegate(&self) -> Option<&ResolvedDelegate> {
        match &self.form {
            Form::Typed { delegate, .. } => Some(delegate),
            Form::Untyped { .. } => None,
        }
    }

    pub fn signature(&self) -> Option<&InvokeSignature> {
        match &self.form {
            Form::Typed { signature, .. } => Some(signature),
            Form::Untyped { .. } => None,
        }
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self.form, Form::Untyped { .. })
    }

    /// Number of arguments the body receives, receiver included.
    pub fn arity(&self) -> usize {
        match &self.form {
            Form::Typed { signature, .. } => signature.parameters.len(),
            Form::Untyped { arity } => *arity,
        }
    }

    /// The synthesized policy, or `None` for a caller-supplied body.
    pub fn kind(&self) -> Option<BehaviorKind> {
        self.kind
    }

    /// Run the body after checking the arguments against the signature.
    ///
    /// Output slots are not checked on the way in; the callee owns them.
    /// Untyped behaviors check the argument count only.
    pub fn invoke(&self, args: &mut [Value]) -> BehaviorResult {
        if args.len() != self.arity() {
            return Err(IndirectionError::ArgumentCount {
                expected: self.arity(),
                got: args.len(),
            });
        }
        let signature = match &self.form {
            Form::Typed { signature, .. } => signature,
            Form::Untyped { .. } => return (self.body)(args),
        };
        let params = &signature.parameters;
        for (index, (param, arg)) in params.iter().zip(args.iter()).enumerate() {
            if param.mode == SlotMode::Out {
                continue;
            }
            if !arg.conforms_to(&param.ty) {
                return Err(IndirectionError::ArgumentType {
                    index,
                    expected: param.ty.to_string(),
                    got: format!("{:?}", arg),
                });
            }
        }

        let result = (self.body)(args)?;
        match (&signature.return_type, &result) {
            (None, None) => Ok(result),
            (Some(ty), Some(v)) if v.conforms_to(ty) => Ok(result),
            (expected, got) => Err(IndirectionError::ReturnType {
                expected: expected.as_ref().map(ToString::to_string),
                got: got.as_ref().map(|v| format!("{:?}", v)),
            }),
        }
    }
}

/// The delegate, or `untyped(N)` for an argument-array body.
impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.form {
            Form::Typed { delegate, .. } => write!(f, "{}", delegate),
            Form::Untyped { arity } => write!(f, "untyped({})", arity),
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("form", &self.to_string())
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn zero(ty: &TypeRef) -> Result<Value, IndirectionError> {
    Value::zero_of(ty).map_err(|e| IndirectionError::behavior(format!("{:#}", e)))
}
