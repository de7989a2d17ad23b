//! Indirection stubs: one per redirected target.
//!
//! A stub ties a target's metadata to its resolved delegate and holds the
//! active behavior ("body"). The redirection mechanism calls
//! [`IndirectionStub::dispatch`] at every call of the target.

use std::fmt;

use parking_lot::RwLock;
use tracing::{debug, trace};

use detour_extractor::{MetadataProvider, MethodMetadata, ShapeDescriptor};
use detour_resolver::{Catalog, DelegateResolver, ResolvedDelegate, ShapeKey, MAX_BY_VALUE_PARAMS};
use detour_types::{TypeRef, Value};

use crate::behavior::{Behavior, BehaviorKind, BehaviorResult};
use crate::context::{ContextMode, IndirectionsContext};
use crate::errors::IndirectionError;

pub struct IndirectionStub {
    alias: String,
    display_alias: String,
    xml_doc: String,
    target: MethodMetadata,
    shape: ShapeDescriptor,
    delegate: Option<ResolvedDelegate>,
    body: RwLock<Option<Behavior>>,
}

impl IndirectionStub {
    /// Describe `target` and resolve its delegate.
    ///
    /// An unsupported shape still yields a stub (with no delegate); only
    /// malformed metadata fails.
    pub fn new(
        alias: impl Into<String>,
        display_alias: impl Into<String>,
        xml_doc: impl Into<String>,
        target: MethodMetadata,
    ) -> Result<Self, IndirectionError> {
        let alias = alias.into();
        let shape = ShapeDescriptor::extract(&target).map_err(|e| IndirectionError::Metadata {
            target: alias.clone(),
            message: format!("{:#}", e),
        })?;
        let delegate = DelegateResolver::new().resolve(&shape).into_delegate();
        debug!(
            alias = %alias,
            generic_method = target.is_generic_method(),
            delegate = %delegate.as_ref().map_or_else(|| "unsupported".to_string(), ToString::to_string),
            "created indirection stub"
        );
        Ok(Self {
            alias,
            display_alias: display_alias.into(),
            xml_doc: xml_doc.into(),
            target,
            shape,
            delegate,
            body: RwLock::new(None),
        })
    }

    /// Build a stub for the method `key` of `provider`, using the key as
    /// both alias and display alias.
    pub fn from_provider<P>(provider: &P, key: &str) -> Result<Self, IndirectionError>
    where
        P: MetadataProvider + ?Sized,
    {
        let method = provider
            .method(key)
            .ok_or_else(|| IndirectionError::Metadata {
                target: key.to_string(),
                message: "no such method in metadata".to_string(),
            })?;
        Self::new(key, key, "", method.clone())
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn display_alias(&self) -> &str {
        &self.display_alias
    }

    pub fn xml_doc(&self) -> &str {
        &self.xml_doc
    }

    pub fn target(&self) -> &MethodMetadata {
        &self.target
    }

    pub fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    /// The resolved delegate, or `None` when the shape is unsupported.
    pub fn indirection_delegate(&self) -> Option<&ResolvedDelegate> {
        self.delegate.as_ref()
    }

    fn require_delegate(&self) -> Result<&ResolvedDelegate, IndirectionError> {
        self.delegate.as_ref().ok_or_else(|| self.unsupported())
    }

    fn unsupported(&self) -> IndirectionError {
        let key = ShapeKey::of(&self.shape);
        let shape = match Catalog::family_for(&key) {
            Some(family) => format!(
                "{} ({} with more than {} leading by-value arguments)",
                key,
                family.name(),
                MAX_BY_VALUE_PARAMS
            ),
            None => key.to_string(),
        };
        IndirectionError::UnsupportedShape {
            target: self.alias.clone(),
            shape,
        }
    }

    /// Number of arguments a body of this stub receives, receiver included.
    pub fn arity(&self) -> usize {
        self.shape.arity()
    }

    pub fn create_delegate_of_default_behavior(
        &self,
        kind: BehaviorKind,
        type_args: &[TypeRef],
        method_args: &[TypeRef],
    ) -> Result<Behavior, IndirectionError> {
        Behavior::synthesize(self.require_delegate()?, kind, type_args, method_args)
    }

    /// An untyped body over the raw argument array, for targets whose
    /// shape has no delegate.
    pub fn create_untyped_body<F>(&self, body: F) -> Behavior
    where
        F: Fn(&mut [Value]) -> BehaviorResult + Send + Sync + 'static,
    {
        Behavior::untyped(self.arity(), body)
    }

    /// Install `behavior` as the active body.
    ///
    /// A typed behavior's delegate must be an instance of this stub's
    /// delegate. An untyped behavior is accepted only when the stub has no
    /// delegate, and must take the stub's argument count.
    pub fn set_body(&self, behavior: Behavior) -> Result<(), IndirectionError> {
        let fits = match (&self.delegate, behavior.delegate()) {
            (Some(expected), Some(got)) => expected.is_compatible_with(got),
            (None, Some(_)) => return Err(self.unsupported()),
            (Some(_), None) => false,
            (None, None) => behavior.arity() == self.arity(),
        };
        if !fits {
            let expected = match &self.delegate {
                Some(delegate) => delegate.to_string(),
                None => format!("untyped({})", self.arity()),
            };
            return Err(IndirectionError::ShapeMismatch {
                expected,
                got: behavior.to_string(),
            });
        }
        debug!(alias = %self.alias, body = %behavior, "set indirection body");
        *self.body.write() = Some(behavior);
        Ok(())
    }

    pub fn body(&self) -> Option<Behavior> {
        self.body.read().clone()
    }

    pub fn has_body(&self) -> bool {
        self.body.read().is_some()
    }

    pub fn clear_body(&self) {
        *self.body.write() = None;
    }

    /// The active body, or a `DefaultValue` behavior when none is set.
    pub fn body_or_default(
        &self,
        type_args: &[TypeRef],
        method_args: &[TypeRef],
    ) -> Result<Behavior, IndirectionError> {
        match self.body() {
            Some(body) => Ok(body),
            None => {
                self.create_delegate_of_default_behavior(BehaviorKind::DefaultValue, type_args, method_args)
            }
        }
    }

    /// Route one call of the target.
    ///
    /// Runs the body when this thread is `Substituting` and a body is set;
    /// otherwise runs `original`. The body is cloned out of its slot first,
    /// so it may replace itself while running.
    pub fn dispatch<F>(&self, args: &mut [Value], original: F) -> BehaviorResult
    where
        F: FnOnce(&mut [Value]) -> BehaviorResult,
    {
        if IndirectionsContext::mode() == ContextMode::Substituting {
            if let Some(body) = self.body() {
                trace!(alias = %self.alias, "dispatching to indirection body");
                return body.invoke(args);
            }
        }
        trace!(alias = %self.alias, mode = ?IndirectionsContext::mode(), "dispatching to original");
        original(args)
    }
}

impl fmt::Debug for IndirectionStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndirectionStub")
            .field("alias", &self.alias)
            .field("target", &self.target.full_name())
            .field("shape", &self.shape.to_string())
            .field("delegate", &self.delegate.as_ref().map(ToString::to_string))
            .field("has_body", &self.has_body())
            .finish()
    }
}
