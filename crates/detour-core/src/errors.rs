//! Indirection error types.
//!
//! Configuration mistakes (asking for a default behavior of an unsupported
//! shape, assigning a body of the wrong shape, misusing a scope) surface as
//! structured [`IndirectionError`]s so tests can match on them.

use detour_resolver::CloseError;

#[derive(Debug, Clone, PartialEq)]
pub enum IndirectionError {
    /// The target's signature shape has no delegate template.
    UnsupportedShape {
        /// Stub alias or method name.
        target: String,
        /// Shape of the target, e.g. `this(in, ref, ref, ref)`.
        shape: String,
    },

    /// Generic arguments could not close the resolved delegate.
    GenericArguments {
        delegate: String,
        source: CloseError,
    },

    /// A behavior was built for a delegate that still has placeholders.
    OpenBehavior { delegate: String },

    /// A body was assigned whose delegate does not fit the stub.
    ShapeMismatch { expected: String, got: String },

    ArgumentCount { expected: usize, got: usize },

    ArgumentType {
        index: usize,
        expected: String,
        got: String,
    },

    ReturnType {
        expected: Option<String>,
        got: Option<String>,
    },

    /// Scopes exited out of order, twice, or with nothing to exit.
    ScopeMisuse { message: String },

    /// A `NotImplemented` default behavior was invoked.
    NotImplemented { delegate: String },

    /// Metadata could not be turned into a stub.
    Metadata { target: String, message: String },

    /// Raised by a caller-supplied behavior body.
    Behavior { message: String },
}

impl IndirectionError {
    /// Convenience for behavior bodies that fail.
    pub fn behavior(message: impl Into<String>) -> Self {
        IndirectionError::Behavior {
            message: message.into(),
        }
    }

    pub(crate) fn scope_misuse(message: impl Into<String>) -> Self {
        IndirectionError::ScopeMisuse {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for IndirectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndirectionError::UnsupportedShape { target, shape } => write!(
                f,
                "UNSUPPORTED_SHAPE: {} has shape {} which no indirection delegate covers",
                target, shape
            ),
            IndirectionError::GenericArguments { delegate, source } => {
                write!(f, "GENERIC_ARGUMENTS: cannot close {}: {}", delegate, source)
            }
            IndirectionError::OpenBehavior { delegate } => write!(
                f,
                "OPEN_BEHAVIOR: {} still has open generic parameters",
                delegate
            ),
            IndirectionError::ShapeMismatch { expected, got } => write!(
                f,
                "SHAPE_MISMATCH: expected a behavior of {}, got {}",
                expected, got
            ),
            IndirectionError::ArgumentCount { expected, got } => write!(
                f,
                "ARGUMENT_COUNT: expected {} argument(s), got {}",
                expected, got
            ),
            IndirectionError::ArgumentType {
                index,
                expected,
                got,
            } => write!(
                f,
                "ARGUMENT_TYPE: argument {} should be {}, got {}",
                index, expected, got
            ),
            IndirectionError::ReturnType { expected, got } => write!(
                f,
                "RETURN_TYPE: expected {}, got {}",
                expected.as_deref().unwrap_or("no value"),
                got.as_deref().unwrap_or("no value")
            ),
            IndirectionError::ScopeMisuse { message } => write!(f, "SCOPE_MISUSE: {}", message),
            IndirectionError::NotImplemented { delegate } => write!(
                f,
                "NOT_IMPLEMENTED: no behavior provided for {}",
                delegate
            ),
            IndirectionError::Metadata { target, message } => {
                write!(f, "METADATA: {}: {}", target, message)
            }
            IndirectionError::Behavior { message } => write!(f, "BEHAVIOR: {}", message),
        }
    }
}

impl std::error::Error for IndirectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndirectionError::GenericArguments { source, .. } => Some(source),
            _ => None,
        }
    }
}
