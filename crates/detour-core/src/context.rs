//! The indirections context: a scoped mode stack that decides whether a
//! stub's body or the original implementation runs.
//!
//! State is per thread. Entering an [`IndirectionsContext`] pushes a
//! `Substituting` frame; [`IndirectionsContext::execute_original`] pushes an
//! `ExecutingOriginal` frame for the duration of one call. Frames must be
//! exited in reverse order of entry.
//!
//! ```
//! use detour_core::{ContextMode, IndirectionsContext};
//!
//! assert_eq!(IndirectionsContext::mode(), ContextMode::Inactive);
//! let scope = IndirectionsContext::new();
//! assert_eq!(IndirectionsContext::mode(), ContextMode::Substituting);
//! IndirectionsContext::execute_original(|| {
//!     assert_eq!(IndirectionsContext::mode(), ContextMode::ExecutingOriginal);
//! });
//! assert_eq!(IndirectionsContext::mode(), ContextMode::Substituting);
//! scope.dispose()?;
//! assert_eq!(IndirectionsContext::mode(), ContextMode::Inactive);
//! # Ok::<(), detour_core::IndirectionError>(())
//! ```

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::IndirectionConfig;
use crate::errors::IndirectionError;
use crate::registry::StubRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextMode {
    /// No live scope on this thread; stubs run the original.
    Inactive,
    Substituting,
    ExecutingOriginal,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    id: Uuid,
    mode: ContextMode,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

fn push_frame(mode: ContextMode) -> Uuid {
    let id = Uuid::new_v4();
    let depth = FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        frames.push(Frame { id, mode });
        frames.len()
    });
    debug!(scope = %id, ?mode, depth, "entered indirection scope");
    id
}

fn pop_frame(id: Uuid) -> Result<(), IndirectionError> {
    FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        match frames.iter().rposition(|f| f.id == id) {
            Some(pos) if pos + 1 == frames.len() => {
                let frame = frames.pop();
                debug!(scope = %id, mode = ?frame.map(|f| f.mode), depth = frames.len(), "exited indirection scope");
                Ok(())
            }
            Some(pos) => {
                // Drop only the offending frame so the inner scopes can still exit cleanly.
                frames.remove(pos);
                Err(IndirectionError::scope_misuse(format!(
                    "scope {} exited while {} inner scope(s) are still live",
                    id,
                    frames.len() - pos
                )))
            }
            None if frames.is_empty() => Err(IndirectionError::scope_misuse(format!(
                "scope {} exited with no live scope on this thread",
                id
            ))),
            None => Err(IndirectionError::scope_misuse(format!(
                "scope {} is not live on this thread",
                id
            ))),
        }
    })
}

/// A substitution scope for one logical test execution.
///
/// Dropping the context exits the scope; [`IndirectionsContext::dispose`]
/// does the same and reports misuse instead of logging or panicking.
/// Contexts are bound to the thread that created them.
pub struct IndirectionsContext {
    id: Uuid,
    config: IndirectionConfig,
    registry: Option<Arc<StubRegistry>>,
    exited: bool,
    _thread_bound: PhantomData<*const ()>,
}

impl IndirectionsContext {
    /// Enter a scope configured from the environment.
    pub fn new() -> Self {
        Self::with_config(IndirectionConfig::from_env())
    }

    pub fn with_config(config: IndirectionConfig) -> Self {
        Self {
            id: push_frame(ContextMode::Substituting),
            config,
            registry: None,
            exited: false,
            _thread_bound: PhantomData,
        }
    }

    /// Attach a registry whose bodies are cleared when this scope ends
    /// (when `reset_bodies_on_dispose` is set).
    pub fn with_registry(mut self, registry: Arc<StubRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &IndirectionConfig {
        &self.config
    }

    /// Exit the scope.
    pub fn dispose(mut self) -> Result<(), IndirectionError> {
        self.exit()
    }

    fn exit(&mut self) -> Result<(), IndirectionError> {
        self.exited = true;
        if self.config.reset_bodies_on_dispose {
            if let Some(registry) = &self.registry {
                registry.clear_bodies();
            }
        }
        pop_frame(self.id)
    }

    /// Mode of the innermost live scope on this thread.
    pub fn mode() -> ContextMode {
        FRAMES.with(|frames| {
            frames
                .borrow()
                .last()
                .map_or(ContextMode::Inactive, |f| f.mode)
        })
    }

    /// Whether an `IndirectionsContext` is live on this thread.
    pub fn is_active() -> bool {
        Self::depth() > 0
    }

    /// Number of live `IndirectionsContext` scopes on this thread.
    /// `ExecutingOriginal` sections are not counted.
    pub fn depth() -> usize {
        FRAMES.with(|frames| {
            frames
                .borrow()
                .iter()
                .filter(|f| f.mode == ContextMode::Substituting)
                .count()
        })
    }

    /// Run `f` with substitution suspended, restoring the previous mode on
    /// every exit path, including unwinding.
    pub fn execute_original<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _scope = Self::enter_original();
        f()
    }

    /// Suspend substitution until the returned guard is dropped or exited.
    pub fn enter_original() -> OriginalScope {
        OriginalScope {
            id: push_frame(ContextMode::ExecutingOriginal),
            exited: false,
            _thread_bound: PhantomData,
        }
    }
}

impl Default for IndirectionsContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IndirectionsContext {
    fn drop(&mut self) {
        if self.exited {
            return;
        }
        if let Err(err) = self.exit() {
            if self.config.strict_scopes && !std::thread::panicking() {
                panic!("{}", err);
            }
            warn!(scope = %self.id, error = %err, "indirection scope dropped out of order");
        }
    }
}

impl std::fmt::Debug for IndirectionsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndirectionsContext")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("has_registry", &self.registry.is_some())
            .finish()
    }
}

/// Guard for an `ExecutingOriginal` section.
#[derive(Debug)]
pub struct OriginalScope {
    id: Uuid,
    exited: bool,
    _thread_bound: PhantomData<*const ()>,
}

impl OriginalScope {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn exit(mut self) -> Result<(), IndirectionError> {
        self.exited = true;
        pop_frame(self.id)
    }
}

impl Drop for OriginalScope {
    fn drop(&mut self) {
        if self.exited {
            return;
        }
        if let Err(err) = pop_frame(self.id) {
            warn!(scope = %self.id, error = %err, "original-execution scope dropped out of order");
        }
    }
}
