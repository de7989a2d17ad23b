//! Indirection configuration.
//!
//! ```
//! use detour_core::IndirectionConfig;
//!
//! let config = IndirectionConfig::default().with_strict_scopes(false);
//! assert!(config.reset_bodies_on_dispose);
//! assert!(!config.strict_scopes);
//! ```

use serde::{Deserialize, Serialize};

use detour_types::env_utils::env_flag_or;

pub const ENV_RESET_BODIES: &str = "DETOUR_RESET_BODIES";
pub const ENV_STRICT_SCOPES: &str = "DETOUR_STRICT_SCOPES";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndirectionConfig {
    /// Clear the bodies of a scope's registry when the scope is disposed
    /// (default: true).
    pub reset_bodies_on_dispose: bool,

    /// Panic when a scope is dropped out of order (default: true).
    ///
    /// Never panics while already unwinding; misuse is logged instead.
    pub strict_scopes: bool,
}

impl Default for IndirectionConfig {
    fn default() -> Self {
        Self {
            reset_bodies_on_dispose: true,
            strict_scopes: true,
        }
    }
}

impl IndirectionConfig {
    /// Defaults overridden by `DETOUR_RESET_BODIES` and `DETOUR_STRICT_SCOPES`.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            reset_bodies_on_dispose: env_flag_or(ENV_RESET_BODIES, default.reset_bodies_on_dispose),
            strict_scopes: env_flag_or(ENV_STRICT_SCOPES, default.strict_scopes),
        }
    }

    pub fn with_reset_bodies_on_dispose(mut self, reset: bool) -> Self {
        self.reset_bodies_on_dispose = reset;
        self
    }

    pub fn with_strict_scopes(mut self, strict: bool) -> Self {
        self.strict_scopes = strict;
        self
    }
}
