//! Environment variable helpers for configuration overrides.
//!
//! # Example
//!
//! ```
//! use detour_types::env_utils::env_flag_or;
//!
//! assert!(env_flag_or("DETOUR_UNSET_EXAMPLE", true));
//! ```

/// Read a boolean flag, falling back to `default` when unset or unrecognized.
///
/// "1", "true", "yes", "on" are true; "0", "false", "no", "off" are false
/// (case-insensitive).
pub fn env_flag_or(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
