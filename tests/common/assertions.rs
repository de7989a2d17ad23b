//! Assertions over stub, scope and metadata-loading results.
//!
//! Errors are printed with `{:#}` so the context chain of a metadata loading
//! failure shows up in full.

#![allow(dead_code)]

use std::fmt::{Debug, Display};

use detour_sandbox::core::IndirectionError;

/// Unwrap the value of a step that must succeed.
pub fn assert_ok<T, E: Display>(result: Result<T, E>, step: &str) -> T {
    result.unwrap_or_else(|err| panic!("{}: {:#}", step, err))
}

/// Unwrap the error of a stub or scope operation and check its variant.
pub fn assert_indirection_err<T: Debug>(
    result: Result<T, IndirectionError>,
    is_expected: impl Fn(&IndirectionError) -> bool,
    step: &str,
) -> IndirectionError {
    let err = match result {
        Ok(value) => panic!("{}: expected an indirection error, got {:?}", step, value),
        Err(err) => err,
    };
    assert!(is_expected(&err), "{}: unexpected error {:?}", step, err);
    err
}

/// Unwrap the error of a metadata loading step.
pub fn assert_load_err<T: Debug>(result: anyhow::Result<T>, step: &str) -> anyhow::Error {
    match result {
        Ok(value) => panic!("{}: loading should fail, got {:?}", step, value),
        Err(err) => err,
    }
}

/// Check that the rendered error, context chain included, mentions `needle`.
pub fn assert_error_contains<E: Display + ?Sized>(err: &E, needle: &str, step: &str) {
    let rendered = format!("{:#}", err);
    assert!(
        rendered.contains(needle),
        "{}: expected `{}` in error: {}",
        step,
        needle,
        rendered
    );
}
