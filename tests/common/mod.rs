#![allow(unused_imports)]
//! Shared test utilities for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: Target method metadata and a matching JSON metadata document
//! - `helpers`: Simulated redirected call sites that go through `dispatch`
//! - `assertions`: Result and `IndirectionError` variant assertions

pub mod assertions;
pub mod fixtures;
pub mod helpers;

pub use assertions::{assert_error_contains, assert_indirection_err, assert_load_err, assert_ok};
pub use fixtures::{
    c_fuga, compare_to, d_fuga, get_contract_details, get_property, is_wow64_process,
    nullable_ctor, now_get, try_parse, write_metadata_document, FIXTURE_NAMESPACE, METADATA_JSON,
};
pub use helpers::{date_time, date_time_now, lenient_config, StubbedTarget};
