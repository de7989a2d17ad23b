//! Simulated redirected call sites.
//!
//! A real redirection mechanism rewrites call sites of the target to go
//! through [`IndirectionStub::dispatch`]. These helpers stand in for such
//! rewritten call sites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use detour_sandbox::core::{BehaviorResult, IndirectionConfig, IndirectionStub};
use detour_sandbox::types::Value;

/// Build a date-time value from calendar components.
pub fn date_time(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .and_then(|date| date.and_hms_milli_opt(h, mi, s, ms))
        .expect("valid fixture date")
}

/// Scope configuration that logs instead of panicking on misuse.
pub fn lenient_config() -> IndirectionConfig {
    IndirectionConfig::default().with_strict_scopes(false)
}

/// The original implementation of `DateTime.Now`, counting its calls.
pub fn date_time_now(stub: &IndirectionStub, original_calls: &AtomicUsize) -> Value {
    let result = stub.dispatch(&mut [], |_| {
        original_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Value::DateTime(chrono::Local::now().naive_local())))
    });
    result
        .expect("DateTime.Now never fails")
        .expect("DateTime.Now returns a value")
}

/// A target whose original implementation is a plain closure.
pub struct StubbedTarget {
    pub stub: Arc<IndirectionStub>,
    original: Box<dyn Fn(&mut [Value]) -> BehaviorResult + Send + Sync>,
    original_calls: AtomicUsize,
}

impl StubbedTarget {
    pub fn new<F>(stub: Arc<IndirectionStub>, original: F) -> Self
    where
        F: Fn(&mut [Value]) -> BehaviorResult + Send + Sync + 'static,
    {
        Self {
            stub,
            original: Box::new(original),
            original_calls: AtomicUsize::new(0),
        }
    }

    pub fn call(&self, args: &mut [Value]) -> BehaviorResult {
        self.stub.dispatch(args, |args| {
            self.original_calls.fetch_add(1, Ordering::SeqCst);
            (self.original)(args)
        })
    }

    pub fn original_calls(&self) -> usize {
        self.original_calls.load(Ordering::SeqCst)
    }
}
