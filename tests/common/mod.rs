//! Common test utilities
//!
//! Shared fixtures and helpers for the integration tests.
//!
//! # Backends
//! - [`summing_backend`] - Scalar backend adding every integer argument
//! - [`fixed_backend`] - Backend answering every call with the same output
//! - [`RecordingBackend`] - Backend keeping every call it receives
//!
//! # Catalog Helpers
//! - [`seeded_catalog`] - In-memory catalog holding the `add` function
//! - [`add_function`] - The canonical `add(a: int, b: int) -> int`
//!
//! # Assertion Helpers
//! - [`assert_error_contains`] - Assert an error's text contains a fragment

#![allow(dead_code)]

use std::sync::Mutex;
use udf_bridge::{
    BackendError, ExecutionBackend, InMemoryCatalog, NativeFunction, NativeParameter, RawOutput, SqlCall,
    create_native_function,
};

// ============================================================================
// Functions and Catalogs
// ============================================================================

/// `add(a: int, b: int) -> int`, without documentation.
pub fn add_function() -> NativeFunction {
    NativeFunction::new("add")
        .param(NativeParameter::typed("a", "int"))
        .param(NativeParameter::typed("b", "int"))
        .returns("int")
        .body("return a + b")
}

/// An in-memory catalog holding `main.default.add`.
pub fn seeded_catalog() -> InMemoryCatalog {
    let catalog = InMemoryCatalog::new();
    create_native_function(&catalog, &add_function(), "main", "default", None)
        .unwrap_or_else(|err| panic!("seeding catalog failed: {err}"));
    catalog
}

// ============================================================================
// Backends
// ============================================================================

/// A scalar backend that sums every integer-typed statement parameter.
///
/// Stands in for a warehouse running `add`.
pub fn summing_backend() -> impl Fn(&SqlCall) -> Result<RawOutput, BackendError> + Send + Sync {
    |call: &SqlCall| {
        let mut total = 0_i64;
        for parameter in &call.parameters {
            if parameter.type_text.as_deref() != Some("INTEGER") {
                continue;
            }
            let Some(text) = parameter.value.as_deref() else {
                continue;
            };
            total += text
                .parse::<i64>()
                .map_err(|err| BackendError::MalformedResponse(err.to_string()))?;
        }
        Ok(RawOutput::scalar(total.to_string()))
    }
}

/// A backend answering every call with `output`.
pub fn fixed_backend(output: RawOutput) -> impl Fn(&SqlCall) -> Result<RawOutput, BackendError> + Send + Sync {
    move |_: &SqlCall| Ok(output.clone())
}

/// A backend that records calls and answers with a fixed output.
pub struct RecordingBackend {
    pub calls: Mutex<Vec<SqlCall>>,
    pub output: RawOutput,
}

impl RecordingBackend {
    pub fn new(output: RawOutput) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            output,
        }
    }

    /// The most recent call received.
    pub fn last_call(&self) -> SqlCall {
        self.calls
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no call was recorded")
    }
}

impl ExecutionBackend for RecordingBackend {
    fn run(&self, call: &SqlCall) -> Result<RawOutput, BackendError> {
        self.calls.lock().unwrap().push(call.clone());
        Ok(self.output.clone())
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert that `err`'s message contains `fragment`.
///
/// # Panics
/// Panics with the full message when the fragment is absent.
pub fn assert_error_contains(err: &dyn std::error::Error, fragment: &str) {
    let text = err.to_string();
    assert!(
        text.contains(fragment),
        "expected error containing `{fragment}`, got: {text}"
    );
}
