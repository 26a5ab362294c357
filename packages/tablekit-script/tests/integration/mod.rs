//! Integration tests for table scripts.
//!
//! 1. Engine runs: coercion, bindings, failures, timeouts and email dispatch
//! 2. Normalizer properties over generated scripts

pub mod engine_tests;
pub mod helpers;
pub mod normalizer_props;
