//! Integration tests for the table model.
//!
//! 1. Schema derivation from table definitions
//! 2. Table cloning through the in-memory store

pub mod clone_tests;
pub mod helpers;
pub mod schema_tests;
