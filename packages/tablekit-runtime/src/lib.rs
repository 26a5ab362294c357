//! Row lifecycle for user-defined tables.
//!
//! Wires table scripts around row storage: `onLoad` on reads, `beforeSave`
//! and `afterSave` around writes, with nested field-group rows stored in
//! their own tables.

pub mod error;
pub mod rows;

pub use error::{Result, RowError};
pub use rows::RowService;
