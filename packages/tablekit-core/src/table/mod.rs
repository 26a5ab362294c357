//! Table definitions, display configuration and table scripts.

mod configuration;
mod methods;
#[allow(clippy::module_inception)]
mod table;

pub use configuration::{EntityRef, FieldOrder, TableConfiguration};
pub use methods::{ExecutionMoment, MethodCode, TableMethods, UserAction};
pub use table::{Table, TableType};
