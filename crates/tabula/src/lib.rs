//! Tabula maps tabular rows onto typed Rust structs.
//!
//! ## Crate layout
//! - `core`: values, row sources, descriptors, identity, parameters and the
//!   row mapper (re-exported at the root).
//! - `Entity` derive: generates the static field declaration of a struct.
//!
//! The `prelude` module carries the domain vocabulary plus the derive.

pub use tabula_core::*;
pub use tabula_derive::Entity;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use tabula_core::prelude::*;
    pub use tabula_derive::Entity;
}
