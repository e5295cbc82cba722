//! Core runtime for Tabula: values, row sources, entity descriptors, the
//! descriptor cache, identity resolution, parameter binding and the row
//! mapper.
#![warn(unreachable_pub)]

extern crate self as tabula;

// public exports are one module level down
pub mod builder;
pub mod cancel;
pub mod config;
pub mod error;
pub mod identity;
pub mod mapper;
pub mod model;
pub mod naming;
pub mod param;
pub mod source;
pub mod traits;
pub mod value;

///
/// CONSTANTS
///

/// Separator placed between identity field values before they are sealed.
pub const DEFAULT_IDENTITY_SEPARATOR: &str = ";";

/// Rows handed to one partition when no chunk size is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, executors, caches, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        identity::Identity,
        mapper::{Materialized, Strategy},
        model::{EntityDeclaration, FieldDeclaration, TypeShape, ValueType},
        source::{DataRow, DataTable, Row, RowReader},
        traits::{Entity, FieldValue},
        value::{Value, ValueKind},
    };
}
