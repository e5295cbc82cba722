//! Runtime data model definitions.
//!
//! Declarations (`EntityDeclaration`, `FieldDeclaration`) are the static,
//! derive-generated description of a type. Descriptors (`EntityDescriptor`,
//! `PropertyDescriptor`) are what the builder produces from a declaration
//! plus runtime options, and what the mapper runs against.
//!
//! In general:
//! - declarations define *what exists*
//! - descriptors define *what runs*
pub mod accessor;
pub mod entity;
pub mod field;

#[cfg(test)]
mod tests;

pub use entity::{EntityDeclaration, EntityDescriptor, EntityInstance, TypeShape};
pub use field::{
    ConvertError, ConvertFn, Converter, FieldDeclaration, FieldSetError, Getter,
    PropertyDescriptor, PropertyInfo, Setter, ValueType,
};
