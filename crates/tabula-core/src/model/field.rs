use crate::value::{Value, ValueKind};
use derive_more::Deref;
use std::{fmt, sync::Arc};
use thiserror::Error as ThisError;

/// Reads a field off an instance.
pub type Getter<T> = fn(&T) -> Value;

/// Writes (or, for collections, appends) a converted value into an instance.
pub type Setter<T> = fn(&mut T, Value) -> Result<(), FieldSetError>;

/// Field-declared converter, as written in `#[column(converter = "...")]`.
pub type ConvertFn = fn(&PropertyInfo, Value) -> Result<Value, ConvertError>;

///
/// ConvertError
///

#[derive(Clone, Debug, ThisError)]
#[error("{0}")]
pub struct ConvertError(pub String);

impl ConvertError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

///
/// FieldSetError
///

#[derive(Clone, Debug, ThisError)]
pub enum FieldSetError {
    #[error("cannot convert {value:?} into {expected}")]
    TypeMismatch {
        expected: &'static str,
        value: Value,
    },

    #[error("{0}")]
    Custom(String),
}

impl FieldSetError {
    pub fn mismatch<V>(value: Value) -> Self {
        Self::TypeMismatch {
            expected: std::any::type_name::<V>(),
            value,
        }
    }
}

///
/// ValueType
///
/// Semantic type of a field: scalar, nullable scalar, or collection of
/// scalars.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueType {
    Scalar(ValueKind),
    Nullable(ValueKind),
    Enumerable(ValueKind),
}

impl ValueType {
    #[must_use]
    pub const fn kind(self) -> ValueKind {
        match self {
            Self::Scalar(kind) | Self::Nullable(kind) | Self::Enumerable(kind) => kind,
        }
    }

    #[must_use]
    pub const fn is_nullable(self) -> bool {
        matches!(self, Self::Nullable(_))
    }

    #[must_use]
    pub const fn is_enumerable(self) -> bool {
        matches!(self, Self::Enumerable(_))
    }
}

///
/// FieldDeclaration
///
/// Static description of one field, before runtime options are applied.
///

pub struct FieldDeclaration<T> {
    /// Rust field name.
    pub name: &'static str,
    pub value_type: ValueType,
    /// Attribute-level column name.
    pub column: Option<&'static str>,
    /// Attribute-level column prefix.
    pub prefix: Option<&'static str>,
    /// Attribute-level exclusion marker.
    pub exclude: bool,
    pub converter: Option<ConvertFn>,
    pub getter: Getter<T>,
    pub setter: Setter<T>,
}

impl<T> FieldDeclaration<T> {
    #[must_use]
    pub const fn new(
        name: &'static str,
        value_type: ValueType,
        getter: Getter<T>,
        setter: Setter<T>,
    ) -> Self {
        Self {
            name,
            value_type,
            column: None,
            prefix: None,
            exclude: false,
            converter: None,
            getter,
            setter,
        }
    }

    #[must_use]
    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    #[must_use]
    pub const fn prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = Some(prefix);
        self
    }

    #[must_use]
    pub const fn exclude(mut self) -> Self {
        self.exclude = true;
        self
    }

    #[must_use]
    pub const fn converter(mut self, converter: ConvertFn) -> Self {
        self.converter = Some(converter);
        self
    }
}

///
/// Converter
///
/// Resolved value converter baked into a property descriptor.
/// Defaults to the identity pass-through.
///

#[derive(Clone)]
pub struct Converter(Option<Arc<ConvertClosure>>);

type ConvertClosure = dyn Fn(&PropertyInfo, Value) -> Result<Value, ConvertError> + Send + Sync;

impl Converter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&PropertyInfo, Value) -> Result<Value, ConvertError> + Send + Sync + 'static,
    {
        Self(Some(Arc::new(f)))
    }

    #[must_use]
    pub fn from_fn(f: ConvertFn) -> Self {
        Self::new(f)
    }

    #[must_use]
    pub const fn identity() -> Self {
        Self(None)
    }

    #[must_use]
    pub const fn is_identity(&self) -> bool {
        self.0.is_none()
    }

    pub fn apply(&self, info: &PropertyInfo, raw: Value) -> Result<Value, ConvertError> {
        match &self.0 {
            Some(f) => f(info, raw),
            None => Ok(raw),
        }
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identity() {
            f.write_str("Converter(identity)")
        } else {
            f.write_str("Converter(custom)")
        }
    }
}

///
/// PropertyInfo
///
/// Resolved, type-independent facts about one mapped property.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyInfo {
    pub(crate) property_name: &'static str,
    pub(crate) value_type: ValueType,
    pub(crate) data_name: String,
    pub(crate) data_prefix: Option<String>,
    pub(crate) column: String,
    pub(crate) is_identity: bool,
}

impl PropertyInfo {
    pub(crate) fn new(
        property_name: &'static str,
        value_type: ValueType,
        data_name: String,
        data_prefix: Option<String>,
        is_identity: bool,
    ) -> Self {
        let column = match &data_prefix {
            Some(prefix) => format!("{prefix}{data_name}"),
            None => data_name.clone(),
        };

        Self {
            property_name,
            value_type,
            data_name,
            data_prefix,
            column,
            is_identity,
        }
    }

    #[must_use]
    pub const fn property_name(&self) -> &'static str {
        self.property_name
    }

    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[must_use]
    pub fn data_name(&self) -> &str {
        &self.data_name
    }

    #[must_use]
    pub fn data_prefix(&self) -> Option<&str> {
        self.data_prefix.as_deref()
    }

    /// Column looked up in the row: `data_prefix + data_name`.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[must_use]
    pub const fn is_identity(&self) -> bool {
        self.is_identity
    }
}

///
/// PropertyDescriptor
///
/// One property of an entity descriptor with its accessors and converter
/// resolved. Immutable once built.
///

#[derive(Deref)]
pub struct PropertyDescriptor<T> {
    #[deref]
    info: PropertyInfo,
    getter: Getter<T>,
    setter: Setter<T>,
    converter: Converter,
}

impl<T> PropertyDescriptor<T> {
    pub(crate) const fn new(
        info: PropertyInfo,
        getter: Getter<T>,
        setter: Setter<T>,
        converter: Converter,
    ) -> Self {
        Self {
            info,
            getter,
            setter,
            converter,
        }
    }

    #[must_use]
    pub const fn info(&self) -> &PropertyInfo {
        &self.info
    }

    #[must_use]
    pub const fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Current value of this property on `instance`.
    pub fn get(&self, instance: &T) -> Value {
        (self.getter)(instance)
    }

    pub fn convert(&self, raw: Value) -> Result<Value, ConvertError> {
        self.converter.apply(&self.info, raw)
    }

    /// Assign (scalar) or append (enumerable) an already converted value.
    pub fn set(&self, instance: &mut T, value: Value) -> Result<(), FieldSetError> {
        (self.setter)(instance, value)
    }
}

impl<T> fmt::Debug for PropertyDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("info", &self.info)
            .field("converter", &self.converter)
            .finish_non_exhaustive()
    }
}
