use crate::{
    model::EntityDeclaration,
    value::{Value, ValueKind},
};

// ============================================================================
// ENTITIES
// ============================================================================

///
/// Entity
///
/// A struct that rows can be materialized into.
///
/// Implementors describe their fields once through [`EntityDeclaration`];
/// the descriptor builder turns that declaration into a cached descriptor
/// and per-row work only calls the pre-resolved accessors. Usually derived
/// with `#[derive(Entity)]`.
///

pub trait Entity: Default + Send + Sized + 'static {
    fn declaration() -> EntityDeclaration<Self>;
}

// ============================================================================
// FIELD VALUES
// ============================================================================

///
/// FieldValue
///
/// Conversion boundary between a Rust field type and a cell [`Value`].
/// `from_value` is lenient: it goes through [`Value::coerce`] so text
/// columns can populate numeric fields.
///

pub trait FieldValue {
    const KIND: ValueKind;

    fn to_value(&self) -> Value;

    #[must_use]
    fn from_value(value: &Value) -> Option<Self>
    where
        Self: Sized;
}

impl FieldValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.coerce(ValueKind::Text)? {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl FieldValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.coerce(ValueKind::Float)? {
            Value::Float(v) => Some(v),
            _ => None,
        }
    }
}

impl FieldValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    #[expect(clippy::cast_possible_truncation)]
    fn from_value(value: &Value) -> Option<Self> {
        match value.coerce(ValueKind::Float)? {
            Value::Float(v) if v.is_finite() && v.abs() <= f64::from(Self::MAX) => Some(v as Self),
            _ => None,
        }
    }
}

impl FieldValue for Vec<u8> {
    const KIND: ValueKind = ValueKind::Blob;

    fn to_value(&self) -> Value {
        Value::Blob(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.coerce(ValueKind::Blob)? {
            Value::Blob(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        if matches!(value, Value::Null) {
            return Some(None);
        }

        T::from_value(value).map(Some)
    }
}

impl<T: FieldValue> FieldValue for Box<T> {
    const KIND: ValueKind = T::KIND;

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn from_value(value: &Value) -> Option<Self> {
        T::from_value(value).map(Self::new)
    }
}

// impl_field_value
macro_rules! impl_field_value {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl FieldValue for $type {
                const KIND: ValueKind = ValueKind::$variant;

                fn to_value(&self) -> Value {
                    Value::$variant((*self).into())
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value.coerce(ValueKind::$variant)? {
                        Value::$variant(v) => v.try_into().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_field_value!(
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Uint,
    u16 => Uint,
    u32 => Uint,
    u64 => Uint,
    bool => Bool,
);

///
/// TESTS
///
