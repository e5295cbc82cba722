//! Accessor helpers called by derive-generated getters and setters.
//!
//! Scalars are assigned; collections are appended to, and a `List` value
//! appends every element (this is how merged row groups accumulate).

use crate::{model::field::FieldSetError, traits::FieldValue, value::Value};

pub fn get<V: FieldValue>(slot: &V) -> Value {
    slot.to_value()
}

pub fn get_list<V: FieldValue>(slot: &[V]) -> Value {
    Value::List(slot.iter().map(FieldValue::to_value).collect())
}

#[allow(clippy::ref_option)]
pub fn get_optional_list<V: FieldValue>(slot: &Option<Vec<V>>) -> Value {
    slot.as_deref().map_or(Value::Null, get_list)
}

pub fn assign<V: FieldValue>(slot: &mut V, value: Value) -> Result<(), FieldSetError> {
    *slot = V::from_value(&value).ok_or_else(|| FieldSetError::mismatch::<V>(value))?;

    Ok(())
}

pub fn push<V: FieldValue>(slot: &mut Vec<V>, value: Value) -> Result<(), FieldSetError> {
    match value {
        Value::List(items) => {
            // convert everything first so a bad element leaves the slot untouched
            let mut converted = Vec::with_capacity(items.len());
            for item in items {
                let value =
                    V::from_value(&item).ok_or_else(|| FieldSetError::mismatch::<V>(item))?;
                converted.push(value);
            }
            slot.extend(converted);
        }
        item => {
            let converted =
                V::from_value(&item).ok_or_else(|| FieldSetError::mismatch::<V>(item))?;
            slot.push(converted);
        }
    }

    Ok(())
}

/// Append into an optional collection, creating it when unset.
pub fn push_optional<V: FieldValue>(
    slot: &mut Option<Vec<V>>,
    value: Value,
) -> Result<(), FieldSetError> {
    if let Some(items) = slot {
        return push(items, value);
    }

    let mut items = Vec::new();
    push(&mut items, value)?;
    *slot = Some(items);

    Ok(())
}
