use super::*;
use crate::{
    builder::DescriptorBuilder,
    identity::IdentityResolver,
    traits::{Entity, FieldValue},
    value::{Value, ValueKind},
};

///
/// Order
///
/// Hand-written declaration, no derive.
///

#[derive(Debug, Default)]
struct Order {
    id: u32,
    note: Option<String>,
    lines: Vec<i64>,
    flags: Option<Vec<bool>>,
}

impl Entity for Order {
    fn declaration() -> EntityDeclaration<Self> {
        EntityDeclaration::new("model::tests::Order")
            .identity(&["id"])
            .field(FieldDeclaration::new(
                "id",
                ValueType::Scalar(<u32 as FieldValue>::KIND),
                |order: &Self| accessor::get(&order.id),
                |order: &mut Self, value| accessor::assign(&mut order.id, value),
            ))
            .field(
                FieldDeclaration::new(
                    "note",
                    ValueType::Nullable(ValueKind::Text),
                    |order: &Self| accessor::get(&order.note),
                    |order: &mut Self, value| accessor::assign(&mut order.note, value),
                )
                .column("Remark"),
            )
            .field(FieldDeclaration::new(
                "lines",
                ValueType::Enumerable(ValueKind::Int),
                |order: &Self| accessor::get_list(&order.lines),
                |order: &mut Self, value| accessor::push(&mut order.lines, value),
            ))
            .field(FieldDeclaration::new(
                "flags",
                ValueType::Enumerable(ValueKind::Bool),
                |order: &Self| accessor::get_optional_list(&order.flags),
                |order: &mut Self, value| accessor::push_optional(&mut order.flags, value),
            ))
    }
}

fn descriptor() -> std::sync::Arc<EntityDescriptor<Order>> {
    DescriptorBuilder::default()
        .build::<Order>(TypeShape::Single)
        .unwrap()
}

#[test]
fn scalar_setters_assign() {
    let descriptor = descriptor();
    let mut order = Order::default();

    descriptor
        .property("id")
        .unwrap()
        .set(&mut order, Value::Text("7".into()))
        .unwrap();
    descriptor
        .property("note")
        .unwrap()
        .set(&mut order, Value::from("rush"))
        .unwrap();

    assert_eq!(order.id, 7);
    assert_eq!(order.note.as_deref(), Some("rush"));
}

#[test]
fn collection_setters_append() {
    let descriptor = descriptor();
    let lines = descriptor.property("lines").unwrap();
    let mut order = Order::default();

    lines.set(&mut order, Value::Int(1)).unwrap();
    lines
        .set(&mut order, Value::List(vec![Value::Int(2), Value::Int(3)]))
        .unwrap();

    assert_eq!(order.lines, vec![1, 2, 3]);
    assert_eq!(
        lines.get(&order),
        Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn bad_list_element_leaves_collection_untouched() {
    let mut lines = vec![1_i64];
    let err = accessor::push(
        &mut lines,
        Value::List(vec![Value::Int(2), Value::from("x")]),
    )
    .unwrap_err();

    assert!(matches!(err, FieldSetError::TypeMismatch { .. }));
    assert_eq!(lines, vec![1]);
}

#[test]
fn optional_collection_is_created_on_first_success() {
    let mut flags: Option<Vec<bool>> = None;

    assert!(accessor::push_optional(&mut flags, Value::from("maybe")).is_err());
    assert!(flags.is_none());
    assert_eq!(accessor::get_optional_list(&flags), Value::Null);

    accessor::push_optional(&mut flags, Value::Bool(true)).unwrap();
    assert_eq!(flags, Some(vec![true]));
}

#[test]
fn property_info_resolves_the_looked_up_column() {
    let descriptor = descriptor();
    let note = descriptor.property("note").unwrap();

    assert_eq!(note.data_name(), "Remark");
    assert_eq!(note.column(), "Remark");
    assert!(note.value_type().is_nullable());
    assert!(!note.is_identity());
    assert!(descriptor.property("id").unwrap().is_identity());
}

#[test]
fn collection_properties_are_the_enumerable_ones() {
    let descriptor = descriptor();
    let names: Vec<_> = descriptor
        .collection_properties()
        .map(|property| property.property_name())
        .collect();

    assert_eq!(names, ["lines", "flags"]);
}

#[test]
fn identity_is_assigned_once() {
    let descriptor = descriptor();
    let mut instance = descriptor.instantiate();
    instance.instance_mut().id = 9;

    let resolver = IdentityResolver::new(b"k".to_vec());
    let first = resolver.resolve(&mut instance).unwrap().clone();

    instance.instance_mut().id = 10;
    let second = resolver.resolve(&mut instance).unwrap().clone();

    assert_eq!(first, second);
    let (order, identity, parent) = instance.into_parts();
    assert_eq!(order.id, 10);
    assert_eq!(identity, Some(first));
    assert!(parent.is_none());
}

#[test]
fn converters_default_to_identity() {
    let converter = Converter::default();
    let info = PropertyInfo::new("id", ValueType::Scalar(ValueKind::Int), "Id".into(), None, false);

    assert!(converter.is_identity());
    assert_eq!(converter.apply(&info, Value::Int(4)).unwrap(), Value::Int(4));

    let upper = Converter::new(|_, value| match value {
        Value::Text(text) => Ok(Value::Text(text.to_uppercase())),
        other => Err(ConvertError::new(format!("not text: {other:?}"))),
    });
    assert_eq!(upper.apply(&info, Value::from("a")).unwrap(), Value::from("A"));
    assert!(upper.apply(&info, Value::Int(1)).is_err());
}

#[test]
fn prefixed_property_column() {
    let info = PropertyInfo::new(
        "name",
        ValueType::Scalar(ValueKind::Text),
        "Name".into(),
        Some("Child_".into()),
        false,
    );

    assert_eq!(info.column(), "Child_Name");
    assert_eq!(info.data_prefix(), Some("Child_"));
}
