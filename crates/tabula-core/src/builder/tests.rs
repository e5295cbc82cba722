use super::*;
use crate::{
    error::ErrorClass,
    model::{ConvertError, Converter, PropertyInfo, ValueType},
    naming::NamingConvention,
    value::{Value, ValueKind},
};
use std::{sync::Barrier, thread};
use tabula_derive::Entity;

#[derive(Debug, Default, Entity)]
#[entity(identity = "id")]
struct Customer {
    id: i64,
    #[column(name = "FullName")]
    name: String,
    email: Option<String>,
    #[column(exclude)]
    secret: String,
    #[column(skip)]
    #[allow(dead_code)]
    scratch: Vec<u8>,
}

// same fields as Customer, different type
#[derive(Debug, Default, Entity)]
#[entity(identity = "id")]
struct Supplier {
    id: i64,
    #[column(name = "FullName")]
    name: String,
    email: Option<String>,
    #[column(exclude)]
    secret: String,
}

#[derive(Debug, Default, Entity)]
#[entity(prefix = "addr_", naming = "pascal")]
struct Address {
    street: String,
    #[column(prefix = "geo_")]
    zip_code: String,
    #[column(converter = "shout")]
    city: String,
}

fn shout(_: &PropertyInfo, value: Value) -> Result<Value, ConvertError> {
    match value {
        Value::Text(text) => Ok(Value::Text(text.to_uppercase())),
        other => Ok(other),
    }
}

#[derive(Debug, Default, Entity)]
#[entity(identity = "missing")]
struct BadIdentity {
    id: i64,
}

#[derive(Debug, Default, Entity)]
struct ListIdentity {
    #[column(identity)]
    tags: Vec<String>,
}

#[derive(Debug, Default, Entity)]
#[entity(identity = "id")]
struct Attachment {
    id: i64,
    r#type: String,
    payload: Vec<u8>,
    thumbnail: Option<Vec<u8>>,
    #[column(identity)]
    r#ref: String,
}

fn columns<T: Entity>(builder: &DescriptorBuilder) -> Vec<String> {
    builder
        .build::<T>(TypeShape::Single)
        .unwrap()
        .properties()
        .iter()
        .map(|property| property.column().to_string())
        .collect()
}

#[test]
fn declaration_drives_columns_and_exclusion() {
    let builder = DescriptorBuilder::default();

    assert_eq!(columns::<Customer>(&builder), ["id", "FullName", "email"]);
}

#[test]
fn cache_returns_the_same_descriptor() {
    let builder = DescriptorBuilder::default();
    let first = builder.build::<Customer>(TypeShape::Single).unwrap();
    let second = builder.build::<Customer>(TypeShape::Single).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(builder.len(), 1);
}

#[test]
fn shapes_do_not_collide() {
    let builder = DescriptorBuilder::default();
    let single = builder.build::<Customer>(TypeShape::Single).unwrap();
    let many = builder.build::<Customer>(TypeShape::Enumerable).unwrap();
    let maybe = builder.build::<Customer>(TypeShape::Nullable).unwrap();

    assert_eq!(builder.len(), 3);
    assert!(many.is_enumerable() && !many.is_nullable());
    assert!(maybe.is_nullable());
    assert!(!single.is_enumerable());
}

#[test]
fn identical_shapes_of_distinct_types_do_not_collide() {
    let builder = DescriptorBuilder::default();
    let customer = builder.build::<Customer>(TypeShape::Single).unwrap();
    let supplier = builder.build::<Supplier>(TypeShape::Single).unwrap();

    assert_eq!(builder.len(), 2);
    assert_ne!(customer.target_type(), supplier.target_type());
    assert!(customer.target_type().ends_with("Customer"));
    assert!(supplier.target_type().ends_with("Supplier"));
}

#[test]
fn concurrent_builds_agree() {
    const THREADS: usize = 8;

    let builder = DescriptorBuilder::default();
    let barrier = Barrier::new(THREADS);

    let built: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    builder.build::<Customer>(TypeShape::Enumerable).unwrap()
                })
            })
            .collect();

        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(builder.len(), 1);
    assert!(built.iter().all(|descriptor| Arc::ptr_eq(descriptor, &built[0])));
    assert_eq!(built[0].properties().len(), 3);
}

#[test]
fn naming_and_prefixes_resolve_in_order() {
    let builder = DescriptorBuilder::default();

    assert_eq!(
        columns::<Address>(&builder),
        ["addr_Street", "geo_ZipCode", "addr_City"]
    );
}

#[test]
fn runtime_options_win_over_attributes() {
    let options = DescriptorOptions::new().entity::<Address>(
        EntityOptions::new()
            .default_prefix("home_")
            .prefix("street", "")
            .column("zip_code", "PostCode")
            .naming(NamingConvention::UpperSnake),
    );
    let builder = DescriptorBuilder::new(options);

    assert_eq!(
        columns::<Address>(&builder),
        ["STREET", "geo_PostCode", "home_CITY"]
    );
}

#[test]
fn global_naming_applies_without_type_convention() {
    let builder = DescriptorBuilder::new(DescriptorOptions::new().naming(NamingConvention::Pascal));

    assert_eq!(columns::<Customer>(&builder), ["Id", "FullName", "Email"]);
}

#[test]
fn runtime_exclusion_and_identity() {
    let options = DescriptorOptions::new().entity::<Customer>(
        EntityOptions::new().exclude("email").identity(["name"]),
    );
    let builder = DescriptorBuilder::new(options);
    let descriptor = builder.build::<Customer>(TypeShape::Single).unwrap();

    assert!(descriptor.property("email").is_none());
    let identity: Vec<_> = descriptor
        .identity_properties()
        .map(|property| property.property_name())
        .collect();
    assert_eq!(identity, ["name"]);
}

#[test]
fn predicate_replaces_exclusion_rules() {
    let options = DescriptorOptions::new().entity::<Customer>(
        EntityOptions::new()
            .exclude("email")
            .include_when(|info| info.value_type().kind() == ValueKind::Text),
    );
    let builder = DescriptorBuilder::new(options.clone());

    // identity 'id' is filtered out, so the declared identity no longer resolves
    let err = builder.build::<Customer>(TypeShape::Single).unwrap_err();
    assert_eq!(err.class, ErrorClass::DescriptorBuild);

    let options = DescriptorOptions::new().entity::<Customer>(
        EntityOptions::new()
            .identity(["name"])
            .exclude("email")
            .include_when(|info| info.value_type().kind() == ValueKind::Text),
    );
    let builder = DescriptorBuilder::new(options);
    let names: Vec<_> = builder
        .build::<Customer>(TypeShape::Single)
        .unwrap()
        .properties()
        .iter()
        .map(|property| property.property_name())
        .collect();

    // the excluded marker and exclusion set are both ignored
    assert_eq!(names, ["name", "email", "secret"]);
}

#[test]
fn converter_resolution_order() {
    let builder = DescriptorBuilder::default();
    let descriptor = builder.build::<Address>(TypeShape::Single).unwrap();

    let city = descriptor.property("city").unwrap();
    assert_eq!(city.convert(Value::from("oslo")).unwrap(), Value::from("OSLO"));
    assert!(descriptor.property("street").unwrap().converter().is_identity());

    let options = DescriptorOptions::new().entity::<Address>(EntityOptions::new().converter(
        ValueKind::Text,
        Converter::new(|_, value| Ok(Value::Text(format!("<{value}>")))),
    ));
    let builder = DescriptorBuilder::new(options);
    let descriptor = builder.build::<Address>(TypeShape::Single).unwrap();

    assert_eq!(
        descriptor.property("city").unwrap().convert(Value::from("oslo")).unwrap(),
        Value::from("<oslo>")
    );
    assert_eq!(
        descriptor.property("street").unwrap().convert(Value::from("main")).unwrap(),
        Value::from("<main>")
    );
}

#[test]
fn unknown_identity_field_fails_and_caches_nothing() {
    let builder = DescriptorBuilder::default();
    let err = builder.build::<BadIdentity>(TypeShape::Single).unwrap_err();

    assert_eq!(err.class, ErrorClass::DescriptorBuild);
    assert!(err.message.contains("BadIdentity"));
    assert!(err.message.contains("missing"));
    assert!(builder.is_empty());
}

#[test]
fn collection_identity_is_rejected() {
    let err = DescriptorBuilder::default()
        .build::<ListIdentity>(TypeShape::Single)
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::DescriptorBuild);
    assert!(err.message.contains("collection"));
}

#[test]
fn empty_column_override_is_rejected() {
    let options =
        DescriptorOptions::new().entity::<Customer>(EntityOptions::new().column("email", ""));
    let err = DescriptorBuilder::new(options)
        .build::<Customer>(TypeShape::Single)
        .unwrap_err();

    assert!(err.message.contains("empty column"));
}

#[test]
fn cached_and_clear() {
    let builder = DescriptorBuilder::default();
    assert!(builder.cached::<Customer>(TypeShape::Single).unwrap().is_none());

    let built = builder.build::<Customer>(TypeShape::Single).unwrap();
    let cached = builder.cached::<Customer>(TypeShape::Single).unwrap().unwrap();
    assert!(Arc::ptr_eq(&built, &cached));

    builder.clear();
    assert!(builder.is_empty());
    assert_eq!(built.properties().len(), 3);
}

#[test]
fn signature_display_carries_shape_marker() {
    let signature = Signature::of::<Customer>(TypeShape::Enumerable);

    assert!(signature.to_string().ends_with("Customer[]"));
    assert_eq!(signature.shape(), TypeShape::Enumerable);
}

#[test]
fn raw_identifiers_map_to_their_plain_name() {
    let builder = DescriptorBuilder::new(DescriptorOptions::new().naming(NamingConvention::Pascal));
    let descriptor = builder.build::<Attachment>(TypeShape::Single).unwrap();

    assert_eq!(
        columns::<Attachment>(&builder),
        ["Id", "Type", "Payload", "Thumbnail", "Ref"]
    );
    assert!(descriptor.property("type").is_some());
    assert!(descriptor.property("r#type").is_none());

    let identity: Vec<_> = descriptor
        .identity_properties()
        .map(|property| property.property_name())
        .collect();
    assert_eq!(identity, ["id", "ref"]);
}

#[test]
fn byte_vectors_are_blob_scalars() {
    let builder = DescriptorBuilder::default();
    let descriptor = builder.build::<Attachment>(TypeShape::Single).unwrap();

    assert_eq!(
        descriptor.property("payload").unwrap().value_type(),
        ValueType::Scalar(ValueKind::Blob)
    );
    assert_eq!(
        descriptor.property("thumbnail").unwrap().value_type(),
        ValueType::Nullable(ValueKind::Blob)
    );
    assert_eq!(descriptor.collection_properties().count(), 0);
}
