use super::*;
use crate::{
    builder::DescriptorBuilder,
    error::ErrorClass,
    model::{EntityDescriptor, TypeShape},
    traits::Entity,
};
use std::sync::Arc;
use tabula_derive::Entity;

#[derive(Debug, Default, Entity)]
#[entity(identity = "region, number")]
struct Invoice {
    region: String,
    number: Option<u32>,
    total: f64,
}

#[derive(Debug, Default, Entity)]
struct Note {
    text: String,
}

fn descriptor<T: Entity>() -> Arc<EntityDescriptor<T>> {
    DescriptorBuilder::default()
        .build::<T>(TypeShape::Single)
        .unwrap()
}

fn invoice(region: &str, number: Option<u32>, total: f64) -> EntityInstance<Invoice> {
    let mut instance = descriptor::<Invoice>().instantiate();
    let value = instance.instance_mut();
    value.region = region.to_string();
    value.number = number;
    value.total = total;
    instance
}

fn note(text: &str) -> EntityInstance<Note> {
    let mut instance = descriptor::<Note>().instantiate();
    instance.instance_mut().text = text.to_string();
    instance
}

fn resolve<T>(
    resolver: &IdentityResolver,
    mut instance: EntityInstance<T>,
) -> Result<Identity, Error> {
    resolver.resolve(&mut instance).cloned()
}

#[test]
fn equal_natural_keys_produce_equal_identities() {
    let resolver = IdentityResolver::new(b"key".to_vec());

    let a = resolve(&resolver, invoice("eu", Some(1), 10.0)).unwrap();
    let b = resolve(&resolver, invoice("eu", Some(1), 99.0)).unwrap();
    let c = resolve(&resolver, invoice("eu", Some(2), 10.0)).unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn identities_are_opaque_hex_digests() {
    let resolver = IdentityResolver::new(b"key".to_vec());
    let identity = resolve(&resolver, invoice("eu", Some(1), 0.0)).unwrap();

    assert_eq!(identity.len(), 64);
    assert!(identity.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(!identity.contains("eu"));
}

#[test]
fn key_changes_the_digest() {
    let a = resolve(&IdentityResolver::new(b"one".to_vec()), invoice("eu", Some(1), 0.0)).unwrap();
    let b = resolve(&IdentityResolver::new(b"two".to_vec()), invoice("eu", Some(1), 0.0)).unwrap();

    assert_ne!(a, b);
}

#[test]
fn separator_is_part_of_the_key() {
    let resolver = IdentityResolver::new(b"key".to_vec());

    let a = resolve(&resolver, invoice("eu1", None, 0.0)).unwrap();
    let b = resolve(&resolver, invoice("eu", Some(1), 0.0)).unwrap();

    assert_ne!(a, b);
}

#[test]
fn partially_empty_key_still_resolves() {
    let resolver = IdentityResolver::new(b"key".to_vec()).with_fallback(IdentityFallback::Reject);

    assert!(resolve(&resolver, invoice("", Some(5), 0.0)).is_ok());
}

#[test]
fn resolution_is_idempotent() {
    let resolver = IdentityResolver::new(b"key".to_vec());
    let mut instance = note("a");

    let first = resolver.resolve(&mut instance).unwrap().clone();
    let second = resolver.resolve(&mut instance).unwrap().clone();

    assert_eq!(first, second);
}

#[test]
fn random_fallback_never_merges() {
    let resolver = IdentityResolver::new(b"key".to_vec());

    let a = resolve(&resolver, note("same")).unwrap();
    let b = resolve(&resolver, note("same")).unwrap();

    assert_eq!(resolver.fallback(), IdentityFallback::Random);
    assert_ne!(a, b);
}

#[test]
fn content_fallback_merges_identical_rows() {
    let resolver = IdentityResolver::new(b"key".to_vec()).with_fallback(IdentityFallback::Content);

    let a = resolve(&resolver, note("same")).unwrap();
    let b = resolve(&resolver, note("same")).unwrap();
    let c = resolve(&resolver, note("other")).unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn content_and_natural_domains_differ() {
    let resolver = IdentityResolver::new(b"key".to_vec()).with_fallback(IdentityFallback::Content);

    let natural = resolve(&resolver, invoice("eu", None, 0.0)).unwrap();
    let empty = resolve(&resolver, invoice("", None, 0.0)).unwrap();

    assert_ne!(natural, empty);
}

#[test]
fn reject_fallback_fails_the_row() {
    let resolver = IdentityResolver::new(b"key".to_vec()).with_fallback(IdentityFallback::Reject);

    let err = resolve(&resolver, invoice("  ", None, 1.0)).unwrap_err();
    assert_eq!(err.class, ErrorClass::Conversion);

    let detail = err.conversion_detail().unwrap();
    assert_eq!(detail.column, "region;number");
    assert!(detail.entity.ends_with("Invoice"));
}

#[test]
fn resolver_follows_config() {
    let config = crate::config::MapperConfig::from_toml_str(
        "[identity]\nkey = \"k\"\nseparator = \"|\"\nfallback = \"content\"\n",
    )
    .unwrap();

    let resolver = IdentityResolver::from_config(&config.identity);
    let same_key = IdentityResolver::new(b"k".to_vec())
        .with_separator("|")
        .with_fallback(IdentityFallback::Content);

    assert_eq!(resolver.fallback(), IdentityFallback::Content);
    assert_eq!(
        resolve(&resolver, invoice("eu", Some(1), 0.0)).unwrap(),
        resolve(&same_key, invoice("eu", Some(1), 0.0)).unwrap()
    );
}
