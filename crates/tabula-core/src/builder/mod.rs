//! Descriptor building and caching.
//!
//! A [`DescriptorBuilder`] owns its options and a concurrent cache of the
//! descriptors it has produced. Builds are pure functions of (type, shape,
//! options), so two threads racing to build the same signature both
//! produce a correct descriptor; the first one stored is the one every
//! caller gets back.

mod options;

#[cfg(test)]
mod tests;

pub use options::{DescriptorOptions, EntityOptions, FieldPredicate};

use crate::{
    error::{Error, ErrorOrigin},
    model::{Converter, EntityDescriptor, PropertyDescriptor, PropertyInfo, TypeShape},
    traits::Entity,
};
use std::{
    any::{Any, TypeId},
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

type CachedDescriptor = Arc<dyn Any + Send + Sync>;

///
/// Signature
///
/// Cache key: the type's identity and qualified name plus its shape marker.
/// Two distinct types never share a signature, even with identical fields.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Signature {
    type_id: TypeId,
    type_name: &'static str,
    shape: TypeShape,
}

impl Signature {
    #[must_use]
    pub fn of<T: 'static>(shape: TypeShape) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            shape,
        }
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub const fn shape(&self) -> TypeShape {
        self.shape
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.type_name, self.shape.marker())
    }
}

///
/// DescriptorBuilder
///

#[derive(Default)]
pub struct DescriptorBuilder {
    options: DescriptorOptions,
    cache: RwLock<HashMap<Signature, CachedDescriptor>>,
}

impl DescriptorBuilder {
    #[must_use]
    pub fn new(options: DescriptorOptions) -> Self {
        Self {
            options,
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn options(&self) -> &DescriptorOptions {
        &self.options
    }

    /// Return the cached descriptor for `T`, building it on first use.
    pub fn build<T: Entity>(&self, shape: TypeShape) -> Result<Arc<EntityDescriptor<T>>, Error> {
        let signature = Signature::of::<T>(shape);

        if let Some(descriptor) = self.lookup::<T>(&signature)? {
            return Ok(descriptor);
        }

        // Built outside the lock; a concurrent duplicate build is harmless.
        let built: CachedDescriptor = Arc::new(self.introspect::<T>(shape)?);

        let stored = {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cache.entry(signature).or_insert(built))
        };

        tracing::debug!(entity = %signature, "cached entity descriptor");

        downcast::<T>(&signature, stored)
    }

    /// Cached descriptor for `T`, without building.
    pub fn cached<T: Entity>(
        &self,
        shape: TypeShape,
    ) -> Result<Option<Arc<EntityDescriptor<T>>>, Error> {
        self.lookup::<T>(&Signature::of::<T>(shape))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached descriptor. In-flight mappings keep theirs.
    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn lookup<T: Entity>(
        &self,
        signature: &Signature,
    ) -> Result<Option<Arc<EntityDescriptor<T>>>, Error> {
        let hit = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(signature)
            .cloned();

        hit.map(|stored| downcast::<T>(signature, stored)).transpose()
    }

    /// Resolve `T`'s declaration against the options into a descriptor.
    fn introspect<T: Entity>(&self, shape: TypeShape) -> Result<EntityDescriptor<T>, Error> {
        let target_type = std::any::type_name::<T>();
        let declaration = T::declaration();
        let options = self.options.for_type(target_type);

        let naming = options
            .and_then(|o| o.naming)
            .or(declaration.naming)
            .unwrap_or(self.options.naming);

        let identity_names: Vec<String> = match options.and_then(|o| o.identity.as_ref()) {
            Some(names) => names.clone(),
            None => declaration.identity.iter().map(ToString::to_string).collect(),
        };

        let default_prefix = options
            .and_then(|o| o.default_prefix.as_deref())
            .or(declaration.prefix);

        let mut properties = Vec::with_capacity(declaration.fields.len());
        let mut seen = HashSet::new();

        for field in declaration.fields {
            let name = field.name;

            let data_name = options
                .and_then(|o| o.columns.get(name).cloned())
                .or_else(|| field.column.map(ToString::to_string))
                .unwrap_or_else(|| naming.apply(name));
            if data_name.is_empty() {
                return Err(Error::descriptor_build(
                    target_type,
                    format!("field '{name}' resolves to an empty column name"),
                ));
            }

            let data_prefix = options
                .and_then(|o| o.prefixes.get(name).map(String::as_str))
                .or(field.prefix)
                .or(default_prefix)
                .filter(|prefix| !prefix.is_empty())
                .map(ToString::to_string);

            let is_identity = identity_names.iter().any(|identity| identity == name);
            let info =
                PropertyInfo::new(name, field.value_type, data_name, data_prefix, is_identity);

            let keep = match options.and_then(|o| o.predicate.as_ref()) {
                Some(predicate) => predicate(&info),
                None => {
                    !field.exclude && !options.is_some_and(|o| o.excluded.contains(name))
                }
            };
            if !keep {
                continue;
            }

            if is_identity && field.value_type.is_enumerable() {
                return Err(Error::descriptor_build(
                    target_type,
                    format!("identity field '{name}' is a collection"),
                ));
            }
            if !seen.insert(name) {
                return Err(Error::descriptor_build(
                    target_type,
                    format!("field '{name}' is declared more than once"),
                ));
            }

            // option map > field attribute > identity
            let converter = options
                .and_then(|o| o.converters.get(&field.value_type.kind()).cloned())
                .or_else(|| field.converter.map(Converter::from_fn))
                .unwrap_or_default();

            properties.push(PropertyDescriptor::new(info, field.getter, field.setter, converter));
        }

        let mut identity = Vec::with_capacity(identity_names.len());
        for identity_name in &identity_names {
            let index = properties
                .iter()
                .position(|property| property.property_name() == identity_name)
                .ok_or_else(|| {
                    Error::descriptor_build(
                        target_type,
                        format!("identity field '{identity_name}' is not a mapped property"),
                    )
                })?;
            if !identity.contains(&index) {
                identity.push(index);
            }
        }

        tracing::debug!(
            entity = target_type,
            shape = ?shape,
            properties = properties.len(),
            identity = identity.len(),
            "built entity descriptor"
        );

        Ok(EntityDescriptor::new(
            target_type,
            declaration.path,
            shape,
            properties,
            identity,
        ))
    }
}

impl fmt::Debug for DescriptorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorBuilder")
            .field("options", &self.options)
            .field("cached", &self.len())
            .finish()
    }
}

fn downcast<T: Entity>(
    signature: &Signature,
    stored: CachedDescriptor,
) -> Result<Arc<EntityDescriptor<T>>, Error> {
    stored.downcast::<EntityDescriptor<T>>().map_err(|_| {
        Error::internal(
            ErrorOrigin::Descriptor,
            format!("cached descriptor for '{signature}' has a foreign type"),
        )
    })
}
