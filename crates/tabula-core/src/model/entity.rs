use crate::{
    identity::Identity,
    model::field::{FieldDeclaration, PropertyDescriptor},
    naming::NamingConvention,
};
use std::{collections::HashMap, fmt, sync::Arc};

///
/// EntityDeclaration
/// Static, derive-generated description of one entity type.
///

pub struct EntityDeclaration<T> {
    /// Fully-qualified Rust type path (for diagnostics).
    pub path: &'static str,
    /// Type-level default column prefix.
    pub prefix: Option<&'static str>,
    /// Naming convention for fields without an explicit column.
    pub naming: Option<NamingConvention>,
    /// Identity field names, in key order.
    pub identity: &'static [&'static str],
    /// Ordered field list.
    pub fields: Vec<FieldDeclaration<T>>,
}

impl<T> EntityDeclaration<T> {
    #[must_use]
    pub const fn new(path: &'static str) -> Self {
        Self {
            path,
            prefix: None,
            naming: None,
            identity: &[],
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = Some(prefix);
        self
    }

    #[must_use]
    pub fn naming(mut self, naming: NamingConvention) -> Self {
        self.naming = Some(naming);
        self
    }

    #[must_use]
    pub fn identity(mut self, identity: &'static [&'static str]) -> Self {
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDeclaration<T>) -> Self {
        self.fields.push(field);
        self
    }
}

///
/// TypeShape
///
/// How the target type is requested: the plain type, its nullable form, or
/// a collection of it. The element type is always the one introspected.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum TypeShape {
    #[default]
    Single,
    Nullable,
    Enumerable,
}

impl TypeShape {
    /// Marker appended to the type name in cache signatures.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Single => "",
            Self::Nullable => "?",
            Self::Enumerable => "[]",
        }
    }
}

///
/// EntityDescriptor
///
/// Shared, immutable shape of one target type: its ordered property
/// descriptors plus type-level flags. Built once per signature and reused
/// for every row of that type.
///

pub struct EntityDescriptor<T> {
    target_type: &'static str,
    path: &'static str,
    shape: TypeShape,
    properties: Vec<PropertyDescriptor<T>>,
    by_name: HashMap<&'static str, usize>,
    identity: Vec<usize>,
}

impl<T> EntityDescriptor<T> {
    /// Assemble a descriptor. Callers guarantee unique property names and
    /// that `identity` indexes scalar properties.
    pub(crate) fn new(
        target_type: &'static str,
        path: &'static str,
        shape: TypeShape,
        properties: Vec<PropertyDescriptor<T>>,
        identity: Vec<usize>,
    ) -> Self {
        let by_name = properties
            .iter()
            .enumerate()
            .map(|(index, property)| (property.property_name(), index))
            .collect();

        Self {
            target_type,
            path,
            shape,
            properties,
            by_name,
            identity,
        }
    }

    /// Qualified Rust type name (`std::any::type_name`).
    #[must_use]
    pub const fn target_type(&self) -> &'static str {
        self.target_type
    }

    /// Declared path of the type.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    #[must_use]
    pub const fn shape(&self) -> TypeShape {
        self.shape
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        matches!(self.shape, TypeShape::Nullable)
    }

    #[must_use]
    pub const fn is_enumerable(&self) -> bool {
        matches!(self.shape, TypeShape::Enumerable)
    }

    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor<T>] {
        &self.properties
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor<T>> {
        self.by_name.get(name).map(|&index| &self.properties[index])
    }

    /// Identity properties in key order.
    pub fn identity_properties(&self) -> impl Iterator<Item = &PropertyDescriptor<T>> {
        self.identity.iter().map(|&index| &self.properties[index])
    }

    #[must_use]
    pub fn has_identity(&self) -> bool {
        !self.identity.is_empty()
    }

    /// Enumerable properties; the ones that accumulate across merged rows.
    pub fn collection_properties(&self) -> impl Iterator<Item = &PropertyDescriptor<T>> {
        self.properties
            .iter()
            .filter(|property| property.value_type().is_enumerable())
    }
}

impl<T: Default> EntityDescriptor<T> {
    /// Start a fresh instance of this type.
    #[must_use]
    pub fn instantiate(self: &Arc<Self>) -> EntityInstance<T> {
        EntityInstance {
            descriptor: Arc::clone(self),
            instance: T::default(),
            parent: None,
            identity: None,
        }
    }
}

impl<T> fmt::Debug for EntityDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("target_type", &self.target_type)
            .field("shape", &self.shape)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

///
/// EntityInstance
///
/// The object currently being populated for one row (or one row group).
/// Owned exclusively by the task mapping it.
///

pub struct EntityInstance<T> {
    descriptor: Arc<EntityDescriptor<T>>,
    instance: T,
    parent: Option<Identity>,
    identity: Option<Identity>,
}

impl<T> EntityInstance<T> {
    #[must_use]
    pub fn descriptor(&self) -> &EntityDescriptor<T> {
        &self.descriptor
    }

    #[must_use]
    pub const fn instance(&self) -> &T {
        &self.instance
    }

    pub const fn instance_mut(&mut self) -> &mut T {
        &mut self.instance
    }

    /// Identity of the owning entity for nested mappings.
    #[must_use]
    pub const fn parent(&self) -> Option<&Identity> {
        self.parent.as_ref()
    }

    #[must_use]
    pub fn with_parent(mut self, parent: Identity) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Assign the identity once; later calls keep the first value.
    pub(crate) fn assign_identity(&mut self, identity: Identity) -> &Identity {
        self.identity.get_or_insert(identity)
    }

    pub fn into_parts(self) -> (T, Option<Identity>, Option<Identity>) {
        (self.instance, self.identity, self.parent)
    }
}
