use crate::{
    model::{Converter, PropertyInfo},
    naming::NamingConvention,
    traits::Entity,
    value::ValueKind,
};
use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
};

/// Conditional-mapping predicate; a field is kept only if it returns true.
pub type FieldPredicate = Arc<dyn Fn(&PropertyInfo) -> bool + Send + Sync>;

///
/// EntityOptions
///
/// Runtime overrides for one entity type. Everything here wins over the
/// type's static declaration.
///

#[derive(Clone, Default)]
pub struct EntityOptions {
    pub(crate) columns: HashMap<String, String>,
    pub(crate) prefixes: HashMap<String, String>,
    pub(crate) default_prefix: Option<String>,
    pub(crate) identity: Option<Vec<String>>,
    pub(crate) converters: HashMap<ValueKind, Converter>,
    pub(crate) excluded: HashSet<String>,
    pub(crate) predicate: Option<FieldPredicate>,
    pub(crate) naming: Option<NamingConvention>,
}

impl EntityOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `property` from `column` instead of its declared column.
    #[must_use]
    pub fn column(mut self, property: impl Into<String>, column: impl Into<String>) -> Self {
        self.columns.insert(property.into(), column.into());
        self
    }

    /// Field-level prefix override.
    #[must_use]
    pub fn prefix(mut self, property: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.prefixes.insert(property.into(), prefix.into());
        self
    }

    /// Type-level prefix applied to fields without their own.
    #[must_use]
    pub fn default_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.default_prefix = Some(prefix.into());
        self
    }

    /// Replace the declared identity field list.
    #[must_use]
    pub fn identity<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identity = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Converter for every field of value kind `kind`.
    #[must_use]
    pub fn converter(mut self, kind: ValueKind, converter: Converter) -> Self {
        self.converters.insert(kind, converter);
        self
    }

    #[must_use]
    pub fn exclude(mut self, property: impl Into<String>) -> Self {
        self.excluded.insert(property.into());
        self
    }

    /// Enable conditional mapping. Exclusion lists and markers are ignored
    /// while a predicate is set.
    #[must_use]
    pub fn include_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PropertyInfo) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn naming(mut self, naming: NamingConvention) -> Self {
        self.naming = Some(naming);
        self
    }
}

impl fmt::Debug for EntityOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityOptions")
            .field("columns", &self.columns)
            .field("prefixes", &self.prefixes)
            .field("default_prefix", &self.default_prefix)
            .field("identity", &self.identity)
            .field("converters", &self.converters)
            .field("excluded", &self.excluded)
            .field("conditional", &self.predicate.is_some())
            .field("naming", &self.naming)
            .finish()
    }
}

///
/// DescriptorOptions
///
/// Options for every type a builder serves, keyed by qualified type name.
/// Fixed for the lifetime of the builder that owns them.
///

#[derive(Clone, Debug, Default)]
pub struct DescriptorOptions {
    pub(crate) naming: NamingConvention,
    pub(crate) entities: HashMap<&'static str, EntityOptions>,
}

impl DescriptorOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default naming convention for every type.
    #[must_use]
    pub fn naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    /// Register overrides for entity type `T`.
    #[must_use]
    pub fn entity<T: Entity>(mut self, options: EntityOptions) -> Self {
        self.entities.insert(std::any::type_name::<T>(), options);
        self
    }

    pub(crate) fn for_type(&self, type_name: &str) -> Option<&EntityOptions> {
        self.entities.get(type_name)
    }
}
