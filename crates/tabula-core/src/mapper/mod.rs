//! Row mapping.
//!
//! A [`RowMapper`] resolves the cached descriptor of the target type once,
//! then per row: creates a fresh instance, populates every property whose
//! column holds a non-null value, resolves the instance identity and emits
//! it. Instances are never shared across rows or threads.

mod iter;
mod strategy;


pub use iter::MapIter;
pub use strategy::Strategy;

use crate::{
    DEFAULT_CHUNK_SIZE,
    builder::{DescriptorBuilder, DescriptorOptions},
    cancel::{CancellationToken, checkpoint},
    config::{ExecutionConfig, MapperConfig},
    error::{ConversionError, Error, ErrorDetail, ErrorOrigin},
    identity::{Identity, IdentityResolver},
    model::{EntityDescriptor, PropertyDescriptor, TypeShape},
    source::{DataTable, Row, RowReader},
    traits::Entity,
    value::Value,
};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{
    collections::HashMap,
    fmt,
    num::NonZeroUsize,
    sync::{Arc, Mutex, PoisonError},
    thread,
};

///
/// MapOptions
///
/// Per-call execution settings.
///

#[derive(Clone, Debug)]
pub struct MapOptions {
    pub strategy: Strategy,
    /// Worker count; the available parallelism when unset.
    pub degree_of_parallelism: Option<usize>,
    /// Rows per partition (`Partitioned`) and per streamed batch slice.
    pub chunk_size: usize,
    pub cancellation: Option<CancellationToken>,
}

impl MapOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self {
            strategy: config.strategy,
            degree_of_parallelism: config.degree_of_parallelism,
            chunk_size: config.chunk_size,
            cancellation: None,
        }
    }

    #[must_use]
    pub const fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub const fn with_parallelism(mut self, workers: usize) -> Self {
        self.degree_of_parallelism = Some(workers);
        self
    }

    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Effective worker count, never zero.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.degree_of_parallelism
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, NonZeroUsize::get))
            .max(1)
    }
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            degree_of_parallelism: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cancellation: None,
        }
    }
}

///
/// Materialized
///
/// One emitted instance together with its resolved identity and, for
/// nested mappings, the identity of its parent.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Materialized<T> {
    pub identity: Identity,
    pub parent: Option<Identity>,
    pub value: T,
}

impl<T> Materialized<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}

///
/// RowMapper
///

pub struct RowMapper {
    builder: Arc<DescriptorBuilder>,
    resolver: Arc<IdentityResolver>,
    defaults: MapOptions,
    /// Most recently used pool, keyed by its worker count.
    pool: Mutex<Option<(usize, Arc<ThreadPool>)>>,
}

impl RowMapper {
    #[must_use]
    pub fn new(builder: Arc<DescriptorBuilder>, resolver: Arc<IdentityResolver>) -> Self {
        Self {
            builder,
            resolver,
            defaults: MapOptions::default(),
            pool: Mutex::new(None),
        }
    }

    /// Mapper wired from a loaded config. The configured naming convention
    /// becomes the default for every type in `options`.
    #[must_use]
    pub fn from_config(config: &MapperConfig, options: DescriptorOptions) -> Self {
        let builder = DescriptorBuilder::new(options.naming(config.naming.convention));
        let resolver = IdentityResolver::from_config(&config.identity);

        Self::new(Arc::new(builder), Arc::new(resolver))
            .with_defaults(MapOptions::from_config(&config.mapper))
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: MapOptions) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub const fn builder(&self) -> &Arc<DescriptorBuilder> {
        &self.builder
    }

    #[must_use]
    pub const fn resolver(&self) -> &Arc<IdentityResolver> {
        &self.resolver
    }

    #[must_use]
    pub const fn defaults(&self) -> &MapOptions {
        &self.defaults
    }

    pub fn descriptor<T: Entity>(
        &self,
        shape: TypeShape,
    ) -> Result<Arc<EntityDescriptor<T>>, Error> {
        self.builder.build::<T>(shape)
    }

    /// Map every row of `rows` with the given options.
    pub fn map<T, R>(&self, rows: &[R], options: &MapOptions) -> Result<Vec<Materialized<T>>, Error>
    where
        T: Entity,
        R: Row + Sync,
    {
        let descriptor = self.descriptor::<T>(TypeShape::Enumerable)?;

        self.dispatch(&descriptor, rows.len(), options, |index| {
            self.materialize(&descriptor, &rows[index], index, None)
        })
    }

    /// Map a buffered table with this mapper's default options.
    pub fn map_table<T: Entity>(&self, table: &DataTable) -> Result<Vec<Materialized<T>>, Error> {
        self.map(table.rows(), &self.defaults)
    }

    /// Map the first row only; `None` for an empty source.
    pub fn map_one<T, R>(&self, rows: &[R]) -> Result<Option<Materialized<T>>, Error>
    where
        T: Entity,
        R: Row,
    {
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let descriptor = self.descriptor::<T>(TypeShape::Nullable)?;

        self.materialize(&descriptor, row, 0, None).map(Some)
    }

    /// Map rows and fold rows sharing an identity into one instance.
    ///
    /// The first row of a group creates the instance; later rows of the
    /// group only contribute their collection elements. Groups are emitted
    /// in order of first appearance whatever the strategy.
    pub fn map_merged<T, R>(&self, rows: &[R], options: &MapOptions) -> Result<Vec<T>, Error>
    where
        T: Entity,
        R: Row + Sync,
    {
        let descriptor = self.descriptor::<T>(TypeShape::Enumerable)?;

        let mut mapped = self.dispatch(&descriptor, rows.len(), options, |index| {
            self.materialize(&descriptor, &rows[index], index, None)
                .map(|item| (index, item))
        })?;
        mapped.sort_unstable_by_key(|(index, _)| *index);

        let mut groups: Vec<T> = Vec::new();
        let mut seen: HashMap<Identity, usize> = HashMap::new();

        for (index, item) in mapped {
            if let Some(&group) = seen.get(&item.identity) {
                absorb(&descriptor, &mut groups[group], &item.value, index)?;
            } else {
                seen.insert(item.identity, groups.len());
                groups.push(item.value);
            }
        }

        tracing::debug!(
            entity = descriptor.target_type(),
            rows = rows.len(),
            groups = groups.len(),
            "merged rows by identity"
        );

        Ok(groups)
    }

    /// Drain a forward-only reader. `Partitioned` maps buffered batches in
    /// parallel; `Indexed` needs random access and is rejected.
    pub fn map_reader<T, Rd>(
        &self,
        mut reader: Rd,
        options: &MapOptions,
    ) -> Result<Vec<Materialized<T>>, Error>
    where
        T: Entity,
        Rd: RowReader,
        Rd::Row: Sync,
    {
        let descriptor = self.descriptor::<T>(TypeShape::Enumerable)?;
        let token = options.cancellation.as_ref();

        match options.strategy {
            Strategy::Indexed => Err(Error::configuration(
                ErrorOrigin::Mapper,
                "the indexed strategy needs a random-access source; buffer the reader into a table",
            )),

            Strategy::Sequential => {
                let mut out = Vec::new();
                let mut index = 0;
                while let Some(row) = reader.read()? {
                    checkpoint(token, ErrorOrigin::Mapper)?;
                    out.push(self.materialize(&descriptor, &row, index, None)?);
                    index += 1;
                }

                Ok(out)
            }

            Strategy::Partitioned => {
                let pool = self.pool(options.workers())?;
                let batch_len = options.chunk_size.max(1).saturating_mul(options.workers());

                let mut out = Vec::new();
                let mut failures = Vec::new();
                let mut offset = 0;
                let mut batch = Vec::with_capacity(batch_len);

                loop {
                    checkpoint(token, ErrorOrigin::Mapper)?;

                    batch.clear();
                    while batch.len() < batch_len {
                        match reader.read()? {
                            Some(row) => batch.push(row),
                            None => break,
                        }
                    }
                    if batch.is_empty() {
                        break;
                    }

                    let result = strategy::partitioned(
                        &pool,
                        batch.len(),
                        options.chunk_size,
                        token,
                        descriptor.target_type(),
                        |index| self.materialize(&descriptor, &batch[index], offset + index, None),
                    );
                    match result {
                        Ok(items) => out.extend(items),
                        Err(err) if err.is_cancelled() => return Err(err),
                        Err(mut err) => match err.detail.take() {
                            Some(ErrorDetail::Aggregate(batch_failures)) => {
                                failures.extend(batch_failures);
                            }
                            detail => {
                                err.detail = detail;
                                return Err(err);
                            }
                        },
                    }

                    offset += batch.len();
                }

                if !failures.is_empty() {
                    tracing::warn!(
                        entity = descriptor.target_type(),
                        failures = failures.len(),
                        "streamed mapping failed"
                    );
                    return Err(Error::aggregate(descriptor.target_type(), failures));
                }

                Ok(out)
            }
        }
    }

    /// Lazily map `rows` one at a time on the calling thread.
    pub fn iter<T, I>(&self, rows: I) -> Result<MapIter<'_, T, I::IntoIter>, Error>
    where
        T: Entity,
        I: IntoIterator,
        I::Item: Row,
    {
        let descriptor = self.descriptor::<T>(TypeShape::Enumerable)?;

        Ok(MapIter::new(
            self,
            descriptor,
            rows.into_iter(),
            self.defaults.cancellation.clone(),
        ))
    }

    /// Map a nested entity from the same row as `parent`, recording the
    /// parent's identity on the child.
    pub fn map_child<C, P, R>(
        &self,
        parent: &Materialized<P>,
        row: &R,
    ) -> Result<Materialized<C>, Error>
    where
        C: Entity,
        R: Row + ?Sized,
    {
        let descriptor = self.descriptor::<C>(TypeShape::Single)?;

        self.materialize(&descriptor, row, 0, Some(&parent.identity))
    }

    fn dispatch<T, O, F>(
        &self,
        descriptor: &EntityDescriptor<T>,
        len: usize,
        options: &MapOptions,
        f: F,
    ) -> Result<Vec<O>, Error>
    where
        O: Send,
        F: Fn(usize) -> Result<O, Error> + Sync,
    {
        let entity = descriptor.target_type();
        let token = options.cancellation.as_ref();

        tracing::debug!(entity, rows = len, strategy = %options.strategy, "mapping rows");

        let out = match options.strategy {
            Strategy::Sequential => strategy::sequential(len, token, f),
            Strategy::Partitioned => {
                let pool = self.pool(options.workers())?;
                strategy::partitioned(&pool, len, options.chunk_size, token, entity, f)
            }
            Strategy::Indexed => strategy::indexed(options.workers(), len, token, entity, f),
        }?;

        tracing::debug!(entity, emitted = out.len(), "mapped rows");

        Ok(out)
    }

    /// Populate, identify and emit one row.
    pub(crate) fn materialize<T, R>(
        &self,
        descriptor: &Arc<EntityDescriptor<T>>,
        row: &R,
        index: usize,
        parent: Option<&Identity>,
    ) -> Result<Materialized<T>, Error>
    where
        T: Entity,
        R: Row + ?Sized,
    {
        let mut entity = descriptor.instantiate();
        if let Some(parent) = parent {
            entity = entity.with_parent(parent.clone());
        }

        for property in descriptor.properties() {
            let Some(raw) = row.get(property.column()) else {
                continue;
            };
            if raw.is_null() {
                continue;
            }

            let converted = property
                .convert(raw.clone())
                .map_err(|err| field_error(descriptor, property, raw, index, err.to_string()))?;
            if converted.is_null() {
                continue;
            }

            property
                .set(entity.instance_mut(), converted)
                .map_err(|err| field_error(descriptor, property, raw, index, err.to_string()))?;
        }

        self.resolver
            .resolve(&mut entity)
            .map_err(|err| at_row(err, index))?;

        let (value, identity, parent) = entity.into_parts();
        let identity = identity.ok_or_else(|| {
            Error::internal(ErrorOrigin::Identity, "instance emitted without an identity")
        })?;

        Ok(Materialized {
            identity,
            parent,
            value,
        })
    }

    /// Pool with `workers` threads. Only the latest pool is kept; a
    /// different worker count replaces it once in-flight runs release it.
    fn pool(&self, workers: usize) -> Result<Arc<ThreadPool>, Error> {
        let mut current = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((size, pool)) = current.as_ref()
            && *size == workers
        {
            return Ok(Arc::clone(pool));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("tabula-map-{index}"))
            .build()
            .map_err(|err| {
                Error::internal(ErrorOrigin::Mapper, format!("cannot start mapping pool: {err}"))
            })?;
        let pool = Arc::new(pool);
        *current = Some((workers, Arc::clone(&pool)));

        tracing::debug!(workers, "started mapping pool");

        Ok(pool)
    }
}

impl Default for RowMapper {
    fn default() -> Self {
        Self::new(Arc::default(), Arc::default())
    }
}

impl fmt::Debug for RowMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowMapper")
            .field("builder", &self.builder)
            .field("fallback", &self.resolver.fallback())
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

/// Append the collection elements of `later` onto `first`.
fn absorb<T>(
    descriptor: &EntityDescriptor<T>,
    first: &mut T,
    later: &T,
    index: usize,
) -> Result<(), Error> {
    for property in descriptor.collection_properties() {
        let value = property.get(later);
        let empty = match &value {
            Value::Null => true,
            Value::List(items) => items.is_empty(),
            _ => false,
        };
        if empty {
            continue;
        }

        property
            .set(first, value.clone())
            .map_err(|err| field_error(descriptor, property, &value, index, err.to_string()))?;
    }

    Ok(())
}

fn field_error<T>(
    descriptor: &EntityDescriptor<T>,
    property: &PropertyDescriptor<T>,
    raw: &Value,
    index: usize,
    reason: String,
) -> Error {
    Error::conversion(ConversionError {
        entity: descriptor.target_type().to_string(),
        field: property.property_name().to_string(),
        column: property.column().to_string(),
        value: raw.clone(),
        row: Some(index),
        reason,
    })
}

/// Stamp the row index on a conversion error raised without one.
fn at_row(mut err: Error, index: usize) -> Error {
    if let Some(ErrorDetail::Conversion(detail)) = &mut err.detail
        && detail.row.is_none()
    {
        detail.row = Some(index);
        err.message = detail.to_string();
    }

    err
}
