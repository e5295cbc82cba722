use crate::{
    cancel::CancellationToken,
    error::{Error, ErrorOrigin},
    mapper::{Materialized, RowMapper},
    model::EntityDescriptor,
    source::Row,
    traits::Entity,
};
use std::{iter::FusedIterator, sync::Arc};

///
/// MapIter
///
/// Lazy, sequential mapping over a row iterator. Yields one result per row
/// and stops after the first error.
///

pub struct MapIter<'a, T, I> {
    mapper: &'a RowMapper,
    descriptor: Arc<EntityDescriptor<T>>,
    rows: I,
    index: usize,
    cancellation: Option<CancellationToken>,
    done: bool,
}

impl<'a, T, I> MapIter<'a, T, I> {
    pub(crate) const fn new(
        mapper: &'a RowMapper,
        descriptor: Arc<EntityDescriptor<T>>,
        rows: I,
        cancellation: Option<CancellationToken>,
    ) -> Self {
        Self {
            mapper,
            descriptor,
            rows,
            index: 0,
            cancellation,
            done: false,
        }
    }

    /// Stop at the next row once `token` fires.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

impl<T, I> Iterator for MapIter<'_, T, I>
where
    T: Entity,
    I: Iterator,
    I::Item: Row,
{
    type Item = Result<Materialized<T>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(token) = &self.cancellation
            && let Err(err) = token.check(ErrorOrigin::Mapper)
        {
            self.done = true;
            return Some(Err(err));
        }

        let Some(row) = self.rows.next() else {
            self.done = true;
            return None;
        };

        let result = self
            .mapper
            .materialize(&self.descriptor, &row, self.index, None);
        self.index += 1;
        self.done = result.is_err();

        Some(result)
    }
}

impl<T, I> FusedIterator for MapIter<'_, T, I>
where
    T: Entity,
    I: Iterator,
    I::Item: Row,
{
}
