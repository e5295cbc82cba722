//! Execution strategies.
//!
//! Each strategy drives a per-index mapping function over `0..len`.
//! Parallel strategies give every worker its own partial output and merge
//! the partials once all workers are joined; failures are collected rather
//! than short-circuited.

use crate::{
    cancel::{CancellationToken, checkpoint},
    error::{Error, ErrorOrigin},
};
use rayon::{ThreadPool, prelude::*};
use serde::Deserialize;
use std::{
    fmt, thread,
    sync::atomic::{AtomicUsize, Ordering},
};

///
/// Strategy
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One row after another on the calling thread. Preserves row order.
    #[default]
    Sequential,
    /// Contiguous chunks on a bounded rayon pool. Order not guaranteed.
    Partitioned,
    /// Workers pull single row indices from a shared cursor. Random-access
    /// sources only. Order not guaranteed.
    Indexed,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Sequential => "sequential",
            Self::Partitioned => "partitioned",
            Self::Indexed => "indexed",
        };
        write!(f, "{label}")
    }
}

///
/// Partial
///
/// One worker's share of the output.
///

struct Partial<O> {
    items: Vec<O>,
    failures: Vec<Error>,
    cancelled: bool,
}

impl<O> Partial<O> {
    const fn new() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
            cancelled: false,
        }
    }

    fn record(&mut self, result: Result<O, Error>) {
        match result {
            Ok(item) => self.items.push(item),
            Err(err) => self.failures.push(err),
        }
    }
}

fn is_cancelled(token: Option<&CancellationToken>) -> bool {
    token.is_some_and(CancellationToken::is_cancelled)
}

/// Stops at the first failure.
pub(crate) fn sequential<O, F>(
    len: usize,
    token: Option<&CancellationToken>,
    f: F,
) -> Result<Vec<O>, Error>
where
    F: Fn(usize) -> Result<O, Error>,
{
    let mut out = Vec::with_capacity(len);
    for index in 0..len {
        checkpoint(token, ErrorOrigin::Mapper)?;
        out.push(f(index)?);
    }

    Ok(out)
}

pub(crate) fn partitioned<O, F>(
    pool: &ThreadPool,
    len: usize,
    chunk_size: usize,
    token: Option<&CancellationToken>,
    entity: &str,
    f: F,
) -> Result<Vec<O>, Error>
where
    O: Send,
    F: Fn(usize) -> Result<O, Error> + Sync,
{
    let chunk_size = chunk_size.max(1);

    let partials: Vec<Partial<O>> = pool.install(|| {
        (0..len)
            .into_par_iter()
            .chunks(chunk_size)
            .map(|chunk| {
                let mut partial = Partial::new();
                for index in chunk {
                    if is_cancelled(token) {
                        partial.cancelled = true;
                        break;
                    }
                    partial.record(f(index));
                }
                partial
            })
            .collect()
    });

    merge(entity, partials)
}

pub(crate) fn indexed<O, F>(
    workers: usize,
    len: usize,
    token: Option<&CancellationToken>,
    entity: &str,
    f: F,
) -> Result<Vec<O>, Error>
where
    O: Send,
    F: Fn(usize) -> Result<O, Error> + Sync,
{
    let workers = workers.clamp(1, len.max(1));
    let cursor = AtomicUsize::new(0);
    let (cursor, f) = (&cursor, &f);

    let joined = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut partial = Partial::new();
                    loop {
                        if is_cancelled(token) {
                            partial.cancelled = true;
                            break;
                        }
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        if index >= len {
                            break;
                        }
                        partial.record(f(index));
                    }
                    partial
                })
            })
            .collect();

        handles
            .into_iter()
            .map(thread::ScopedJoinHandle::join)
            .collect::<Vec<_>>()
    });

    let mut partials = Vec::with_capacity(joined.len());
    for result in joined {
        let partial = result
            .map_err(|_| Error::internal(ErrorOrigin::Mapper, "mapping worker panicked"))?;
        partials.push(partial);
    }

    merge(entity, partials)
}

/// Concatenate worker outputs. Cancellation wins over failures; failures
/// are reported together, ordered by row.
fn merge<O>(entity: &str, partials: Vec<Partial<O>>) -> Result<Vec<O>, Error> {
    let mut items = Vec::new();
    let mut failures = Vec::new();
    let mut cancelled = false;

    for partial in partials {
        items.extend(partial.items);
        failures.extend(partial.failures);
        cancelled |= partial.cancelled;
    }

    if cancelled {
        return Err(Error::cancelled(ErrorOrigin::Mapper));
    }

    if !failures.is_empty() {
        failures.sort_by_key(|err| err.conversion_detail().and_then(|detail| detail.row));
        tracing::warn!(entity, failures = failures.len(), "parallel mapping failed");

        return Err(Error::aggregate(entity, failures));
    }

    Ok(items)
}

///
/// TESTS
///
