//! Tabular row sources.
//!
//! Two canonical shapes feed the mapper: [`DataTable`], a buffered,
//! random-access, re-iterable table, and [`RowReader`], a forward-only
//! single-pass stream. Both yield values implementing [`Row`].


use crate::{error::Error, value::Value};
use std::{collections::HashMap, sync::Arc, vec};

///
/// Row
///
/// One record of a tabular result. Name lookups fall back to a
/// case-insensitive match, as relational drivers do.
///

pub trait Row {
    fn column_count(&self) -> usize;

    fn column_name(&self, ordinal: usize) -> Option<&str>;

    fn ordinal(&self, name: &str) -> Option<usize>;

    fn get_by_ordinal(&self, ordinal: usize) -> Option<&Value>;

    fn has_column(&self, name: &str) -> bool {
        self.ordinal(name).is_some()
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.ordinal(name).and_then(|ordinal| self.get_by_ordinal(ordinal))
    }

    /// True when the column is missing or holds the source null marker.
    fn is_null(&self, name: &str) -> bool {
        self.get(name).is_none_or(Value::is_null)
    }
}

///
/// Columns
///
/// Ordered column names of a result set, shared by all of its rows.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Columns {
    names: Vec<String>,
    exact: HashMap<String, usize>,
    folded: HashMap<String, usize>,
}

impl Columns {
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns = Self::default();
        for name in names {
            columns.push(name.into());
        }

        columns
    }

    /// Append a column. Duplicate names keep their own ordinal; lookups by
    /// name resolve to the first one.
    fn push(&mut self, name: String) -> usize {
        let ordinal = self.names.len();
        self.exact.entry(name.clone()).or_insert(ordinal);
        self.folded.entry(name.to_ascii_lowercase()).or_insert(ordinal);
        self.names.push(name);

        ordinal
    }

    /// Ordinal of `name`, appending it when not present yet.
    fn intern(&mut self, name: String) -> usize {
        match self.exact.get(&name) {
            Some(&ordinal) => ordinal,
            None => self.push(name),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn name(&self, ordinal: usize) -> Option<&str> {
        self.names.get(ordinal).map(String::as_str)
    }

    #[must_use]
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.exact
            .get(name)
            .or_else(|| self.folded.get(&name.to_ascii_lowercase()))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

///
/// DataRow
///

#[derive(Clone, Debug, PartialEq)]
pub struct DataRow {
    columns: Arc<Columns>,
    values: Vec<Value>,
}

impl DataRow {
    /// Build a row; `values` must match the column count.
    pub fn new(columns: Arc<Columns>, values: Vec<Value>) -> Result<Self, Error> {
        if values.len() != columns.len() {
            return Err(Error::source(format!(
                "row has {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }

        Ok(Self { columns, values })
    }

    #[must_use]
    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl Row for DataRow {
    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, ordinal: usize) -> Option<&str> {
        self.columns.name(ordinal)
    }

    fn ordinal(&self, name: &str) -> Option<usize> {
        self.columns.ordinal(name)
    }

    fn get_by_ordinal(&self, ordinal: usize) -> Option<&Value> {
        self.values.get(ordinal)
    }
}

impl<R: Row + ?Sized> Row for &R {
    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn column_name(&self, ordinal: usize) -> Option<&str> {
        (**self).column_name(ordinal)
    }

    fn ordinal(&self, name: &str) -> Option<usize> {
        (**self).ordinal(name)
    }

    fn get_by_ordinal(&self, ordinal: usize) -> Option<&Value> {
        (**self).get_by_ordinal(ordinal)
    }
}

///
/// DataTable
///
/// Buffered result set. Random access, re-iterable.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTable {
    columns: Arc<Columns>,
    rows: Vec<DataRow>,
}

impl DataTable {
    #[must_use]
    pub fn new(columns: Columns) -> Self {
        Self {
            columns: Arc::new(columns),
            rows: Vec::new(),
        }
    }

    /// Build a table from name/value records. Columns are the union of
    /// every record's names in first-seen order; absent cells are `Null`.
    pub fn from_records<I, R, S>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let mut columns = Columns::default();
        let mut cells: Vec<Vec<(usize, Value)>> = Vec::new();

        for record in records {
            let row = record
                .into_iter()
                .map(|(name, value)| (columns.intern(name.into()), value))
                .collect();
            cells.push(row);
        }

        let width = columns.len();
        let columns = Arc::new(columns);
        let rows = cells
            .into_iter()
            .map(|row| {
                let mut values = vec![Value::Null; width];
                for (ordinal, value) in row {
                    values[ordinal] = value;
                }
                DataRow {
                    columns: Arc::clone(&columns),
                    values,
                }
            })
            .collect();

        Self { columns, rows }
    }

    /// Append a row; `values` must match the column count.
    pub fn push_row(&mut self, values: Vec<Value>) -> Result<(), Error> {
        let row = DataRow::new(Arc::clone(&self.columns), values)?;
        self.rows.push(row);

        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&DataRow> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataRow> {
        self.rows.iter()
    }

    /// Consume the table as a forward-only reader.
    #[must_use]
    pub fn into_reader(self) -> IterReader<vec::IntoIter<DataRow>> {
        IterReader::new(self.rows.into_iter())
    }
}

impl<'a> IntoIterator for &'a DataTable {
    type Item = &'a DataRow;
    type IntoIter = std::slice::Iter<'a, DataRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for DataTable {
    type Item = DataRow;
    type IntoIter = vec::IntoIter<DataRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

///
/// RowReader
///
/// Forward-only, single-pass row stream. `Ok(None)` marks the end.
///

pub trait RowReader {
    type Row: Row;

    fn read(&mut self) -> Result<Option<Self::Row>, Error>;
}

///
/// IterReader
///
/// Adapts any iterator of rows into a [`RowReader`].
///

#[derive(Debug)]
pub struct IterReader<I> {
    inner: I,
}

impl<I> IterReader<I> {
    pub const fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I> RowReader for IterReader<I>
where
    I: Iterator,
    I::Item: Row,
{
    type Row = I::Item;

    fn read(&mut self) -> Result<Option<Self::Row>, Error> {
        Ok(self.inner.next())
    }
}
