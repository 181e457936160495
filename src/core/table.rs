//! Table handles
//!
//! A [`Table`] binds one table discovered in the catalog: its name, its
//! ordered column metadata, and the operations scoped to it. Handles are
//! cheap to clone and share the same schema, connection and operations.

use super::error::{DatabaseError, Result};
use super::operations::{Delete, Insert, Operation, Select, TableBinding, Update};
use super::query_builder::SelectQuery;
use super::row::Row;
use super::value::{DatabaseValue, Fields};
use crate::backends::SqliteConnection;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Column metadata as reported by `pragma_table_xinfo`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Column name as declared
    pub name: String,
    /// Declared type, empty when the column has none
    pub declared_type: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// DEFAULT expression text
    pub default: Option<String>,
    /// 1-based position within the primary key, 0 when not part of it
    pub primary_key: u32,
    /// `GENERATED ALWAYS AS`; readable but never written
    pub generated: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            not_null: false,
            default: None,
            primary_key: 0,
            generated: false,
        }
    }

    /// Make the column part of the primary key at `position` (1-based)
    #[must_use]
    pub fn primary_key(mut self, position: u32) -> Self {
        self.primary_key = position;
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    #[must_use]
    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key > 0
    }
}

/// Name and ordered columns of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    name: String,
    columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Index of `column`, matched exactly first and then ignoring ASCII case
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(column))
            })
    }

    /// The schema's spelling of `column`
    pub fn resolve(&self, column: &str) -> Result<&str> {
        self.position(column)
            .map(|i| self.columns[i].name.as_str())
            .ok_or_else(|| DatabaseError::column_not_found(format!("{}.{}", self.name, column)))
    }

    /// Rewrite the keys of `fields` to the schema's spelling, failing on
    /// names that are not columns of this table
    pub fn canonicalize(&self, fields: &Fields) -> Result<Fields> {
        let mut resolved = Fields::new();
        for (column, value) in fields.iter() {
            resolved.insert(self.resolve(column)?, value.clone());
        }
        Ok(resolved)
    }

    /// Columns an INSERT can write, in declaration order
    pub fn writable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.generated)
    }

    pub fn has_generated_columns(&self) -> bool {
        self.columns.iter().any(|c| c.generated)
    }

    /// Project `fields` onto the writable column order; absent columns
    /// become Null. Generated columns cannot be written.
    pub fn project(&self, fields: &Fields) -> Result<Vec<DatabaseValue>> {
        let mut values = vec![DatabaseValue::Null; self.columns.len()];
        for (column, value) in fields.iter() {
            let index = self.position(column).ok_or_else(|| {
                DatabaseError::column_not_found(format!("{}.{}", self.name, column))
            })?;
            if self.columns[index].generated {
                return Err(DatabaseError::invalid_argument(format!(
                    "column {}.{} is generated",
                    self.name, self.columns[index].name
                )));
            }
            values[index] = value.clone();
        }
        Ok(values
            .into_iter()
            .zip(&self.columns)
            .filter(|(_, c)| !c.generated)
            .map(|(value, _)| value)
            .collect())
    }

    /// Primary key columns ordered by key position
    pub fn primary_key(&self) -> Vec<&Column> {
        let mut keys: Vec<&Column> = self.columns.iter().filter(|c| c.is_primary_key()).collect();
        keys.sort_by_key(|c| c.primary_key);
        keys
    }
}

pub(crate) struct TableInner {
    schema: Arc<TableSchema>,
    connection: SqliteConnection,
    operations: OnceLock<Operations>,
}

struct Operations {
    select: Select,
    insert: Insert,
    update: Update,
    delete: Delete,
}

/// Handle to a bound table
#[derive(Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

impl Table {
    pub(crate) fn bind(schema: TableSchema, connection: SqliteConnection) -> Self {
        Self {
            inner: Arc::new(TableInner {
                schema: Arc::new(schema),
                connection,
                operations: OnceLock::new(),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<TableInner>) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> &str {
        self.inner.schema.name()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.inner.schema
    }

    pub fn columns(&self) -> &[Column] {
        self.inner.schema.columns()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.inner.schema.column_names()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.inner.schema.position(column).is_some()
    }

    pub fn primary_key(&self) -> Vec<&Column> {
        self.inner.schema.primary_key()
    }

    /// Whether both handles refer to the same binding
    pub fn same_binding(&self, other: &Table) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn operations(&self) -> &Operations {
        self.inner.operations.get_or_init(|| {
            let binding = TableBinding::new(
                Arc::clone(&self.inner.schema),
                self.inner.connection.clone(),
                Arc::downgrade(&self.inner),
            );
            Operations {
                select: Select::new(binding.clone()),
                insert: Insert::new(binding.clone()),
                update: Update::new(binding.clone()),
                delete: Delete::new(binding),
            }
        })
    }

    pub fn select(&self) -> &Select {
        &self.operations().select
    }

    pub fn insert(&self) -> &Insert {
        &self.operations().insert
    }

    pub fn update(&self) -> &Update {
        &self.operations().update
    }

    pub fn delete(&self) -> &Delete {
        &self.operations().delete
    }

    /// Every row of the table
    pub fn all(&self) -> Result<Vec<Row>> {
        self.select().all()
    }

    /// The first row whose `id` column equals `id`
    pub fn get(&self, id: impl Into<DatabaseValue>) -> Result<Option<Row>> {
        if !self.has_column("id") {
            return Err(DatabaseError::column_not_found(format!("{}.id", self.name())));
        }
        let rows = self
            .select()
            .execute(SelectQuery::new().filter("id", id).limit(1))?;
        Ok(rows.into_iter().next())
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name())
            .field("columns", &self.column_names())
            .finish()
    }
}
