//! Table-scoped operations
//!
//! Each bound table owns one instance of every data operation. An operation
//! builds its statement from a request type in [`query_builder`](super::query_builder),
//! runs it on the shared connection, and converts the result.

use super::error::{DatabaseError, Result};
use super::query_builder::{
    select_all_sql, DeleteQuery, InsertQuery, Params, SelectQuery, Statement, TableDefinition,
    UpdateQuery,
};
use super::row::Row;
use super::table::{Table, TableInner, TableSchema};
use super::value::{DatabaseValue, Fields};
use crate::backends::SqliteConnection;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// A unit of work that turns a request into a result
///
/// Implemented by the operations a [`Table`] exposes and by [`CreateTable`],
/// which the database owns.
///
/// # Errors
///
/// Every implementation surfaces request validation failures
/// ([`DatabaseError::InvalidArgument`], [`DatabaseError::InvalidOperator`],
/// [`DatabaseError::ColumnNotFound`]) before touching storage, and storage
/// failures as [`DatabaseError::SqliteError`].
pub trait Operation {
    /// Request accepted by the operation
    type Input;
    /// Result produced on success
    type Output;

    /// Run the request
    fn execute(&self, input: Self::Input) -> Result<Self::Output>;
}

/// What an operation needs from the table it is bound to
#[derive(Clone)]
pub(crate) struct TableBinding {
    schema: Arc<TableSchema>,
    connection: SqliteConnection,
    table: Weak<TableInner>,
}

impl TableBinding {
    pub(crate) fn new(
        schema: Arc<TableSchema>,
        connection: SqliteConnection,
        table: Weak<TableInner>,
    ) -> Self {
        Self {
            schema,
            connection,
            table,
        }
    }

    fn table(&self) -> Result<Table> {
        self.table
            .upgrade()
            .map(Table::from_inner)
            .ok_or_else(|| DatabaseError::table_not_found(self.schema.name()))
    }
}

impl std::fmt::Debug for TableBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableBinding")
            .field("table", &self.schema.name())
            .finish()
    }
}

/// SELECT on one table
#[derive(Debug)]
pub struct Select {
    binding: TableBinding,
    query: String,
}

impl Select {
    pub(crate) fn new(binding: TableBinding) -> Self {
        let query = select_all_sql(binding.schema.name());
        Self { binding, query }
    }

    /// Unfiltered query text, computed once per table
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Every row
    pub fn all(&self) -> Result<Vec<Row>> {
        self.execute(SelectQuery::new())
    }

    /// Rows matching every filter
    pub fn filter(&self, filters: Fields) -> Result<Vec<Row>> {
        self.execute(SelectQuery::new().filters(filters))
    }

    /// The first row matching every filter
    pub fn first(&self, filters: Fields) -> Result<Option<Row>> {
        let rows = self.execute(SelectQuery::new().filters(filters).limit(1))?;
        Ok(rows.into_iter().next())
    }
}

impl Operation for Select {
    type Input = SelectQuery;
    type Output = Vec<Row>;

    fn execute(&self, query: SelectQuery) -> Result<Vec<Row>> {
        let statement = if query.is_unfiltered() {
            Statement::new(self.query.as_str(), Params::None)
        } else {
            query.build(&self.binding.schema)?
        };

        let tuples = self
            .binding
            .connection
            .query(&statement, query.limit_value())?;
        let table = self.binding.table()?;
        debug!(table = table.name(), rows = tuples.len(), "selected rows");

        Ok(tuples
            .into_iter()
            .map(|values| Row::new(table.clone(), values))
            .collect())
    }
}

/// INSERT into one table
#[derive(Debug)]
pub struct Insert {
    binding: TableBinding,
}

impl Insert {
    pub(crate) fn new(binding: TableBinding) -> Self {
        Self { binding }
    }

    /// Insert a single row
    pub fn one(&self, row: Fields) -> Result<usize> {
        self.execute(InsertQuery::one(row))
    }

    /// Insert several rows as one batch
    pub fn many(&self, rows: impl IntoIterator<Item = Fields>) -> Result<usize> {
        self.execute(InsertQuery::many(rows))
    }
}

impl Operation for Insert {
    type Input = InsertQuery;
    type Output = usize;

    /// Returns the number of rows written. A batch containing a row with no
    /// non-Null value is skipped entirely and reports 0.
    fn execute(&self, query: InsertQuery) -> Result<usize> {
        let table = self.binding.schema.name();
        match query.build(&self.binding.schema)? {
            Some(statement) => {
                let inserted = self.binding.connection.execute(&statement)?;
                debug!(table, rows = inserted, "inserted rows");
                Ok(inserted)
            }
            None => {
                if !query.is_empty() {
                    warn!(
                        table,
                        rows = query.len(),
                        "skipped insert batch containing a row without values"
                    );
                }
                Ok(0)
            }
        }
    }
}

/// UPDATE on one table
#[derive(Debug)]
pub struct Update {
    binding: TableBinding,
}

impl Update {
    pub(crate) fn new(binding: TableBinding) -> Self {
        Self { binding }
    }

    /// Assign `assignments` on every row matching `filters`; empty filters
    /// update the whole table
    pub fn set(&self, assignments: Fields, filters: Fields) -> Result<usize> {
        self.execute(
            UpdateQuery::new()
                .assignments(assignments)
                .filters(filters),
        )
    }
}

impl Operation for Update {
    type Input = UpdateQuery;
    type Output = usize;

    fn execute(&self, query: UpdateQuery) -> Result<usize> {
        let statement = query.build(&self.binding.schema)?;
        let updated = self.binding.connection.execute(&statement)?;
        debug!(table = self.binding.schema.name(), rows = updated, "updated rows");
        Ok(updated)
    }
}

/// DELETE on one table
#[derive(Debug)]
pub struct Delete {
    binding: TableBinding,
}

impl Delete {
    pub(crate) fn new(binding: TableBinding) -> Self {
        Self { binding }
    }

    /// Delete the row with the given `id`
    pub fn id(&self, id: impl Into<DatabaseValue>) -> Result<usize> {
        self.execute(DeleteQuery::new().id(id))
    }

    /// Delete every row whose `id` is listed, as one batch
    pub fn ids<I, V>(&self, ids: I) -> Result<usize>
    where
        I: IntoIterator<Item = V>,
        V: Into<DatabaseValue>,
    {
        self.execute(DeleteQuery::by_ids(ids))
    }

    /// Delete every row matching all `filters`
    pub fn filter(&self, filters: Fields) -> Result<usize> {
        self.execute(DeleteQuery::new().filters(filters))
    }
}

impl Operation for Delete {
    type Input = DeleteQuery;
    type Output = usize;

    fn execute(&self, query: DeleteQuery) -> Result<usize> {
        let statement = query.build(&self.binding.schema)?;
        let deleted = self.binding.connection.execute(&statement)?;
        debug!(table = self.binding.schema.name(), rows = deleted, "deleted rows");
        Ok(deleted)
    }
}

/// CREATE TABLE, owned by the database rather than by a table
#[derive(Debug, Clone)]
pub struct CreateTable {
    connection: SqliteConnection,
}

impl CreateTable {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }
}

impl Operation for CreateTable {
    type Input = TableDefinition;
    type Output = ();

    fn execute(&self, definition: TableDefinition) -> Result<()> {
        let statement = definition.build()?;
        self.connection.execute(&statement)?;
        info!(table = definition.name(), "created table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::column_type::ColumnType;
    use crate::core::config::ConnectionBuilder;
    use crate::core::table::Column;
    use crate::fields;

    fn people() -> Table {
        let connection = SqliteConnection::open(&ConnectionBuilder::new(":memory:")).unwrap();
        CreateTable::new(connection.clone())
            .execute(
                TableDefinition::new("people")
                    .column("id", ColumnType::integer().primary_key())
                    .column("name", ColumnType::text())
                    .column("age", ColumnType::integer()),
            )
            .unwrap();
        Table::bind(
            TableSchema::new("people", connection.table_info("people").unwrap()),
            connection,
        )
    }

    #[test]
    fn test_select_query_is_cached() {
        let table = people();
        assert_eq!(table.select().query(), "SELECT * FROM people");
        assert!(std::ptr::eq(table.select(), table.select()));
    }

    #[test]
    fn test_insert_and_select() -> Result<()> {
        let table = people();
        let inserted = table.insert().many(vec![
            fields! { "id" => 1, "name" => "Ann", "age" => 30 },
            fields! { "id" => 2, "name" => "Bo" },
        ])?;
        assert_eq!(inserted, 2);

        let rows = table.select().filter(fields! { "age" => DatabaseValue::Null })?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&DatabaseValue::from("Bo")));

        let rows = table.select().execute(SelectQuery::new().limit(1))?;
        assert_eq!(rows.len(), 1);
        Ok(())
    }

    #[test]
    fn test_insert_all_null_row_skips_batch() -> Result<()> {
        let table = people();
        let inserted = table
            .insert()
            .many(vec![fields! { "id" => 1 }, fields! { "name" => DatabaseValue::Null }])?;
        assert_eq!(inserted, 0);
        assert!(table.all()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_update_and_delete() -> Result<()> {
        let table = people();
        table.insert().many((1..=4).map(|i| fields! { "id" => i, "name" => "x" }))?;

        let updated = table
            .update()
            .set(fields! { "name" => "y" }, fields! { "id" => 2 })?;
        assert_eq!(updated, 1);

        assert_eq!(table.delete().ids([1, 3, 99])?, 2);
        assert_eq!(table.delete().filter(fields! { "name" => "y" })?, 1);
        assert_eq!(table.all()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_rows_need_a_live_table() -> Result<()> {
        let table = people();
        let schema = Arc::new(table.schema().clone());
        let connection = SqliteConnection::open(&ConnectionBuilder::new(":memory:"))?;
        let orphan = Select::new(TableBinding::new(schema, connection, Weak::new()));

        let err = orphan.all().unwrap_err();
        assert!(matches!(err, DatabaseError::SqliteError(_)));

        let select = Select::new(TableBinding::new(
            Arc::new(TableSchema::new("people", vec![Column::new("id", "INTEGER")])),
            table.select().binding.connection.clone(),
            Weak::new(),
        ));
        let err = select.all().unwrap_err();
        assert!(matches!(err, DatabaseError::TableNotFound(_)));
        Ok(())
    }
}
