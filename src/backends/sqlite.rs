//! SQLite connection backend
//!
//! [`SqliteConnection`] is the single connection shared by a database, its
//! tables, their operations and the rows they return. Calls are serialized
//! through a mutex; every mutating statement runs in its own transaction and
//! is committed before returning.

use crate::core::config::ConnectionBuilder;
use crate::core::error::{DatabaseError, Result};
use crate::core::query_builder::{drop_table_sql, Params, Statement};
use crate::core::table::Column;
use crate::core::value::DatabaseValue;
use parking_lot::Mutex;
use rusqlite::types::ToSql;
use rusqlite::{params_from_iter, Connection, OpenFlags, Rows};
use std::sync::Arc;
use tracing::{debug, info};

/// Catalog query listing user tables; `sqlite_*` tables belong to the engine
const LIST_TABLES_SQL: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' ORDER BY name";

/// `SELECT *` result columns: ordinary and generated, without hidden ones
const TABLE_INFO_SQL: &str = "SELECT name, type, \"notnull\", dflt_value, pk, hidden \
     FROM pragma_table_xinfo(?1) WHERE hidden != 1 ORDER BY cid";

/// Shared SQLite connection handle
#[derive(Clone)]
pub struct SqliteConnection {
    connection: Arc<Mutex<Option<Connection>>>,
    path: Arc<str>,
}

impl SqliteConnection {
    /// Open a connection with the builder's settings
    pub fn open(builder: &ConnectionBuilder) -> Result<Self> {
        let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if builder.is_read_only() {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        }

        let conn = Connection::open_with_flags(builder.path(), flags)?;

        if let Some(timeout) = builder.busy_timeout_value() {
            conn.busy_timeout(timeout)?;
        }
        if builder.foreign_keys_enabled() {
            conn.execute_batch("PRAGMA foreign_keys = ON")?;
        }
        for (name, value) in builder.pragmas() {
            conn.execute_batch(&format!("PRAGMA {} = {}", name, value))?;
        }

        info!(path = builder.path(), "opened sqlite database");
        Ok(Self {
            connection: Arc::new(Mutex::new(Some(conn))),
            path: Arc::from(builder.path()),
        })
    }

    /// Storage location this connection was opened on
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_connected(&self) -> bool {
        self.connection.lock().is_some()
    }

    /// Close the connection; later calls fail with a connection error
    pub fn close(&self) -> Result<()> {
        let mut connection = self.connection.lock();
        if let Some(conn) = connection.take() {
            if let Err((conn, err)) = conn.close() {
                *connection = Some(conn);
                return Err(err.into());
            }
            info!(path = %self.path, "closed sqlite database");
        }
        Ok(())
    }

    fn with_connection<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut connection = self.connection.lock();
        let conn = connection
            .as_mut()
            .ok_or_else(|| DatabaseError::connection("Not connected to database"))?;
        f(conn)
    }

    /// Run a query and return raw tuples in result-column order.
    ///
    /// At most `limit` rows are fetched; 0 fetches everything.
    pub fn query(&self, statement: &Statement, limit: usize) -> Result<Vec<Vec<DatabaseValue>>> {
        debug!(
            sql = statement.sql(),
            params = statement.params().len(),
            "executing query"
        );

        self.with_connection(|conn| {
            let mut stmt = conn.prepare(statement.sql())?;
            let width = stmt.column_count();

            let rows = match statement.params() {
                Params::None => stmt.query([])?,
                Params::Named(named) => {
                    let bound = named_params(named);
                    stmt.query(bound.as_slice())?
                }
                Params::Positional(values) => stmt.query(params_from_iter(values.iter()))?,
                Params::Batch(_) => {
                    return Err(DatabaseError::invalid_argument(
                        "batched parameters cannot be used for a query",
                    ))
                }
            };

            collect_rows(rows, width, limit)
        })
    }

    /// Execute a mutating statement inside a transaction and commit.
    ///
    /// Batched parameters execute the prepared statement once per set; a
    /// failure rolls back the whole batch. Returns the affected row count.
    pub fn execute(&self, statement: &Statement) -> Result<usize> {
        debug!(
            sql = statement.sql(),
            params = statement.params().len(),
            "executing statement"
        );

        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            let affected = {
                let mut stmt = tx.prepare(statement.sql())?;
                match statement.params() {
                    Params::None => stmt.execute([])?,
                    Params::Named(named) => {
                        let bound = named_params(named);
                        stmt.execute(bound.as_slice())?
                    }
                    Params::Positional(values) => stmt.execute(params_from_iter(values.iter()))?,
                    Params::Batch(batch) => {
                        let mut total = 0;
                        for values in batch {
                            total += stmt.execute(params_from_iter(values.iter()))?;
                        }
                        total
                    }
                }
            };
            tx.commit()?;
            Ok(affected)
        })
    }

    /// Drop `tables` in one transaction with foreign key enforcement
    /// suspended, so parents and children can go in any order. Enforcement
    /// is restored afterwards whether or not the drop succeeded.
    pub fn drop_tables(&self, tables: &[String]) -> Result<usize> {
        self.with_connection(|conn| {
            let enforced: bool = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
            if enforced {
                conn.execute_batch("PRAGMA foreign_keys = OFF")?;
            }

            let dropped = drop_all(conn, tables);

            if enforced {
                conn.execute_batch("PRAGMA foreign_keys = ON")?;
            }
            let dropped = dropped?;
            debug!(tables = dropped, "dropped tables");
            Ok(dropped)
        })
    }

    /// Names of the user tables in the catalog
    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(LIST_TABLES_SQL)?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(names)
        })
    }

    /// Column metadata of `table` in declaration order
    pub fn table_info(&self, table: &str) -> Result<Vec<Column>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(TABLE_INFO_SQL)?;
            let columns = stmt
                .query_map([table], |row| {
                    Ok(Column {
                        name: row.get(0)?,
                        declared_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        not_null: row.get::<_, i64>(2)? != 0,
                        default: row.get(3)?,
                        primary_key: row.get::<_, u32>(4)?,
                        generated: row.get::<_, i64>(5)? >= 2,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(columns)
        })
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .field(
                "connected",
                &self.connection.try_lock().map(|conn| conn.is_some()),
            )
            .finish()
    }
}

fn drop_all(conn: &mut Connection, tables: &[String]) -> Result<usize> {
    let tx = conn.transaction()?;
    for table in tables {
        tx.execute_batch(&drop_table_sql(table))?;
    }
    tx.commit()?;
    Ok(tables.len())
}

fn named_params(named: &[(String, DatabaseValue)]) -> Vec<(&str, &dyn ToSql)> {
    named
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}

fn collect_rows(mut rows: Rows<'_>, width: usize, limit: usize) -> Result<Vec<Vec<DatabaseValue>>> {
    let mut results = Vec::new();
    while let Some(row) = rows.next()? {
        let mut tuple = Vec::with_capacity(width);
        for i in 0..width {
            tuple.push(row.get::<_, DatabaseValue>(i)?);
        }
        results.push(tuple);

        if limit != 0 && results.len() == limit {
            break;
        }
    }
    Ok(results)
}
