//! Database handle and table discovery
//!
//! [`Database`] owns the connection and the registry of bound tables. The
//! registry mirrors the catalog: every discovery pass binds new tables,
//! rebinds tables whose columns changed, keeps unchanged bindings as they
//! are, and unbinds tables that no longer exist.

use super::config::ConnectionBuilder;
use super::error::{DatabaseError, Result};
use super::operations::{CreateTable, Operation};
use super::query_builder::TableDefinition;
use super::table::{Table, TableSchema};
use crate::backends::SqliteConnection;
use std::collections::{btree_map, BTreeMap, BTreeSet};
use tracing::{debug, info};

/// An open database with its bound tables
#[derive(Debug)]
pub struct Database {
    connection: SqliteConnection,
    registry: BTreeMap<String, Table>,
    definitions: Vec<TableDefinition>,
    create_table: CreateTable,
}

fn registry_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl Database {
    /// Open `path` with default settings and discover its tables.
    ///
    /// `path` is `:memory:`, a file path, or a `file:` URI.
    pub fn open(path: impl Into<String>) -> Result<Self> {
        ConnectionBuilder::new(path).open()
    }

    /// Start configuring a connection to `path`
    pub fn builder(path: impl Into<String>) -> ConnectionBuilder {
        ConnectionBuilder::new(path)
    }

    pub(crate) fn from_builder(builder: ConnectionBuilder) -> Result<Self> {
        let connection = SqliteConnection::open(&builder)?;
        let mut database = Self {
            create_table: CreateTable::new(connection.clone()),
            connection,
            registry: BTreeMap::new(),
            definitions: builder.definitions().to_vec(),
        };
        database.initialize_tables()?;
        Ok(database)
    }

    /// Synchronize the registry with the catalog.
    ///
    /// Tables declared on the builder are created first when missing.
    pub fn initialize_tables(&mut self) -> Result<()> {
        let mut names = self.connection.list_tables()?;

        let missing: Vec<TableDefinition> = self
            .definitions
            .iter()
            .filter(|def| !names.iter().any(|n| n.eq_ignore_ascii_case(def.name())))
            .cloned()
            .collect();
        if !missing.is_empty() {
            for definition in missing {
                self.create_table.execute(definition.if_not_exists(true))?;
            }
            names = self.connection.list_tables()?;
        }

        let (mut bound, mut rebound) = (0usize, 0usize);
        let mut seen = BTreeSet::new();
        for name in names {
            let columns = self.connection.table_info(&name)?;
            let schema = TableSchema::new(name, columns);
            let key = registry_key(schema.name());

            let changed = match self.registry.get(&key) {
                Some(existing) if existing.schema() == &schema => None,
                Some(_) => Some(&mut rebound),
                None => Some(&mut bound),
            };
            if let Some(counter) = changed {
                *counter += 1;
                self.registry
                    .insert(key.clone(), Table::bind(schema, self.connection.clone()));
            }
            seen.insert(key);
        }

        let before = self.registry.len();
        self.registry.retain(|key, _| seen.contains(key));
        let unbound = before - self.registry.len();

        debug!(
            tables = self.registry.len(),
            bound, rebound, unbound, "table discovery finished"
        );
        Ok(())
    }

    /// Bound tables, ordered by lowercase name
    pub fn tables(&self) -> btree_map::Values<'_, String, Table> {
        self.registry.values()
    }

    /// Look up a table by name, ignoring ASCII case
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.registry.get(&registry_key(name))
    }

    /// Like [`Database::table`], failing with [`DatabaseError::TableNotFound`]
    pub fn try_table(&self, name: &str) -> Result<&Table> {
        self.table(name)
            .ok_or_else(|| DatabaseError::table_not_found(name))
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.registry.values().map(Table::name).collect()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Create a table and bind it.
    ///
    /// With `if_not_exists(false)` an existing table makes this fail with
    /// the engine's error.
    pub fn create_table(&mut self, definition: TableDefinition) -> Result<Table> {
        let name = definition.name().to_string();
        self.create_table.execute(definition)?;
        self.initialize_tables()?;
        self.try_table(&name).cloned()
    }

    /// Drop one table and unbind it
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let table = self.try_table(name)?.name().to_string();
        self.drop_and_rediscover(vec![table])
    }

    /// Drop every bound table.
    ///
    /// Tables declared on the builder are recreated empty by the discovery
    /// pass that follows.
    pub fn drop_tables(&mut self) -> Result<()> {
        let names = self.table_names().into_iter().map(String::from).collect();
        self.drop_and_rediscover(names)
    }

    /// Discovery runs even when the drop fails, so the registry mirrors the
    /// catalog either way; the drop error takes precedence.
    fn drop_and_rediscover(&mut self, names: Vec<String>) -> Result<()> {
        let dropped = self.connection.drop_tables(&names);
        let discovered = self.initialize_tables();
        let count = dropped?;
        info!(tables = count, names = ?names, "dropped tables");
        discovered
    }

    /// The shared connection
    pub fn connection(&self) -> &SqliteConnection {
        &self.connection
    }

    pub fn path(&self) -> &str {
        self.connection.path()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Close the connection. Table and row handles that outlive the
    /// database fail with a connection error afterwards.
    pub fn close(mut self) -> Result<()> {
        self.registry.clear();
        self.connection.close()
    }
}

impl<'a> IntoIterator for &'a Database {
    type Item = &'a Table;
    type IntoIter = btree_map::Values<'a, String, Table>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::column_type::ColumnType;
    use crate::core::query_builder::{Params, Statement};
    use crate::fields;

    fn ddl(db: &Database, sql: &str) {
        db.connection()
            .execute(&Statement::new(sql, Params::None))
            .unwrap();
    }

    #[test]
    fn test_open_memory() {
        let db = Database::open(":memory:").unwrap();
        assert!(db.is_connected());
        assert!(db.is_empty());
        assert_eq!(db.path(), ":memory:");
    }

    #[test]
    fn test_discovery_binds_rebinds_and_unbinds() -> Result<()> {
        let mut db = Database::open(":memory:")?;
        ddl(&db, "CREATE TABLE a (id INTEGER PRIMARY KEY)");
        ddl(&db, "CREATE TABLE b (id INTEGER PRIMARY KEY)");
        db.initialize_tables()?;
        assert_eq!(db.table_names(), vec!["a", "b"]);

        let a = db.try_table("a")?.clone();
        let b = db.try_table("b")?.clone();

        ddl(&db, "ALTER TABLE b ADD COLUMN note TEXT");
        ddl(&db, "DROP TABLE a");
        db.initialize_tables()?;

        assert!(db.table("a").is_none());
        let b2 = db.try_table("B")?;
        assert!(!b2.same_binding(&b));
        assert_eq!(b2.column_names(), vec!["id", "note"]);
        assert!(a.all().is_err());
        Ok(())
    }

    #[test]
    fn test_discovery_keeps_unchanged_bindings() -> Result<()> {
        let mut db = Database::open(":memory:")?;
        let t = db.create_table(
            TableDefinition::new("t").column("id", ColumnType::integer().primary_key()),
        )?;
        db.initialize_tables()?;
        db.initialize_tables()?;
        assert!(db.try_table("t")?.same_binding(&t));
        assert_eq!(db.len(), 1);
        Ok(())
    }

    #[test]
    fn test_try_table_missing() {
        let db = Database::open(":memory:").unwrap();
        assert!(matches!(
            db.try_table("ghost"),
            Err(DatabaseError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_create_table_without_if_not_exists_fails_on_existing() -> Result<()> {
        let mut db = Database::open(":memory:")?;
        let def = TableDefinition::new("t").column("id", ColumnType::integer());
        db.create_table(def.clone())?;
        db.create_table(def.clone())?;

        let err = db.create_table(def.if_not_exists(false)).unwrap_err();
        assert!(err.is_storage_error());
        Ok(())
    }

    #[test]
    fn test_drop_tables_recreates_definitions() -> Result<()> {
        let mut db = Database::builder(":memory:")
            .define_table(
                TableDefinition::new("settings")
                    .column("key", ColumnType::text().primary_key())
                    .column("value", ColumnType::text()),
            )
            .open()?;
        db.create_table(TableDefinition::new("scratch").column("x", ColumnType::integer()))?;

        db.try_table("settings")?
            .insert()
            .one(fields! { "key" => "theme", "value" => "dark" })?;
        assert_eq!(db.len(), 2);

        db.drop_tables()?;
        assert_eq!(db.table_names(), vec!["settings"]);
        assert!(db.try_table("settings")?.all()?.is_empty());

        db.drop_table("settings")?;
        assert_eq!(db.table_names(), vec!["settings"]);
        Ok(())
    }

    #[test]
    fn test_drop_tables_with_foreign_keys() -> Result<()> {
        let mut db = Database::open(":memory:")?;
        ddl(&db, "CREATE TABLE a_scratch (id INTEGER PRIMARY KEY)");
        ddl(&db, "CREATE TABLE b_parent (id INTEGER PRIMARY KEY)");
        ddl(
            &db,
            "CREATE TABLE c_child (id INTEGER PRIMARY KEY, parent INTEGER REFERENCES b_parent(id))",
        );
        ddl(&db, "INSERT INTO b_parent VALUES (1)");
        ddl(&db, "INSERT INTO c_child VALUES (1, 1)");
        db.initialize_tables()?;
        assert_eq!(db.table_names(), vec!["a_scratch", "b_parent", "c_child"]);

        db.drop_tables()?;
        assert!(db.is_empty());
        assert!(db.connection().list_tables()?.is_empty());

        ddl(&db, "CREATE TABLE p (id INTEGER PRIMARY KEY)");
        ddl(&db, "CREATE TABLE c (id INTEGER PRIMARY KEY, p INTEGER REFERENCES p(id))");
        let orphan = db
            .connection()
            .execute(&Statement::new("INSERT INTO c VALUES (1, 99)", Params::None));
        assert!(orphan.unwrap_err().is_storage_error());
        Ok(())
    }

    #[test]
    fn test_failed_drop_still_rediscovers() -> Result<()> {
        let mut db = Database::open(":memory:")?;
        db.create_table(TableDefinition::new("gone").column("id", ColumnType::integer()))?;
        db.create_table(TableDefinition::new("kept").column("id", ColumnType::integer()))?;
        ddl(&db, "DROP TABLE gone");
        assert_eq!(db.table_names(), vec!["gone", "kept"]);

        let err = db.drop_tables().unwrap_err();
        assert!(err.is_storage_error());
        assert_eq!(db.table_names(), vec!["kept"]);
        assert_eq!(db.connection().list_tables()?, vec!["kept".to_string()]);
        Ok(())
    }

    #[test]
    fn test_close() -> Result<()> {
        let mut db = Database::open(":memory:")?;
        let t = db.create_table(TableDefinition::new("t").column("id", ColumnType::integer()))?;
        db.close()?;

        let err = t.all().unwrap_err();
        assert!(matches!(err, DatabaseError::ConnectionError(_)));
        Ok(())
    }

    #[test]
    fn test_iterate_tables() -> Result<()> {
        let mut db = Database::open(":memory:")?;
        for name in ["x", "y"] {
            db.create_table(TableDefinition::new(name).column("id", ColumnType::integer()))?;
        }
        let names: Vec<&str> = (&db).into_iter().map(Table::name).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(db.tables().count(), 2);
        Ok(())
    }
}
