//! # Lite Tables
//!
//! A small access layer over an embedded SQLite database. Opening a database
//! discovers its tables at runtime and binds each one to a [`Table`] handle
//! with select, insert, update and delete operations. Rows returned by a
//! select remember which columns were written and can save themselves back.
//!
//! ## Features
//!
//! - **Runtime Schema Discovery**: Tables and columns are read from the catalog, no code generation
//! - **Parameterized Statements**: Values are always bound, column names checked against the schema
//! - **Change Tracking**: Rows record written columns and update only those
//! - **Serde Integration**: Rows serialize to JSON and deserialize into your own types
//! - **Thread Safety**: One shared connection behind a `parking_lot` mutex
//!
//! ## Quick Start
//!
//! ```rust
//! use lite_tables::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut db = Database::open(":memory:")?;
//!
//!     let users = db.create_table(
//!         TableDefinition::new("users")
//!             .column("id", ColumnType::integer().primary_key())
//!             .column("name", ColumnType::text().not_null()),
//!     )?;
//!
//!     users.insert().many(vec![
//!         fields! { "id" => 1, "name" => "Alice" },
//!         fields! { "id" => 2, "name" => "Bob" },
//!     ])?;
//!
//!     for row in users.select().filter(fields! { "name" => "Bob" })? {
//!         println!("{}", row.to_json()?);
//!     }
//!
//!     let mut alice = users.get(1)?.expect("inserted above");
//!     alice.set("name", "Alicia")?;
//!     alice.save()?;
//!
//!     users.delete().ids([2])?;
//!     assert_eq!(users.all()?.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Project Structure
//!
//! ```text
//! src/
//! ├── core/
//! │   ├── column_type.rs    # Column type descriptors for CREATE TABLE
//! │   ├── config.rs         # ConnectionBuilder and DatabaseConfig
//! │   ├── database.rs       # Database registry and discovery
//! │   ├── error.rs          # Error types
//! │   ├── operations.rs     # Select/Insert/Update/Delete/CreateTable
//! │   ├── query_builder.rs  # Statement builders
//! │   ├── row.rs            # Change-tracked rows
//! │   ├── table.rs          # Table handles and schema metadata
//! │   └── value.rs          # Values and Fields
//! ├── backends/
//! │   └── sqlite.rs         # Shared SQLite connection
//! └── lib.rs
//! ```

/// Core types: values, builders, tables, rows and the database registry
pub mod core;

/// Storage connection
pub mod backends;

/// Prelude for convenient imports
///
/// ```rust
/// use lite_tables::prelude::*;
///
/// let db = Database::open(":memory:").unwrap();
/// assert!(db.is_empty());
/// ```
pub mod prelude {
    pub use crate::core::{
        ColumnType, ConnectionBuilder, Database, DatabaseError, DatabaseValue, Fields, Operation,
        Operator, Result, Row, SelectQuery, Table, TableDefinition,
    };
    pub use crate::fields;
}

// Re-export at root level for convenience
pub use self::core::{
    Column, ColumnType, Columns, ConnectionBuilder, CreateTable, Database, DatabaseConfig,
    DatabaseError, DatabaseValue, Delete, DeleteQuery, Fields, Insert, InsertQuery, Operation,
    Operator, Params, Result, Row, Select, SelectQuery, SqlType, Statement, Table,
    TableDefinition, TableSchema, Update, UpdateQuery,
};

pub use backends::SqliteConnection;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use prelude::*;

        let query = SelectQuery::new().filter("name", "x").operator(Operator::Or);
        assert_eq!(query.limit_value(), 0);

        let filter = fields! { "a" => 1 };
        assert_eq!(filter.get("a"), Some(&DatabaseValue::Integer(1)));
    }

    #[test]
    fn test_value_conversions() {
        use prelude::*;

        let val: DatabaseValue = 42.into();
        assert_eq!(val.as_i64(), Some(42));

        let val: DatabaseValue = "test".into();
        assert_eq!(val.as_string(), "test");

        let val: DatabaseValue = true.into();
        assert_eq!(val.as_bool(), Some(true));
    }
}
