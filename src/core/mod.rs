//! Core types
//!
//! Values, errors, statement builders, table handles, rows and the database
//! registry. The storage connection itself lives in [`crate::backends`].

pub mod column_type;
pub mod config;
pub mod database;
pub mod error;
pub mod operations;
pub mod query_builder;
pub mod row;
pub mod table;
pub mod value;

// Re-export commonly used types
pub use column_type::{ColumnType, SqlType};
pub use config::{ConnectionBuilder, DatabaseConfig};
pub use database::Database;
pub use error::{DatabaseError, Result};
pub use operations::{CreateTable, Delete, Insert, Operation, Select, Update};
pub use query_builder::{
    Columns, DeleteQuery, InsertQuery, Operator, Params, SelectQuery, Statement, TableDefinition,
    UpdateQuery,
};
pub use row::Row;
pub use table::{Column, Table, TableSchema};
pub use value::{DatabaseValue, Fields};
