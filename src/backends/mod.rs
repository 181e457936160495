//! Storage backends
//!
//! This module contains the connection layer the tables and operations run
//! on. SQLite is the only engine.

pub mod sqlite;

pub use sqlite::SqliteConnection;
