//! Column type descriptors
//!
//! A [`ColumnType`] renders into the fragment that follows a column name in
//! a `CREATE TABLE` definition, e.g. `INTEGER NOT NULL UNIQUE DEFAULT 10`.

use super::value::DatabaseValue;
use std::fmt;

/// SQLite type affinities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// INTEGER affinity
    Integer,
    /// REAL affinity
    Real,
    /// TEXT affinity
    Text,
    /// BLOB affinity
    Blob,
    /// NUMERIC affinity
    Numeric,
}

impl SqlType {
    /// Keyword used in column definitions
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
            SqlType::Blob => "BLOB",
            SqlType::Numeric => "NUMERIC",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Logical column type with its constraints.
///
/// # Example
///
/// ```
/// use lite_tables::ColumnType;
///
/// let column = ColumnType::integer().not_null().unique().default(10);
/// assert_eq!(column.to_string(), "INTEGER NOT NULL UNIQUE DEFAULT 10");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnType {
    sql_type: SqlType,
    primary_key: bool,
    nullable: bool,
    unique: bool,
    default: Option<DatabaseValue>,
}

impl ColumnType {
    /// Create a nullable column of the given type
    pub fn new(sql_type: SqlType) -> Self {
        Self {
            sql_type,
            primary_key: false,
            nullable: true,
            unique: false,
            default: None,
        }
    }

    pub fn integer() -> Self {
        Self::new(SqlType::Integer)
    }

    pub fn real() -> Self {
        Self::new(SqlType::Real)
    }

    pub fn text() -> Self {
        Self::new(SqlType::Text)
    }

    pub fn blob() -> Self {
        Self::new(SqlType::Blob)
    }

    pub fn numeric() -> Self {
        Self::new(SqlType::Numeric)
    }

    /// Mark the column as the table's single-column primary key
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Add a NOT NULL constraint
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Add a UNIQUE constraint
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set the DEFAULT value
    #[must_use]
    pub fn default(mut self, value: impl Into<DatabaseValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type.as_sql())?;
        if self.primary_key {
            f.write_str(" PRIMARY KEY")?;
        }
        if !self.nullable {
            f.write_str(" NOT NULL")?;
        }
        if self.unique {
            f.write_str(" UNIQUE")?;
        }
        if let Some(default) = &self.default {
            write!(f, " DEFAULT {}", default.to_sql_literal())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_types() {
        assert_eq!(ColumnType::integer().to_string(), "INTEGER");
        assert_eq!(ColumnType::blob().to_string(), "BLOB");
        assert_eq!(ColumnType::numeric().to_string(), "NUMERIC");
    }

    #[test]
    fn test_constraints_render_in_order() {
        let column = ColumnType::text().default("hello").unique().not_null();
        assert_eq!(column.to_string(), "TEXT NOT NULL UNIQUE DEFAULT 'hello'");

        let column = ColumnType::real().default(20.25).unique();
        assert_eq!(column.to_string(), "REAL UNIQUE DEFAULT 20.25");

        let column = ColumnType::integer().primary_key();
        assert_eq!(column.to_string(), "INTEGER PRIMARY KEY");
        assert!(column.is_nullable());
    }
}
