//! Change-tracked rows
//!
//! A [`Row`] is one result tuple of a select together with the table it came
//! from. Writes through [`Row::set`] are recorded, and [`Row::save`] pushes
//! exactly the recorded columns back to storage.

use super::error::{DatabaseError, Result};
use super::operations::Operation;
use super::query_builder::{DeleteQuery, UpdateQuery};
use super::table::Table;
use super::value::{DatabaseValue, Fields};
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// One row of a bound table
///
/// # Example
///
/// ```
/// use lite_tables::{fields, ColumnType, Database, TableDefinition};
///
/// let mut db = Database::open(":memory:").unwrap();
/// let users = db
///     .create_table(
///         TableDefinition::new("users")
///             .column("id", ColumnType::integer().primary_key())
///             .column("name", ColumnType::text()),
///     )
///     .unwrap();
/// users.insert().one(fields! { "id" => 1, "name" => "alice" }).unwrap();
///
/// let mut row = users.get(1).unwrap().unwrap();
/// row.set("name", "bob").unwrap();
/// assert_eq!(row.changed_columns().len(), 1);
/// assert_eq!(row.save().unwrap(), 1);
/// assert!(!row.is_changed());
/// ```
#[derive(Clone)]
pub struct Row {
    table: Table,
    values: Vec<DatabaseValue>,
    fetched: Vec<DatabaseValue>,
    changed: BTreeSet<String>,
}

impl Row {
    pub(crate) fn new(table: Table, values: Vec<DatabaseValue>) -> Self {
        Self {
            table,
            fetched: values.clone(),
            values,
            changed: BTreeSet::new(),
        }
    }

    /// The table the row was read from
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Value of `column`, matched like column names in filters
    pub fn get(&self, column: &str) -> Option<&DatabaseValue> {
        self.table
            .schema()
            .position(column)
            .and_then(|index| self.values.get(index))
    }

    /// Write `value` to `column`.
    ///
    /// The column is recorded as changed only when the value differs from
    /// the current one. Generated columns are read-only.
    pub fn set(&mut self, column: &str, value: impl Into<DatabaseValue>) -> Result<()> {
        let schema = self.table.schema();
        let index = schema
            .position(column)
            .filter(|&index| index < self.values.len())
            .ok_or_else(|| {
                DatabaseError::column_not_found(format!("{}.{}", schema.name(), column))
            })?;
        if schema.columns()[index].generated {
            return Err(DatabaseError::invalid_argument(format!(
                "column {}.{} is generated",
                schema.name(),
                schema.columns()[index].name
            )));
        }

        let value = value.into();
        if self.values[index] != value {
            self.values[index] = value;
            self.changed.insert(schema.columns()[index].name.clone());
        }
        Ok(())
    }

    /// Values in column order
    pub fn values(&self) -> &[DatabaseValue] {
        &self.values
    }

    /// Column names paired with values, in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DatabaseValue)> {
        self.table
            .columns()
            .iter()
            .map(|c| c.name.as_str())
            .zip(self.values.iter())
    }

    /// Columns written since the row was fetched or last saved
    pub fn changed_columns(&self) -> &BTreeSet<String> {
        &self.changed
    }

    pub fn is_changed(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Current values of the changed columns
    pub fn changed_values(&self) -> Fields {
        self.iter()
            .filter(|(column, _)| self.changed.contains(*column))
            .map(|(column, value)| (column, value.clone()))
            .collect()
    }

    /// Current values of the columns that were not changed
    pub fn unchanged_values(&self) -> Fields {
        self.iter()
            .filter(|(column, _)| !self.changed.contains(*column))
            .map(|(column, value)| (column, value.clone()))
            .collect()
    }

    /// Every column with its current value
    pub fn to_fields(&self) -> Fields {
        self.iter()
            .map(|(column, value)| (column, value.clone()))
            .collect()
    }

    /// Filters locating the stored row: the primary key as fetched, or
    /// every column as fetched when the table has no primary key
    fn identity(&self) -> Fields {
        let schema = self.table.schema();
        let keys = schema.primary_key();
        // generated values go stale once a saved write changes their inputs
        let columns: Vec<&str> = if keys.is_empty() {
            schema
                .writable_columns()
                .map(|c| c.name.as_str())
                .collect()
        } else {
            keys.iter().map(|c| c.name.as_str()).collect()
        };

        columns
            .into_iter()
            .filter_map(|column| {
                let index = schema.position(column)?;
                Some((column, self.fetched.get(index)?.clone()))
            })
            .collect()
    }

    /// Write the changed columns back. Returns the affected row count, 0
    /// without touching storage when nothing changed.
    pub fn save(&mut self) -> Result<usize> {
        if self.changed.is_empty() {
            return Ok(0);
        }

        let query = UpdateQuery::new()
            .assignments(self.changed_values())
            .filters(self.identity());
        let updated = self.table.update().execute(query)?;

        self.fetched = self.values.clone();
        self.changed.clear();
        Ok(updated)
    }

    /// Delete the stored row
    pub fn delete(self) -> Result<usize> {
        let query = DeleteQuery::new().filters(self.identity());
        self.table.delete().execute(query)
    }

    /// JSON object of the current values
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Deserialize the current values into `T`, matching fields by column name
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_json()?)?)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("table", &self.table.name())
            .field("values", &self.values)
            .field("changed", &self.changed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::column_type::ColumnType;
    use crate::core::database::Database;
    use crate::core::query_builder::TableDefinition;
    use crate::fields;
    use serde::Deserialize;

    fn notes() -> (Database, Table) {
        let mut db = Database::open(":memory:").unwrap();
        let table = db
            .create_table(
                TableDefinition::new("notes")
                    .column("id", ColumnType::integer().primary_key())
                    .column("Title", ColumnType::text())
                    .column("stars", ColumnType::integer()),
            )
            .unwrap();
        table
            .insert()
            .many(vec![
                fields! { "id" => 1, "title" => "a", "stars" => 3 },
                fields! { "id" => 2, "title" => "b" },
            ])
            .unwrap();
        (db, table)
    }

    #[test]
    fn test_set_records_changes_once() -> Result<()> {
        let (_db, table) = notes();
        let mut row = table.get(1)?.unwrap();

        row.set("title", "z")?;
        row.set("TITLE", "y")?;
        row.set("stars", 3)?;

        assert_eq!(row.changed_columns().iter().collect::<Vec<_>>(), vec!["Title"]);
        assert_eq!(row.changed_values(), fields! { "Title" => "y" });
        assert_eq!(row.unchanged_values(), fields! { "id" => 1, "stars" => 3 });
        Ok(())
    }

    #[test]
    fn test_set_unknown_column() -> Result<()> {
        let (_db, table) = notes();
        let mut row = table.get(1)?.unwrap();
        let err = row.set("missing", 1).unwrap_err();
        assert!(matches!(err, DatabaseError::ColumnNotFound(_)));
        assert!(!row.is_changed());
        Ok(())
    }

    #[test]
    fn test_save_writes_changed_columns() -> Result<()> {
        let (_db, table) = notes();
        let mut row = table.get(2)?.unwrap();
        assert_eq!(row.save()?, 0);

        row.set("stars", 5)?;
        row.set("id", 20)?;
        assert_eq!(row.save()?, 1);
        assert!(!row.is_changed());

        assert!(table.get(2)?.is_none());
        let stored = table.get(20)?.unwrap();
        assert_eq!(stored.get("stars"), Some(&DatabaseValue::Integer(5)));
        Ok(())
    }

    #[test]
    fn test_delete_row() -> Result<()> {
        let (_db, table) = notes();
        let row = table.get(1)?.unwrap();
        assert_eq!(row.delete()?, 1);
        assert_eq!(table.all()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_serialize_and_deserialize() -> Result<()> {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Note {
            id: i64,
            #[serde(rename = "Title")]
            title: String,
            stars: Option<i64>,
        }

        let (_db, table) = notes();
        let row = table.get(2)?.unwrap();
        assert_eq!(
            row.to_json()?,
            serde_json::json!({ "id": 2, "Title": "b", "stars": null })
        );
        assert_eq!(
            row.deserialize::<Note>()?,
            Note {
                id: 2,
                title: "b".to_string(),
                stars: None,
            }
        );
        Ok(())
    }
}
