//! SQL statement builders
//!
//! Every builder turns a structured request into a [`Statement`]: SQL text
//! plus bound parameters. Values are never embedded in the text; the only
//! exception is `DEFAULT` expressions in `CREATE TABLE`, which SQLite cannot
//! bind. Column names are checked against the bound table's schema before
//! they are written into a statement.

use super::column_type::ColumnType;
use super::error::{DatabaseError, Result};
use super::table::TableSchema;
use super::value::{DatabaseValue, Fields};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Sigil for SET-clause and SELECT/DELETE placeholders (`:name`)
pub const ASSIGNMENT_SIGIL: char = ':';

/// Sigil for UPDATE filter placeholders (`@name`); SQLite treats `:a` and
/// `@a` as distinct parameters.
pub const FILTER_SIGIL: char = '@';

/// SQLite keywords; identifiers spelled like one are always quoted
const KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN",
    "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT",
    "NOTHING", "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS",
    "OUTER", "OVER", "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE",
    "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE",
    "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET",
    "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED",
    "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN",
    "WHERE", "WINDOW", "WITH", "WITHOUT",
];

/// Whether `name` can be written into SQL unquoted
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(name))
}

/// Quote an identifier unless it is a plain identifier
pub fn quote_identifier(name: &str) -> Cow<'_, str> {
    if is_plain_identifier(name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("\"{}\"", name.replace('"', "\"\"")))
    }
}

/// Operator joining the entries of a clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    /// Conjunction of predicates
    #[default]
    And,
    /// Disjunction of predicates
    Or,
    /// Assignment list separator (`SET a = :a, b = :b`)
    Comma,
}

impl Operator {
    /// Separator written between two entries
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::And => " AND ",
            Operator::Or => " OR ",
            Operator::Comma => ", ",
        }
    }

    /// Whether the operator joins predicates (as opposed to assignments)
    pub fn is_predicate(&self) -> bool {
        !matches!(self, Operator::Comma)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql().trim())
    }
}

impl FromStr for Operator {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "and" => Ok(Operator::And),
            "or" => Ok(Operator::Or),
            "," => Ok(Operator::Comma),
            _ => Err(DatabaseError::invalid_operator(s)),
        }
    }
}

/// Parameters bound to a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// No parameters
    None,
    /// Named parameters (name includes its sigil)
    Named(Vec<(String, DatabaseValue)>),
    /// Positional parameters for a single execution
    Positional(Vec<DatabaseValue>),
    /// One positional parameter set per execution of the same statement
    Batch(Vec<Vec<DatabaseValue>>),
}

impl Params {
    /// Number of bound values
    pub fn len(&self) -> usize {
        match self {
            Params::None => 0,
            Params::Named(values) => values.len(),
            Params::Positional(values) => values.len(),
            Params::Batch(rows) => rows.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// SQL text plus its parameter bindings
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Params,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// A rendered predicate or assignment list
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    sql: String,
    params: Vec<(String, DatabaseValue)>,
}

impl Clause {
    /// Render `fields` joined by `operator`, with placeholders named
    /// `<sigil><column>`, or `<sigil><index>` for names that need quoting.
    ///
    /// In predicates a Null value renders `column IS NULL` and binds
    /// nothing. In assignment lists Null is bound like any other value.
    pub fn build(fields: &Fields, operator: Operator, sigil: char) -> Self {
        let mut parts = Vec::with_capacity(fields.len());
        let mut params = Vec::with_capacity(fields.len());

        for (index, (column, value)) in fields.iter().enumerate() {
            let quoted = quote_identifier(column);
            if value.is_null() && operator.is_predicate() {
                parts.push(format!("{} IS NULL", quoted));
                continue;
            }

            // plain identifiers never start with a digit
            let placeholder = if is_plain_identifier(column) {
                format!("{}{}", sigil, column)
            } else {
                format!("{}{}", sigil, index)
            };
            parts.push(format!("{} = {}", quoted, placeholder));
            params.push((placeholder, value.clone()));
        }

        Self {
            sql: parts.join(operator.as_sql()),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[(String, DatabaseValue)] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// `SELECT * FROM <table>`
pub fn select_all_sql(table: &str) -> String {
    format!("SELECT * FROM {}", quote_identifier(table))
}

/// `DROP TABLE <table>`
pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE {}", quote_identifier(table))
}

/// SELECT request: optional equality filters, join operator, row limit
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    filters: Fields,
    operator: Operator,
    limit: usize,
}

impl SelectQuery {
    /// Select every row
    ///
    /// # Example
    ///
    /// ```
    /// use lite_tables::SelectQuery;
    ///
    /// let query = SelectQuery::new().filter("name", "alice").limit(1);
    /// assert_eq!(query.limit_value(), 1);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter (`Null` filters render `IS NULL`)
    #[must_use]
    pub fn filter(mut self, column: &str, value: impl Into<DatabaseValue>) -> Self {
        self.filters.insert(column, value);
        self
    }

    /// Add several filters at once
    #[must_use]
    pub fn filters(mut self, filters: Fields) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Join filters with `operator` instead of AND
    #[must_use]
    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    /// Return at most `limit` rows; 0 means unlimited
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit_value(&self) -> usize {
        self.limit
    }

    /// Whether the query selects the whole table
    pub fn is_unfiltered(&self) -> bool {
        self.filters.is_empty()
    }

    /// Build the statement against `schema`
    pub fn build(&self, schema: &TableSchema) -> Result<Statement> {
        let base = select_all_sql(schema.name());
        if self.filters.is_empty() {
            return Ok(Statement::new(base, Params::None));
        }
        if !self.operator.is_predicate() {
            return Err(DatabaseError::invalid_operator(","));
        }

        let filters = schema.canonicalize(&self.filters)?;
        let clause = Clause::build(&filters, self.operator, ASSIGNMENT_SIGIL);
        Ok(Statement::new(
            format!("{} WHERE {}", base, clause.sql()),
            Params::Named(clause.params),
        ))
    }
}

/// INSERT request: one or more rows, each projected onto the table's
/// column order
#[derive(Debug, Clone, Default)]
pub struct InsertQuery {
    rows: Vec<Fields>,
}

impl InsertQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single row
    pub fn one(row: Fields) -> Self {
        Self { rows: vec![row] }
    }

    /// Insert many rows in one batch
    pub fn many(rows: impl IntoIterator<Item = Fields>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }

    /// Append a row
    #[must_use]
    pub fn row(mut self, row: Fields) -> Self {
        self.rows.push(row);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build the batch statement.
    ///
    /// Returns `None` when there is nothing to write: the batch is empty, or
    /// at least one projected row is entirely Null, in which case the whole
    /// batch is skipped.
    pub fn build(&self, schema: &TableSchema) -> Result<Option<Statement>> {
        let mut batch = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            batch.push(schema.project(row)?);
        }

        if batch.is_empty() || batch.iter().any(|row| row.iter().all(DatabaseValue::is_null)) {
            return Ok(None);
        }

        let table = quote_identifier(schema.name());
        let placeholders = vec!["?"; schema.writable_columns().count()].join(", ");
        // Generated columns are part of the table but take no value
        let sql = if schema.has_generated_columns() {
            let columns: Vec<String> = schema
                .writable_columns()
                .map(|c| quote_identifier(&c.name).into_owned())
                .collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.join(", "),
                placeholders
            )
        } else {
            format!("INSERT INTO {} VALUES ({})", table, placeholders)
        };
        Ok(Some(Statement::new(sql, Params::Batch(batch))))
    }
}

/// UPDATE request: assignments plus optional AND-joined filters
#[derive(Debug, Clone, Default)]
pub struct UpdateQuery {
    assignments: Fields,
    filters: Fields,
}

impl UpdateQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` to `column`
    #[must_use]
    pub fn set(mut self, column: &str, value: impl Into<DatabaseValue>) -> Self {
        self.assignments.insert(column, value);
        self
    }

    /// Add several assignments at once
    #[must_use]
    pub fn assignments(mut self, assignments: Fields) -> Self {
        self.assignments.extend(assignments);
        self
    }

    /// Restrict the update to rows where `column` equals `value`
    #[must_use]
    pub fn filter(mut self, column: &str, value: impl Into<DatabaseValue>) -> Self {
        self.filters.insert(column, value);
        self
    }

    /// Add several filters at once
    #[must_use]
    pub fn filters(mut self, filters: Fields) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Build the statement. Fails when there is nothing to assign.
    pub fn build(&self, schema: &TableSchema) -> Result<Statement> {
        if self.assignments.is_empty() {
            return Err(DatabaseError::invalid_argument(
                "update data must not be empty",
            ));
        }

        let assignments = schema.canonicalize(&self.assignments)?;
        let set = Clause::build(&assignments, Operator::Comma, ASSIGNMENT_SIGIL);
        let mut sql = format!(
            "UPDATE {} SET {}",
            quote_identifier(schema.name()),
            set.sql()
        );
        let mut params = set.params;

        if !self.filters.is_empty() {
            let filters = schema.canonicalize(&self.filters)?;
            let predicate = Clause::build(&filters, Operator::And, FILTER_SIGIL);
            sql.push_str(" WHERE ");
            sql.push_str(predicate.sql());
            params.extend(predicate.params);
        }

        Ok(Statement::new(sql, Params::Named(params)))
    }
}

/// DELETE request: either a list of ids or AND-joined filters
#[derive(Debug, Clone, Default)]
pub struct DeleteQuery {
    ids: Option<Vec<DatabaseValue>>,
    filters: Fields,
}

impl DeleteQuery {
    /// Empty request; building it fails until a filter is added
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete the rows whose `id` is one of `ids`, in one batch
    pub fn by_ids<I, V>(ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DatabaseValue>,
    {
        Self {
            ids: Some(ids.into_iter().map(Into::into).collect()),
            filters: Fields::new(),
        }
    }

    /// Shorthand for `filter("id", id)`
    #[must_use]
    pub fn id(self, id: impl Into<DatabaseValue>) -> Self {
        self.filter("id", id)
    }

    #[must_use]
    pub fn filter(mut self, column: &str, value: impl Into<DatabaseValue>) -> Self {
        self.filters.insert(column, value);
        self
    }

    #[must_use]
    pub fn filters(mut self, filters: Fields) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Build the statement
    pub fn build(&self, schema: &TableSchema) -> Result<Statement> {
        let table = quote_identifier(schema.name());

        match &self.ids {
            Some(_) if !self.filters.is_empty() => Err(DatabaseError::invalid_argument(
                "delete by ids cannot be combined with filters",
            )),
            Some(ids) => {
                let id = schema.resolve("id")?;
                Ok(Statement::new(
                    format!("DELETE FROM {} WHERE {} = ?", table, quote_identifier(id)),
                    Params::Batch(ids.iter().map(|id| vec![id.clone()]).collect()),
                ))
            }
            None if self.filters.is_empty() => Err(DatabaseError::invalid_argument(
                "delete requires an id or at least one filter",
            )),
            None => {
                let filters = schema.canonicalize(&self.filters)?;
                let predicate = Clause::build(&filters, Operator::And, FILTER_SIGIL);
                Ok(Statement::new(
                    format!("DELETE FROM {} WHERE {}", table, predicate.sql()),
                    Params::Named(predicate.params),
                ))
            }
        }
    }
}

/// Column list of a `CREATE TABLE` statement
#[derive(Debug, Clone, PartialEq)]
pub enum Columns {
    /// Pre-rendered column definitions, written verbatim
    Definitions(Vec<String>),
    /// Column names with their type descriptors
    Typed(Vec<(String, ColumnType)>),
}

impl Columns {
    pub fn len(&self) -> usize {
        match self {
            Columns::Definitions(defs) => defs.len(),
            Columns::Typed(cols) => cols.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn render(&self) -> Vec<String> {
        match self {
            Columns::Definitions(defs) => defs.clone(),
            Columns::Typed(cols) => cols
                .iter()
                .map(|(name, ty)| format!("{} {}", quote_identifier(name), ty))
                .collect(),
        }
    }
}

impl Default for Columns {
    fn default() -> Self {
        Columns::Typed(Vec::new())
    }
}

impl<S: Into<String>> From<Vec<S>> for Columns {
    fn from(defs: Vec<S>) -> Self {
        Columns::Definitions(defs.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> FromIterator<(S, ColumnType)> for Columns {
    fn from_iter<I: IntoIterator<Item = (S, ColumnType)>>(iter: I) -> Self {
        Columns::Typed(iter.into_iter().map(|(n, t)| (n.into(), t)).collect())
    }
}

/// CREATE TABLE request
///
/// # Example
///
/// ```
/// use lite_tables::{ColumnType, TableDefinition};
///
/// let users = TableDefinition::new("users")
///     .column("id", ColumnType::integer().primary_key())
///     .column("name", ColumnType::text().not_null());
///
/// assert_eq!(
///     users.build().unwrap().sql(),
///     "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    name: String,
    columns: Columns,
    primary_key: Vec<String>,
    if_not_exists: bool,
}

impl TableDefinition {
    /// Start a definition; `IF NOT EXISTS` is on by default
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Columns::default(),
            primary_key: Vec::new(),
            if_not_exists: true,
        }
    }

    /// Replace the whole column list
    #[must_use]
    pub fn columns(mut self, columns: impl Into<Columns>) -> Self {
        self.columns = columns.into();
        self
    }

    /// Append a typed column
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        let name = name.into();
        match &mut self.columns {
            Columns::Typed(cols) => cols.push((name, column_type)),
            Columns::Definitions(defs) => {
                defs.push(format!("{} {}", quote_identifier(&name), column_type))
            }
        }
        self
    }

    /// Append a pre-rendered column definition, e.g. `"age INTEGER CHECK (age > 0)"`
    #[must_use]
    pub fn definition(mut self, definition: impl Into<String>) -> Self {
        let mut defs = self.columns.render();
        defs.push(definition.into());
        self.columns = Columns::Definitions(defs);
        self
    }

    /// Table-level `PRIMARY KEY(...)` constraint
    #[must_use]
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn if_not_exists(mut self, if_not_exists: bool) -> Self {
        self.if_not_exists = if_not_exists;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the DDL statement
    pub fn build(&self) -> Result<Statement> {
        if self.name.is_empty() {
            return Err(DatabaseError::invalid_argument("table name must not be empty"));
        }
        if self.columns.is_empty() {
            return Err(DatabaseError::invalid_argument(format!(
                "table '{}' needs at least one column",
                self.name
            )));
        }
        if let Columns::Typed(cols) = &self.columns {
            if let Some(missing) = self
                .primary_key
                .iter()
                .find(|pk| !cols.iter().any(|(name, _)| name.eq_ignore_ascii_case(pk)))
            {
                return Err(DatabaseError::column_not_found(missing.clone()));
            }
        }

        let mut sql = String::from("CREATE TABLE ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&quote_identifier(&self.name));
        sql.push_str(" (");
        sql.push_str(&self.columns.render().join(", "));
        if !self.primary_key.is_empty() {
            let keys: Vec<Cow<'_, str>> =
                self.primary_key.iter().map(|k| quote_identifier(k)).collect();
            sql.push_str(&format!(", PRIMARY KEY({})", keys.join(", ")));
        }
        sql.push(')');

        Ok(Statement::new(sql, Params::None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::Column;
    use crate::fields;

    fn users() -> TableSchema {
        TableSchema::new(
            "users",
            vec![
                Column::new("id", "INTEGER").primary_key(1),
                Column::new("name", "TEXT"),
                Column::new("age", "INTEGER"),
            ],
        )
    }

    #[test]
    fn test_operator_parse() {
        assert_eq!("AND".parse::<Operator>().unwrap(), Operator::And);
        assert_eq!("or".parse::<Operator>().unwrap(), Operator::Or);
        assert_eq!(",".parse::<Operator>().unwrap(), Operator::Comma);
        assert!(matches!(
            "xor".parse::<Operator>(),
            Err(DatabaseError::InvalidOperator(_))
        ));
    }

    #[test]
    fn test_clause_null_uses_is_null() {
        let clause = Clause::build(
            &fields! { "name" => "a", "age" => DatabaseValue::Null },
            Operator::And,
            ':',
        );
        assert_eq!(clause.sql(), "name = :name AND age IS NULL");
        assert_eq!(clause.params().len(), 1);
    }

    #[test]
    fn test_clause_assignment_binds_null() {
        let clause = Clause::build(
            &fields! { "name" => DatabaseValue::Null, "age" => 3 },
            Operator::Comma,
            ':',
        );
        assert_eq!(clause.sql(), "name = :name, age = :age");
        assert_eq!(clause.params()[0].1, DatabaseValue::Null);
    }

    #[test]
    fn test_keywords_are_quoted() {
        assert_eq!(quote_identifier("order"), "\"order\"");
        assert_eq!(quote_identifier("orders"), "orders");
        assert_eq!(
            select_all_sql("Group"),
            "SELECT * FROM \"Group\""
        );
    }

    #[test]
    fn test_clause_quotes_unusual_names() {
        let clause = Clause::build(&fields! { "first name" => "a" }, Operator::Or, '@');
        assert_eq!(clause.sql(), "\"first name\" = @0");
        assert_eq!(clause.params()[0].0, "@0");
    }

    #[test]
    fn test_clause_placeholders_are_distinct() {
        let clause = Clause::build(
            &fields! { "first name" => "a", "__0" => "b", "0" => "c" },
            Operator::And,
            ':',
        );
        assert_eq!(
            clause.sql(),
            "\"first name\" = :0 AND __0 = :__0 AND \"0\" = :2"
        );
        let names: Vec<&str> = clause.params().iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec![":0", ":__0", ":2"]);
    }

    #[test]
    fn test_select_basic() {
        let stmt = SelectQuery::new().build(&users()).unwrap();
        assert_eq!(stmt.sql(), "SELECT * FROM users");
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn test_select_where() {
        let stmt = SelectQuery::new()
            .filter("NAME", "alice")
            .filter("age", 30)
            .operator(Operator::Or)
            .build(&users())
            .unwrap();

        assert_eq!(
            stmt.sql(),
            "SELECT * FROM users WHERE name = :name OR age = :age"
        );
        assert_eq!(stmt.params().len(), 2);
    }

    #[test]
    fn test_select_rejects_comma_and_unknown_columns() {
        let err = SelectQuery::new()
            .filter("name", "a")
            .operator(Operator::Comma)
            .build(&users())
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidOperator(_)));

        let err = SelectQuery::new()
            .filter("name; DROP TABLE users", 1)
            .build(&users())
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ColumnNotFound(_)));
    }

    #[test]
    fn test_insert_projects_onto_columns() {
        let stmt = InsertQuery::one(fields! { "name" => "a", "id" => 1 })
            .build(&users())
            .unwrap()
            .unwrap();

        assert_eq!(stmt.sql(), "INSERT INTO users VALUES (?, ?, ?)");
        assert_eq!(
            stmt.params(),
            &Params::Batch(vec![vec![
                DatabaseValue::Integer(1),
                DatabaseValue::from("a"),
                DatabaseValue::Null,
            ]])
        );
    }

    #[test]
    fn test_insert_names_columns_around_generated_ones() {
        let schema = TableSchema::new(
            "g",
            vec![
                Column::new("id", "INTEGER").primary_key(1),
                Column::new("twice", "INTEGER").generated(),
                Column::new("order", "INTEGER"),
            ],
        );
        let stmt = InsertQuery::one(fields! { "order" => 5 })
            .build(&schema)
            .unwrap()
            .unwrap();

        assert_eq!(stmt.sql(), "INSERT INTO g (id, \"order\") VALUES (?, ?)");
        assert_eq!(
            stmt.params(),
            &Params::Batch(vec![vec![DatabaseValue::Null, DatabaseValue::Integer(5)]])
        );
    }

    #[test]
    fn test_insert_skips_batch_with_null_row() {
        let query = InsertQuery::many(vec![fields! { "id" => 1 }, fields! {}]);
        assert!(query.build(&users()).unwrap().is_none());
        assert!(InsertQuery::new().build(&users()).unwrap().is_none());
    }

    #[test]
    fn test_update() {
        let stmt = UpdateQuery::new()
            .set("name", "Bob")
            .set("age", 31)
            .filter("id", 1)
            .build(&users())
            .unwrap();

        assert_eq!(
            stmt.sql(),
            "UPDATE users SET name = :name, age = :age WHERE id = @id"
        );
        assert_eq!(stmt.params().len(), 3);
    }

    #[test]
    fn test_update_same_column_in_set_and_filter() {
        let stmt = UpdateQuery::new()
            .set("name", "new")
            .filter("name", "old")
            .build(&users())
            .unwrap();

        assert_eq!(stmt.sql(), "UPDATE users SET name = :name WHERE name = @name");
    }

    #[test]
    fn test_update_requires_assignments() {
        let err = UpdateQuery::new().filter("id", 1).build(&users()).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidArgument(_)));
    }

    #[test]
    fn test_delete() {
        let stmt = DeleteQuery::new().id(42).build(&users()).unwrap();
        assert_eq!(stmt.sql(), "DELETE FROM users WHERE id = @id");

        let stmt = DeleteQuery::by_ids([1, 2, 3]).build(&users()).unwrap();
        assert_eq!(stmt.sql(), "DELETE FROM users WHERE id = ?");
        assert_eq!(stmt.params().len(), 3);

        let err = DeleteQuery::new().build(&users()).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidArgument(_)));
    }

    #[test]
    fn test_create_table_typed_with_primary_key() {
        let stmt = TableDefinition::new("AAAA")
            .column("int", ColumnType::integer().default(10).unique().not_null())
            .column("txt", ColumnType::text())
            .primary_key(["int", "txt"])
            .if_not_exists(false)
            .build()
            .unwrap();

        assert_eq!(
            stmt.sql(),
            "CREATE TABLE AAAA (int INTEGER NOT NULL UNIQUE DEFAULT 10, txt TEXT, PRIMARY KEY(int, txt))"
        );
    }

    #[test]
    fn test_create_table_definitions() {
        let stmt = TableDefinition::new("notes")
            .columns(vec!["id INTEGER PRIMARY KEY", "body TEXT"])
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "CREATE TABLE IF NOT EXISTS notes (id INTEGER PRIMARY KEY, body TEXT)"
        );
    }

    #[test]
    fn test_create_table_validation() {
        let err = TableDefinition::new("empty").build().unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidArgument(_)));

        let err = TableDefinition::new("t")
            .column("a", ColumnType::integer())
            .primary_key(["b"])
            .build()
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ColumnNotFound(_)));
    }
}
