//! Basic usage example
//!
//! This example demonstrates:
//! - Opening a database with declared tables
//! - Inserting and querying rows
//! - Editing a row and saving it back
//! - Deleting by ids
//! - Rediscovering tables created outside the API
//!
//! Run with: cargo run --example basic_usage

use lite_tables::prelude::*;
use lite_tables::{Params, Statement};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
    username: String,
    email: String,
    age: Option<i64>,
}

fn main() -> Result<()> {
    println!("=== Lite Tables - Basic Usage Example ===\n");

    println!("1. Opening database...");
    let mut db = Database::builder(":memory:")
        .define_table(
            TableDefinition::new("users")
                .column("id", ColumnType::integer().primary_key())
                .column("username", ColumnType::text().not_null())
                .column("email", ColumnType::text().not_null().unique())
                .column("age", ColumnType::integer()),
        )
        .open()?;
    println!("   ✓ Tables: {:?}\n", db.table_names());

    let users = db.try_table("users")?.clone();

    println!("2. Inserting users...");
    let inserted = users.insert().many(vec![
        fields! { "id" => 1, "username" => "alice", "email" => "alice@example.com", "age" => 30 },
        fields! { "id" => 2, "username" => "bob", "email" => "bob@example.com", "age" => 25 },
        fields! { "id" => 3, "username" => "carol", "email" => "carol@example.com" },
    ])?;
    println!("   ✓ Inserted {} users\n", inserted);

    println!("3. Querying users...");
    for row in users.all()? {
        let user: User = row.deserialize()?;
        println!(
            "   - #{} {} <{}> age {:?}",
            user.id, user.username, user.email, user.age
        );
    }
    let unknown_age = users.select().filter(fields! { "age" => DatabaseValue::Null })?;
    println!("   ✓ {} user(s) without an age\n", unknown_age.len());

    println!("4. Editing a row...");
    if let Some(mut bob) = users.get(2)? {
        bob.set("age", 26)?;
        bob.set("email", "robert@example.com")?;
        println!("   changed: {:?}", bob.changed_columns());
        let updated = bob.save()?;
        println!("   ✓ Saved ({} row)\n", updated);
    }

    println!("5. Deleting users...");
    let deleted = users.delete().ids([1, 3])?;
    println!("   ✓ Deleted {} users\n", deleted);

    println!("6. Rediscovering tables...");
    db.connection().execute(&Statement::new(
        "CREATE TABLE audit (id INTEGER PRIMARY KEY, action TEXT)",
        Params::None,
    ))?;
    db.initialize_tables()?;
    for table in &db {
        println!("   - {} {:?}", table.name(), table.column_names());
    }

    db.close()?;
    println!("\n=== Example completed successfully ===");
    Ok(())
}
