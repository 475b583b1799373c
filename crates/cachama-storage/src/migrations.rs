//! Database schema migrations.

use rusqlite::{params, Connection};
use tracing::info;

use cachama_core::error::CachamaError;

use crate::catalog::search_text;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), CachamaError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| CachamaError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| CachamaError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: menu_items");
    }

    if current_version < 2 {
        apply_v2(conn)?;
        info!("Applied migration v2: menu_items.search_text");
    }

    Ok(())
}

/// Version 1: the menu catalog.
///
/// `id` is TEXT so identifiers such as `01` keep their leading zeros.
fn apply_v1(conn: &Connection) -> Result<(), CachamaError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS menu_items (
            id          TEXT PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            category    TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            price       REAL NOT NULL DEFAULT 0.0
        );

        CREATE INDEX IF NOT EXISTS idx_menu_items_category
            ON menu_items (category);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'menu_items');
        ",
    )
    .map_err(|e| CachamaError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}

/// Version 2: a lowercased copy of the searchable fields.
///
/// SQLite `LIKE` only folds ASCII, so accented names are lowercased in Rust
/// and matched against this column instead.
fn apply_v2(conn: &Connection) -> Result<(), CachamaError> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| CachamaError::Storage(format!("Migration v2 begin: {}", e)))?;

    tx.execute_batch(
        "ALTER TABLE menu_items ADD COLUMN search_text TEXT NOT NULL DEFAULT '';",
    )
    .map_err(|e| CachamaError::Storage(format!("Migration v2 failed: {}", e)))?;

    let rows: Vec<(String, String)> = {
        let mut stmt = tx
            .prepare("SELECT id, name, category, description FROM menu_items")
            .map_err(|e| CachamaError::Storage(format!("Migration v2 backfill: {}", e)))?;
        let mapped = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let category: String = row.get(2)?;
                let description: String = row.get(3)?;
                Ok((row.get(0)?, search_text(&name, &category, &description)))
            })
            .map_err(|e| CachamaError::Storage(format!("Migration v2 backfill: {}", e)))?;
        mapped
            .collect::<rusqlite::Result<_>>()
            .map_err(|e| CachamaError::Storage(format!("Migration v2 backfill: {}", e)))?
    };

    for (id, text) in &rows {
        tx.execute(
            "UPDATE menu_items SET search_text = ?1 WHERE id = ?2",
            params![text, id],
        )
        .map_err(|e| CachamaError::Storage(format!("Migration v2 backfill {}: {}", id, e)))?;
    }

    tx.execute(
        "INSERT INTO schema_migrations (version, name) VALUES (2, 'menu_items_search_text')",
        [],
    )
    .map_err(|e| CachamaError::Storage(format!("Migration v2 failed: {}", e)))?;

    tx.commit()
        .map_err(|e| CachamaError::Storage(format!("Migration v2 commit: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, 2);
    }

    #[test]
    fn test_menu_items_columns() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let mut stmt = conn.prepare("PRAGMA table_info(menu_items)").unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .map(|c| c.unwrap())
            .collect();
        assert_eq!(
            columns,
            vec!["id", "name", "category", "description", "price", "search_text"]
        );
    }

    #[test]
    fn test_v2_backfills_existing_rows() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_migrations (
                version     INTEGER PRIMARY KEY NOT NULL,
                name        TEXT NOT NULL,
                applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            );",
        )
        .unwrap();
        apply_v1(&conn).unwrap();
        conn.execute(
            "INSERT INTO menu_items (id, name, category) VALUES ('30', 'ÑAME FRITO', 'ÁRABES')",
            [],
        )
        .unwrap();

        run_migrations(&conn).unwrap();

        let text: String = conn
            .query_row(
                "SELECT search_text FROM menu_items WHERE id = '30'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(text.contains("ñame frito"));
        assert!(text.contains("árabes"));
    }
}
