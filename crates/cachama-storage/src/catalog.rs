//! Menu catalog queries.
//!
//! Read paths feed the context retriever; write paths exist for seeding.
//! Rows come back in rowid (insertion) order so repeated lookups are stable.

use std::path::Path;
use std::sync::Arc;

use rusqlite::{params, Connection, Row};
use tracing::info;

use cachama_core::error::CachamaError;
use cachama_core::types::ContextRecord;

use crate::db::Database;

/// Read/write access to the `menu_items` table.
#[derive(Debug, Clone)]
pub struct Catalog {
    db: Arc<Database>,
}

impl Catalog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Records whose name, category or description contains `query`,
    /// case-insensitively (Unicode lowercase), capped at `limit`.
    ///
    /// `%`, `_` and `\` in the query match literally.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<ContextRecord>, CachamaError> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, category, description, price
                     FROM menu_items
                     WHERE search_text LIKE ?1 ESCAPE '\\'
                     ORDER BY rowid
                     LIMIT ?2",
                )
                .map_err(|e| CachamaError::Storage(format!("Search prepare: {}", e)))?;

            let rows = stmt
                .query_map(params![pattern, limit as i64], map_record)
                .map_err(|e| CachamaError::Storage(format!("Search query: {}", e)))?;

            collect_rows(rows)
        })
    }

    /// The first `limit` records in store order.
    pub fn list_first(&self, limit: usize) -> Result<Vec<ContextRecord>, CachamaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, category, description, price
                     FROM menu_items
                     ORDER BY rowid
                     LIMIT ?1",
                )
                .map_err(|e| CachamaError::Storage(format!("List prepare: {}", e)))?;

            let rows = stmt
                .query_map(params![limit as i64], map_record)
                .map_err(|e| CachamaError::Storage(format!("List query: {}", e)))?;

            collect_rows(rows)
        })
    }

    /// Insert a record, or update it in place if the id already exists.
    pub fn upsert(&self, record: &ContextRecord) -> Result<(), CachamaError> {
        self.db.with_conn(|conn| upsert_on(conn, record))
    }

    /// Number of records in the catalog.
    pub fn count(&self) -> Result<u64, CachamaError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM menu_items", [], |row| row.get(0))
                .map_err(|e| CachamaError::Storage(format!("Count query: {}", e)))?;
            Ok(count as u64)
        })
    }

    /// Load a JSON array of records from `path` and upsert them in one
    /// transaction. Returns the number of records written.
    pub fn seed_from_json(&self, path: &Path) -> Result<usize, CachamaError> {
        let content = std::fs::read_to_string(path)?;
        let records: Vec<ContextRecord> = serde_json::from_str(&content)?;

        self.db.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| CachamaError::Storage(format!("Begin seed: {}", e)))?;
            for record in &records {
                upsert_on(&tx, record)?;
            }
            tx.commit()
                .map_err(|e| CachamaError::Storage(format!("Commit seed: {}", e)))?;
            Ok(())
        })?;

        info!(count = records.len(), path = %path.display(), "Catalog seeded");
        Ok(records.len())
    }
}

fn upsert_on(conn: &Connection, record: &ContextRecord) -> Result<(), CachamaError> {
    conn.execute(
        "INSERT INTO menu_items (id, name, category, description, price, search_text)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            category = excluded.category,
            description = excluded.description,
            price = excluded.price,
            search_text = excluded.search_text",
        params![
            record.id,
            record.name,
            record.category,
            record.description,
            record.price,
            search_text(&record.name, &record.category, &record.description)
        ],
    )
    .map_err(|e| CachamaError::Storage(format!("Upsert {}: {}", record.id, e)))?;
    Ok(())
}

/// Lowercased search column contents. Fields are joined with a unit
/// separator so a match cannot straddle two of them.
pub(crate) fn search_text(name: &str, category: &str, description: &str) -> String {
    format!("{}\u{1f}{}\u{1f}{}", name, category, description).to_lowercase()
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<ContextRecord> {
    Ok(ContextRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
    })
}

fn collect_rows<I>(rows: I) -> Result<Vec<ContextRecord>, CachamaError>
where
    I: Iterator<Item = rusqlite::Result<ContextRecord>>,
{
    rows.map(|r| r.map_err(|e| CachamaError::Storage(e.to_string())))
        .collect()
}

/// Escape LIKE metacharacters so user text matches as a literal substring.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(id: &str, name: &str, category: &str, description: &str, price: f64) -> ContextRecord {
        ContextRecord {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            price,
        }
    }

    fn seeded_catalog() -> Catalog {
        let catalog = Catalog::new(Arc::new(Database::in_memory().unwrap()));
        let items = [
            record("01", "Arepa de queso", "Desayunos", "Arepa asada con queso llanero", 3.0),
            record("02", "Empanada de carne", "Desayunos", "Masa de maíz frita", 2.5),
            record("03", "Cachama frita", "Almuerzos", "Con tostones y ensalada", 12.0),
            record("04", "Pabellón criollo", "Almuerzos", "Carne mechada, caraotas y tajadas", 10.0),
            record("05", "Papelón con limón", "Bebidas", "Bebida tradicional", 1.5),
            record("06", "Jugo de parchita", "Bebidas", "Natural, 100% fruta", 2.0),
            record("07", "Arepa reina", "Desayunos", "Pollo y aguacate", 4.0),
        ];
        for item in &items {
            catalog.upsert(item).unwrap();
        }
        catalog
    }

    fn ids(records: &[ContextRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_search_matches_name() {
        let catalog = seeded_catalog();
        let results = catalog.search("cachama", 5).unwrap();
        assert_eq!(ids(&results), vec!["03"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let catalog = seeded_catalog();
        let results = catalog.search("AREPA", 5).unwrap();
        assert_eq!(ids(&results), vec!["01", "07"]);
    }

    #[test]
    fn test_search_folds_accented_capitals() {
        let catalog = seeded_catalog();
        catalog
            .upsert(&record("30", "ÑAME FRITO", "ÁRABES", "CON SALSA DE AJÍ", 5.0))
            .unwrap();

        assert_eq!(ids(&catalog.search("ñame", 5).unwrap()), vec!["30"]);
        assert_eq!(ids(&catalog.search("árabes", 5).unwrap()), vec!["30"]);
        assert_eq!(ids(&catalog.search("Ají", 5).unwrap()), vec!["30"]);
        assert_eq!(ids(&catalog.search("PABELLÓN", 5).unwrap()), vec!["04"]);
    }

    #[test]
    fn test_search_matches_category_and_description() {
        let catalog = seeded_catalog();
        assert_eq!(ids(&catalog.search("bebidas", 5).unwrap()), vec!["05", "06"]);
        assert_eq!(ids(&catalog.search("tostones", 5).unwrap()), vec!["03"]);
    }

    #[test]
    fn test_search_respects_limit_and_store_order() {
        let catalog = seeded_catalog();
        let results = catalog.search("a", 5).unwrap();
        assert_eq!(ids(&results), vec!["01", "02", "03", "04", "05"]);
    }

    #[test]
    fn test_search_empty_query_matches_everything() {
        let catalog = seeded_catalog();
        assert_eq!(catalog.search("", 3).unwrap().len(), 3);
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let catalog = seeded_catalog();
        assert!(catalog.search("_", 5).unwrap().is_empty());
        assert_eq!(ids(&catalog.search("100%", 5).unwrap()), vec!["06"]);
    }

    #[test]
    fn test_search_no_match() {
        let catalog = seeded_catalog();
        assert!(catalog.search("sushi", 5).unwrap().is_empty());
    }

    #[test]
    fn test_list_first_in_store_order() {
        let catalog = seeded_catalog();
        assert_eq!(ids(&catalog.list_first(3).unwrap()), vec!["01", "02", "03"]);
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let catalog = seeded_catalog();
        catalog
            .upsert(&record("01", "Arepa de queso", "Desayunos", "Queso de mano", 3.5))
            .unwrap();
        assert_eq!(catalog.count().unwrap(), 7);

        let first = &catalog.list_first(1).unwrap()[0];
        assert_eq!(first.id, "01");
        assert_eq!(first.price, 3.5);
        assert_eq!(first.description, "Queso de mano");
        assert_eq!(ids(&catalog.search("queso de mano", 5).unwrap()), vec!["01"]);
    }

    #[test]
    fn test_seed_from_json() {
        let catalog = Catalog::new(Arc::new(Database::in_memory().unwrap()));
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id":"10","name":"Hervido de gallina","category":"Sopas","description":"Los domingos","price":8.0}},
                {{"id":"20","name":"Quesillo","category":"Postres","description":"Casero","price":3.0}}
            ]"#
        )
        .unwrap();

        let written = catalog.seed_from_json(file.path()).unwrap();
        assert_eq!(written, 2);
        assert_eq!(ids(&catalog.list_first(5).unwrap()), vec!["10", "20"]);
    }

    #[test]
    fn test_seed_from_json_rejects_bad_file() {
        let catalog = Catalog::new(Arc::new(Database::in_memory().unwrap()));
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{{\"id\":").unwrap();

        let result = catalog.seed_from_json(file.path());
        assert!(matches!(result, Err(CachamaError::Serialization(_))));
        assert_eq!(catalog.count().unwrap(), 0);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\"), "c:\\\\");
        assert_eq!(escape_like("pabellón"), "pabellón");
    }
}
