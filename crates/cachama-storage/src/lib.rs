//! Cachama Storage crate - SQLite-backed menu catalog.
//!
//! Provides a WAL-mode SQLite database with migrations and the catalog
//! queries the context retriever reads from.

pub mod catalog;
pub mod db;
pub mod migrations;

pub use catalog::Catalog;
pub use db::Database;
