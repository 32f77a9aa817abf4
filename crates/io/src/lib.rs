// File and store adapters for the reconciliation engine

pub mod config;
pub mod csv;
pub mod export;
pub mod ingest;
pub mod sqlite;

pub use export::{append_export, export_selection, AppendReport, ExportStatus};
pub use sqlite::SqliteStore;
