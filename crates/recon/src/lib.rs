//! `reckoning-recon`: two-collection bug-report reconciliation engine.
//!
//! Pure engine crate: queries a [`RecordStore`], returns deduplicated,
//! projected record tables. No file IO.

pub mod append;
pub mod config;
pub mod dates;
pub mod error;
pub mod model;
pub mod normalize;
pub mod ops;
pub mod project;
pub mod reconcile;
pub mod store;

pub use config::ReconConfig;
pub use error::ReconError;
pub use model::{Collection, Document, DocumentId, Operation, Position, Record, ReportTable, Selection, SelectionStatus};
pub use ops::Reconciler;
pub use reconcile::{reconcile, DedupPolicy};
pub use store::{MemoryStore, Predicate, RecordStore, Stage};
