//! Record store contract plus an in-memory implementation.
//!
//! The engine only needs four things from a store: predicate queries, a small
//! pipeline (sort by insertion, skip, limit), document counts and bulk insert.
//! Every result comes back in insertion order.

use chrono::NaiveDate;

use crate::dates::parse_date;
use crate::error::ReconError;
use crate::model::{Collection, Document, DocumentId, Record};
use crate::normalize::normalize;

// ---------------------------------------------------------------------------
// Predicates + pipeline stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    All,
    /// Field contains `needle` as a literal substring, ignoring case.
    FieldContains { field: String, needle: String },
    /// Trimmed field equals `value`, ignoring case.
    FieldEqualsIgnoreCase { field: String, value: String },
    /// Field parses as a date or date-time whose calendar date is `date`.
    DateOn { field: String, date: NaiveDate },
}

impl Predicate {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::FieldContains { field, needle } => record
                .value(field)
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            Self::FieldEqualsIgnoreCase { field, value } => {
                normalize(record.value(field)) == normalize(value)
            }
            Self::DateOn { field, date } => parse_date(record.value(field)) == Some(*date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Match(Predicate),
    SortByInsertion,
    Skip(usize),
    Limit(usize),
}

/// Apply pipeline stages in order to an already-fetched document list.
pub fn apply_stages(mut docs: Vec<Document>, stages: &[Stage]) -> Vec<Document> {
    for stage in stages {
        match stage {
            Stage::Match(pred) => docs.retain(|d| pred.matches(&d.record)),
            Stage::SortByInsertion => docs.sort_by_key(|d| d.id),
            Stage::Skip(n) => {
                let n = (*n).min(docs.len());
                docs.drain(..n);
            }
            Stage::Limit(n) => docs.truncate(*n),
        }
    }
    docs
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Read side is `&self`; bulk load needs `&mut self`, so a load must finish
/// before any reconciliation borrows the store.
pub trait RecordStore {
    /// Documents matching `predicate`, in insertion order.
    fn query(&self, collection: Collection, predicate: &Predicate) -> Result<Vec<Document>, ReconError>;

    fn count(&self, collection: Collection) -> Result<usize, ReconError>;

    fn insert_many(&mut self, collection: Collection, records: Vec<Record>) -> Result<Vec<DocumentId>, ReconError>;

    fn run_pipeline(&self, collection: Collection, stages: &[Stage]) -> Result<Vec<Document>, ReconError> {
        let docs = self.query(collection, &Predicate::All)?;
        Ok(apply_stages(docs, stages))
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Vec-backed store. Ids are shared across both collections, like a single
/// database sequence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    next_id: u64,
    primary: Vec<Document>,
    secondary: Vec<Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with both collections.
    pub fn with_records(primary: Vec<Record>, secondary: Vec<Record>) -> Self {
        let mut store = Self::new();
        store.push_all(Collection::Primary, primary);
        store.push_all(Collection::Secondary, secondary);
        store
    }

    fn docs(&self, collection: Collection) -> &[Document] {
        match collection {
            Collection::Primary => &self.primary,
            Collection::Secondary => &self.secondary,
        }
    }

    fn push_all(&mut self, collection: Collection, records: Vec<Record>) -> Vec<DocumentId> {
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            self.next_id += 1;
            let id = DocumentId(self.next_id);
            let doc = Document { id, collection, record };
            match collection {
                Collection::Primary => self.primary.push(doc),
                Collection::Secondary => self.secondary.push(doc),
            }
            ids.push(id);
        }
        ids
    }
}

impl RecordStore for MemoryStore {
    fn query(&self, collection: Collection, predicate: &Predicate) -> Result<Vec<Document>, ReconError> {
        Ok(self
            .docs(collection)
            .iter()
            .filter(|d| predicate.matches(&d.record))
            .cloned()
            .collect())
    }

    fn count(&self, collection: Collection) -> Result<usize, ReconError> {
        Ok(self.docs(collection).len())
    }

    fn insert_many(&mut self, collection: Collection, records: Vec<Record>) -> Result<Vec<DocumentId>, ReconError> {
        Ok(self.push_all(collection, records))
    }
}
