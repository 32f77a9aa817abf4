// Document store backed by SQLite

use std::path::Path;

use rusqlite::{params, Connection};
use serde_json::{Map, Value};

use reckoning_recon::config::CollectionNames;
use reckoning_recon::store::apply_stages;
use reckoning_recon::{Collection, Document, DocumentId, Predicate, ReconError, Record, RecordStore, Stage};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order, never reused
    collection TEXT NOT NULL,
    body TEXT NOT NULL                     -- JSON object, field order preserved
);

CREATE INDEX IF NOT EXISTS documents_by_collection ON documents (collection, id);
"#;

/// Both collections live in one `documents` table, told apart by name.
pub struct SqliteStore {
    conn: Connection,
    names: CollectionNames,
}

impl SqliteStore {
    pub fn open(path: &Path, names: CollectionNames) -> Result<Self, ReconError> {
        let conn = Connection::open(path).map_err(store_err)?;
        Self::init(conn, names)
    }

    pub fn open_in_memory(names: CollectionNames) -> Result<Self, ReconError> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Self::init(conn, names)
    }

    fn init(conn: Connection, names: CollectionNames) -> Result<Self, ReconError> {
        conn.execute_batch(SCHEMA).map_err(store_err)?;
        Ok(Self { conn, names })
    }

    fn name(&self, collection: Collection) -> &str {
        match collection {
            Collection::Primary => self.names.primary.as_str(),
            Collection::Secondary => self.names.secondary.as_str(),
        }
    }

    fn select(
        &self,
        collection: Collection,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Document>, ReconError> {
        // SQLite treats a negative LIMIT as "no limit"; so is anything past i64::MAX
        let limit = limit.and_then(|l| i64::try_from(l).ok()).unwrap_or(-1);
        let offset = i64::try_from(offset)
            .map_err(|_| ReconError::Store(format!("offset {offset} exceeds SQLite range")))?;
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
            )
            .map_err(store_err)?;

        let rows = stmt
            .query_map(params![self.name(collection), limit, offset], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(store_err)?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, body) = row.map_err(store_err)?;
            docs.push(Document {
                id: DocumentId(id as u64),
                collection,
                record: decode_record(&body)?,
            });
        }
        Ok(docs)
    }
}

impl RecordStore for SqliteStore {
    fn query(&self, collection: Collection, predicate: &Predicate) -> Result<Vec<Document>, ReconError> {
        let mut docs = self.select(collection, None, 0)?;
        docs.retain(|d| predicate.matches(&d.record));
        Ok(docs)
    }

    fn count(&self, collection: Collection) -> Result<usize, ReconError> {
        let n: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![self.name(collection)],
                |row| row.get(0),
            )
            .map_err(store_err)?;
        Ok(n as usize)
    }

    fn insert_many(&mut self, collection: Collection, records: Vec<Record>) -> Result<Vec<DocumentId>, ReconError> {
        let name = self.name(collection).to_string();
        let tx = self.conn.transaction().map_err(store_err)?;
        let mut ids = Vec::with_capacity(records.len());
        {
            let mut stmt = tx
                .prepare("INSERT INTO documents (collection, body) VALUES (?1, ?2)")
                .map_err(store_err)?;
            for record in &records {
                let id = stmt
                    .insert(params![name, encode_record(record)?])
                    .map_err(store_err)?;
                ids.push(DocumentId(id as u64));
            }
        }
        tx.commit().map_err(store_err)?;
        Ok(ids)
    }

    fn run_pipeline(&self, collection: Collection, stages: &[Stage]) -> Result<Vec<Document>, ReconError> {
        if stages.iter().any(|s| matches!(s, Stage::Match(_))) {
            let docs = self.select(collection, None, 0)?;
            return Ok(apply_stages(docs, stages));
        }

        // Sort/skip/limit only: push down as ORDER BY id LIMIT/OFFSET
        let mut offset = 0usize;
        let mut limit: Option<usize> = None;
        for stage in stages {
            match stage {
                Stage::Skip(n) => {
                    offset = offset.saturating_add(*n);
                    limit = limit.map(|l| l.saturating_sub(*n));
                }
                Stage::Limit(n) => limit = Some(limit.map_or(*n, |l| l.min(*n))),
                Stage::SortByInsertion | Stage::Match(_) => {}
            }
        }
        self.select(collection, limit, offset)
    }
}

// ---------------------------------------------------------------------------
// JSON body encoding
// ---------------------------------------------------------------------------

fn encode_record(record: &Record) -> Result<String, ReconError> {
    let map: Map<String, Value> = record
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    serde_json::to_string(&map).map_err(|e| ReconError::Store(format!("encode document: {e}")))
}

/// Non-string JSON scalars (written by other tools) are read back as text.
fn decode_record(body: &str) -> Result<Record, ReconError> {
    let map: Map<String, Value> =
        serde_json::from_str(body).map_err(|e| ReconError::Store(format!("decode document: {e}")))?;
    Ok(map
        .into_iter()
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (k, text)
        })
        .collect())
}

fn store_err(e: rusqlite::Error) -> ReconError {
    ReconError::Store(e.to_string())
}
