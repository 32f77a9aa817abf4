//! Merge freshly selected records into a previously exported record set.

use std::collections::HashSet;

use crate::config::FieldNames;
use crate::model::{Record, ReportTable};
use crate::normalize::{IdentityKey, KeySpec};
use crate::project::{resolve_columns, strip_internal, ColumnOrder};

/// Identity used when appending: Build, Category, Test Case, Test Owner.
pub fn append_key(fields: &FieldNames) -> KeySpec {
    KeySpec::normalized(&[&fields.build, &fields.category, &fields.test_case, &fields.test_owner])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Existing rows followed by the newly added ones.
    pub table: ReportTable,
    /// Rows added on top of `existing`.
    pub added: usize,
}

/// Append the records of `incoming` whose identity is not already present.
///
/// `existing_columns` is the header of the prior export; it is kept as-is
/// and new columns are appended after it. Incoming records are also
/// deduplicated among themselves.
pub fn merge_append(
    existing_columns: &[String],
    existing: Vec<Record>,
    incoming: Vec<Record>,
    key: &KeySpec,
) -> AppendOutcome {
    let mut seen: HashSet<IdentityKey> = existing.iter().map(|r| key.key_of(r)).collect();

    let mut records = existing;
    let before = records.len();
    for record in incoming {
        if seen.insert(key.key_of(&record)) {
            records.push(strip_internal(record));
        }
    }
    let added = records.len() - before;

    let columns = resolve_columns(&records, &ColumnOrder::Fixed(existing_columns.to_vec()));
    AppendOutcome {
        table: ReportTable { columns, records },
        added,
    }
}
