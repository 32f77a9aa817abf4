use std::collections::HashSet;

use crate::model::{Document, Record, ReportTable};

/// Store-internal identifier field, as carried by records exported from a
/// document store.
pub const STORE_ID_FIELD: &str = "_id";

/// Derived fields written by older export tooling. Matched by exact name;
/// any other `Normalized ...` field is user data.
pub const LEGACY_DERIVED_FIELDS: &[&str] = &[
    "Normalized Test Owner",
    "Normalized Test Case",
    "Normalized Build",
    "Normalized Repeatable",
];

/// How output columns are ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOrder {
    /// Field names in order of first appearance across all output records.
    FirstSeen,
    /// Registered canonical columns first, then any further fields in
    /// first-seen order.
    Fixed(Vec<String>),
}

/// Fields that never reach an export.
pub fn is_internal_field(name: &str) -> bool {
    name == STORE_ID_FIELD || LEGACY_DERIVED_FIELDS.contains(&name)
}

/// Strip internal fields from a record.
pub fn strip_internal(mut record: Record) -> Record {
    record.retain(|name| !is_internal_field(name));
    record
}

/// Drop store ids and internal fields, then resolve the column order.
pub fn project(docs: Vec<Document>, order: &ColumnOrder) -> ReportTable {
    let records: Vec<Record> = docs.into_iter().map(|d| strip_internal(d.record)).collect();
    let columns = resolve_columns(&records, order);
    ReportTable { columns, records }
}

pub fn resolve_columns(records: &[Record], order: &ColumnOrder) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    if let ColumnOrder::Fixed(fixed) = order {
        for col in fixed {
            if seen.insert(col.clone()) {
                columns.push(col.clone());
            }
        }
    }

    for record in records {
        for name in record.names() {
            if !is_internal_field(name) && seen.insert(name.to_string()) {
                columns.push(name.to_string());
            }
        }
    }

    columns
}
