// Selection export: fresh files and incremental append

use std::path::Path;

use log::{info, warn};
use reckoning_recon::append::{append_key, merge_append};
use reckoning_recon::config::FieldNames;
use reckoning_recon::{ReconError, Selection};

use crate::csv::{read_table, write_table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    Written { rows: usize },
    /// Nothing selected; no file was created or touched.
    Skipped,
}

/// Write a selection to `path`, unless it is empty.
pub fn export_selection(selection: &Selection, path: &Path) -> Result<ExportStatus, ReconError> {
    if selection.is_empty() {
        info!("{}: nothing selected, not writing {}", selection.operation, path.display());
        return Ok(ExportStatus::Skipped);
    }
    write_table(&selection.table, path)?;
    info!(
        "{}: exported {} row(s) to {}",
        selection.operation,
        selection.count(),
        path.display()
    );
    Ok(ExportStatus::Written {
        rows: selection.count(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendReport {
    /// Rows added by this run.
    pub added: usize,
    /// Rows in the file after this run.
    pub total: usize,
    /// The file did not exist before this run.
    pub created: bool,
}

/// Merge a selection into a previous export, keyed by Build, Category,
/// Test Case and Test Owner.
///
/// A missing file starts fresh. When nothing new is found the existing file
/// is left byte-for-byte untouched.
pub fn append_export(selection: &Selection, path: &Path, fields: &FieldNames) -> Result<AppendReport, ReconError> {
    let existed = path.exists();
    if !existed {
        warn!("no prior export at {}, starting fresh", path.display());
    }
    let existing = read_table(path)?;
    let prior_rows = existing.len();

    if selection.is_empty() {
        info!("{}: no records selected, {} unchanged", selection.operation, path.display());
        return Ok(AppendReport {
            added: 0,
            total: prior_rows,
            created: false,
        });
    }

    let base_columns = if existed {
        existing.columns
    } else {
        selection.table.columns.clone()
    };
    let outcome = merge_append(
        &base_columns,
        existing.records,
        selection.table.records.clone(),
        &append_key(fields),
    );

    if outcome.added == 0 {
        info!("{}: no new records, {} unchanged", selection.operation, path.display());
        return Ok(AppendReport {
            added: 0,
            total: prior_rows,
            created: false,
        });
    }

    write_table(&outcome.table, path)?;
    info!(
        "{}: appended {} new row(s) to {} ({} total)",
        selection.operation,
        outcome.added,
        path.display(),
        outcome.table.len()
    );
    Ok(AppendReport {
        added: outcome.added,
        total: outcome.table.len(),
        created: !existed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use reckoning_recon::{Operation, Record, ReportTable, SelectionStatus};
    use tempfile::tempdir;

    fn selection(records: Vec<Record>) -> Selection {
        let columns = reckoning_recon::project::resolve_columns(
            &records,
            &reckoning_recon::project::ColumnOrder::FirstSeen,
        );
        Selection {
            operation: Operation::AllWorkByOwner,
            status: if records.is_empty() {
                SelectionStatus::Empty
            } else {
                SelectionStatus::Matched(records.len())
            },
            table: ReportTable { columns, records },
        }
    }

    fn row(build: &str, case: &str) -> Record {
        [("Build #", build), ("Category", "UI"), ("Test Case", case), ("Test Owner", "alice")]
            .into_iter()
            .collect()
    }

    #[test]
    fn empty_selection_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let status = export_selection(&selection(vec![]), &path).unwrap();
        assert_eq!(status, ExportStatus::Skipped);
        assert!(!path.exists());
    }

    #[test]
    fn export_writes_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let status = export_selection(&selection(vec![row("B1", "Login")]), &path).unwrap();
        assert_eq!(status, ExportStatus::Written { rows: 1 });
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Build #,Category,Test Case,Test Owner\nB1,UI,Login,alice\n"
        );
    }

    #[test]
    fn append_starts_fresh_then_adds_only_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alice_combined_work.csv");
        let fields = FieldNames::default();

        let first = append_export(&selection(vec![row("B1", "Login")]), &path, &fields).unwrap();
        assert_eq!(first, AppendReport { added: 1, total: 1, created: true });

        let second = append_export(
            &selection(vec![row("B1", "Login"), row("B2", "Search")]),
            &path,
            &fields,
        )
        .unwrap();
        assert_eq!(second, AppendReport { added: 1, total: 2, created: false });
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Build #,Category,Test Case,Test Owner\nB1,UI,Login,alice\nB2,UI,Search,alice\n"
        );
    }

    #[test]
    fn append_with_nothing_new_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        // Hand-written file with formatting the writer would not reproduce
        fs::write(&path, "\"Build #\",\"Category\",\"Test Case\",\"Test Owner\"\r\n\"B1\",\"UI\",\"Login\",\"alice\"\r\n").unwrap();
        let before = fs::read(&path).unwrap();

        let report = append_export(&selection(vec![row("B1", "Login")]), &path, &FieldNames::default()).unwrap();
        assert_eq!(report.added, 0);
        assert_eq!(fs::read(&path).unwrap(), before);

        let report = append_export(&selection(vec![]), &path, &FieldNames::default()).unwrap();
        assert_eq!(report, AppendReport { added: 0, total: 1, created: false });
        assert_eq!(fs::read(&path).unwrap(), before);
    }
}
