// Bulk load: weekly report CSVs and database dumps into a record store

use std::path::{Path, PathBuf};

use log::info;
use reckoning_recon::project::{resolve_columns, ColumnOrder};
use reckoning_recon::{Collection, ReconError, RecordStore, ReportTable};

use crate::csv::{read_table, write_table};

/// Files matching a glob pattern (e.g. `weekly_qa_report_week*.csv`), sorted.
pub fn discover(pattern: &str) -> Result<Vec<PathBuf>, ReconError> {
    let paths = glob::glob(pattern)
        .map_err(|e| ReconError::Io(format!("bad pattern '{pattern}': {e}")))?;
    let mut files = Vec::new();
    for entry in paths {
        files.push(entry.map_err(|e| ReconError::Io(e.to_string()))?);
    }
    files.sort();
    Ok(files)
}

/// Concatenate CSV files into one. Columns are the first-seen union across
/// inputs. Returns the number of data rows written.
pub fn combine_csv_files(inputs: &[PathBuf], output: &Path) -> Result<usize, ReconError> {
    let mut records = Vec::new();
    for input in inputs {
        let table = read_required(input)?;
        records.extend(table.records);
    }

    let columns = resolve_columns(&records, &ColumnOrder::FirstSeen);
    let combined = ReportTable { columns, records };
    write_table(&combined, output)?;
    info!(
        "combined {} file(s) into {} ({} rows)",
        inputs.len(),
        output.display(),
        combined.len()
    );
    Ok(combined.len())
}

/// Read a CSV and append its rows to `collection`. Returns rows inserted.
pub fn load_csv_into<S: RecordStore + ?Sized>(
    store: &mut S,
    collection: Collection,
    path: &Path,
) -> Result<usize, ReconError> {
    let table = read_required(path)?;
    let n = table.len();
    store.insert_many(collection, table.records)?;
    info!("loaded {n} record(s) from {} into {collection}", path.display());
    Ok(n)
}

/// Bulk load is not a fail-soft path: a missing input is an error.
fn read_required(path: &Path) -> Result<ReportTable, ReconError> {
    if !path.is_file() {
        return Err(ReconError::Io(format!("cannot read {}: no such file", path.display())));
    }
    read_table(path)
}
