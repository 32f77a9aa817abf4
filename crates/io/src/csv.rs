// CSV/TSV tabular import/export

use std::io::Read;
use std::path::Path;

use log::debug;
use reckoning_recon::{ReconError, Record, ReportTable};

/// Write a header row plus one row per record. Absent fields render empty.
pub fn write_table(table: &ReportTable, path: &Path) -> Result<(), ReconError> {
    write_table_with_delimiter(table, path, b',')
}

pub fn write_table_tsv(table: &ReportTable, path: &Path) -> Result<(), ReconError> {
    write_table_with_delimiter(table, path, b'\t')
}

pub fn write_table_with_delimiter(table: &ReportTable, path: &Path, delimiter: u8) -> Result<(), ReconError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(io_err)?;

    writer.write_record(&table.columns).map_err(io_err)?;
    for row in table.rows() {
        writer.write_record(&row).map_err(io_err)?;
    }

    writer.flush()?;
    debug!("wrote {} row(s) to {}", table.len(), path.display());
    Ok(())
}

/// Read a delimited file with a header row into records.
///
/// A missing file is not an error: it yields an empty table.
pub fn read_table(path: &Path) -> Result<ReportTable, ReconError> {
    if !path.exists() {
        return Ok(ReportTable::default());
    }
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    read_table_from_str(&content, delimiter)
}

/// Records only, header discarded. Missing file yields an empty sequence.
pub fn read_records(path: &Path) -> Result<Vec<Record>, ReconError> {
    Ok(read_table(path)?.records)
}

pub fn read_table_from_str(content: &str, delimiter: u8) -> Result<ReportTable, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(io_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(io_err)?;
        // Short rows leave trailing fields absent; extra cells are dropped
        let record: Record = columns
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        records.push(record);
    }

    Ok(ReportTable { columns, records })
}

/// Records inspected after the header when guessing the delimiter.
const SNIFF_ROWS: usize = 5;

/// Guess the delimiter from the header and the first few records.
///
/// A candidate qualifies when the header splits into more than one field and
/// every sampled record has the same width. The widest qualifying header
/// wins; ties go to the earlier candidate. Falls back to comma.
fn sniff_delimiter(content: &str) -> u8 {
    let mut best: Option<(u8, usize)> = None;

    for delim in [b',', b'\t', b';', b'|'] {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delim)
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());
        let widths: Vec<usize> = reader
            .records()
            .take(SNIFF_ROWS + 1)
            .map_while(Result::ok)
            .map(|r| r.len())
            .collect();

        let Some(&header) = widths.first() else { continue };
        if header < 2 || widths.iter().any(|&w| w != header) {
            continue;
        }
        if best.map_or(true, |(_, width)| header > width) {
            best = Some((delim, header));
        }
    }

    best.map_or(b',', |(delim, _)| delim)
}

/// Read file and convert to UTF-8 if needed (Excel exports are often Windows-1252).
pub fn read_file_as_utf8(path: &Path) -> Result<String, ReconError> {
    let mut file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    match String::from_utf8(bytes) {
        Ok(s) if s.starts_with('\u{feff}') => Ok(s['\u{feff}'.len_utf8()..].to_string()),
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn io_err(e: csv::Error) -> ReconError {
    ReconError::Io(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn table() -> ReportTable {
        ReportTable {
            columns: vec!["Build #".into(), "Test Case".into(), "Notes".into()],
            records: vec![
                [("Build #", "B1"), ("Test Case", "Login, SSO"), ("Notes", "flaky")]
                    .into_iter()
                    .collect(),
                [("Test Case", "Search"), ("Build #", "B2")].into_iter().collect(),
            ],
        }
    }

    #[test]
    fn export_writes_header_and_empty_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_table(&table(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Build #,Test Case,Notes\nB1,\"Login, SSO\",flaky\nB2,Search,\n"
        );
    }

    #[test]
    fn export_then_import_preserves_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        write_table_tsv(&table(), &path).unwrap();

        let back = read_table(&path).unwrap();
        assert_eq!(back.columns, table().columns);
        assert_eq!(back.records[0].value("Test Case"), "Login, SSO");
        // Empty cell reads back as an empty value, not an absent one
        assert_eq!(back.records[1].get("Notes"), Some(""));
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let records = read_records(&dir.path().join("nope.csv")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn short_rows_leave_fields_absent() {
        let t = read_table_from_str("a,b,c\n1,2\n", b',').unwrap();
        assert_eq!(t.records[0].get("b"), Some("2"));
        assert_eq!(t.records[0].get("c"), None);
    }

    #[test]
    fn windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "Test Owner\nRené\n" with é as 0xE9
        fs::write(&path, b"Test Owner\nRen\xe9\n").unwrap();
        let records = read_records(&path).unwrap();
        assert_eq!(records[0].value("Test Owner"), "René");
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        fs::write(&path, "\u{feff}Build #,Category\nB1,UI\n").unwrap();
        let t = read_table(&path).unwrap();
        assert_eq!(t.columns[0], "Build #");
    }

    #[test]
    fn sniff_picks_semicolon_over_commas_in_values() {
        let content = "Build #;Test Case;Notes\nB1;\"Login, SSO\";flaky\nB2;Search;\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn sniff_tab_separated_dump() {
        let content = "Test #\tBuild #\tTest Owner\n1\t2024-03-01\talice\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn sniff_handles_quoted_line_breaks() {
        // The second record spans two physical lines
        let content = "Test Case|Notes\nLogin|\"fails on\nretry, twice\"\nSearch|ok\n";
        assert_eq!(sniff_delimiter(content), b'|');
    }

    #[test]
    fn sniff_defaults_to_comma() {
        assert_eq!(sniff_delimiter(""), b',');
        assert_eq!(sniff_delimiter("Test Owner\nalice\n"), b',');
    }
}
