use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Collections + documents
// ---------------------------------------------------------------------------

/// One of the two peer collections. Same schema conventions, independent origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Primary,
    Secondary,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

/// Store-assigned insertion sequence number. Strictly increasing per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

/// A record as held by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub collection: Collection,
    pub record: Record,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A flat, schema-less report record. Field order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Field value, or the empty string when the field is absent.
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Set a field. Existing fields keep their position; new fields append.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.fields.iter().position(|(k, _)| k == name)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.fields.retain(|(k, _)| keep(k));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field pairs sorted by name. Two records with equal content keys are the
    /// same record regardless of field order.
    pub fn content_key(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self.iter().collect();
        pairs.sort_unstable();
        pairs
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    ExportByOwner,
    AllWorkByOwner,
    RepeatableBugs,
    BlockerBugs,
    ReportsOnDate,
    ExportByPosition,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::ExportByOwner,
        Operation::AllWorkByOwner,
        Operation::RepeatableBugs,
        Operation::BlockerBugs,
        Operation::ReportsOnDate,
        Operation::ExportByPosition,
    ];

    /// Name used in config `[columns]` keys.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExportByOwner => "export_by_owner",
            Self::AllWorkByOwner => "all_work_by_owner",
            Self::RepeatableBugs => "repeatable_bugs",
            Self::BlockerBugs => "blocker_bugs",
            Self::ReportsOnDate => "reports_on_date",
            Self::ExportByPosition => "export_by_position",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| format!("unknown operation: '{s}'"))
    }
}

/// Ordinal position within the secondary collection's insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    First,
    Middle,
    Last,
}

impl Position {
    /// Index for a collection of `count` documents, `None` when empty.
    pub fn index(&self, count: usize) -> Option<usize> {
        if count == 0 {
            return None;
        }
        Some(match self {
            Self::First => 0,
            Self::Middle => count / 2,
            Self::Last => count - 1,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Middle => write!(f, "middle"),
            Self::Last => write!(f, "last"),
        }
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "middle" => Ok(Self::Middle),
            "last" => Ok(Self::Last),
            other => Err(format!("unknown position: '{other}' (expected first, middle or last)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Projected records plus the column order they serialize under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportTable {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl ReportTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cell values per record, in column order. Absent fields are empty.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        self.records
            .iter()
            .map(|r| self.columns.iter().map(|c| r.value(c)).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStatus {
    Matched(usize),
    /// The filter matched nothing. Not an error.
    Empty,
    /// Position selection against an empty collection.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub operation: Operation,
    pub status: SelectionStatus,
    pub table: ReportTable,
}

impl Selection {
    pub fn count(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
