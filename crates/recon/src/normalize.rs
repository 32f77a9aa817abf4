//! Comparison keys derived from raw text fields.
//!
//! Keys are computed inline; records are never mutated.

use crate::dates::{canonical_day_start, parse_date};
use crate::model::Record;

/// Lower-case, whitespace-trimmed copy of a field value.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyField {
    /// Field value as stored.
    Raw(String),
    /// Field value passed through [`normalize`].
    Normalized(String),
    /// Date-valued field reduced to its canonical day start
    /// (`2024-03-01 00:00:00`). Unparseable values fall back to [`normalize`].
    DayStart(String),
}

/// Ordered list of key components that identify "the same logical record".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    fields: Vec<KeyField>,
}

/// Identity key tuple. Missing source fields contribute an empty component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(pub Vec<String>);

impl KeySpec {
    pub fn new(fields: Vec<KeyField>) -> Self {
        Self { fields }
    }

    /// Every named field compared case- and whitespace-insensitively.
    pub fn normalized<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(
            names
                .iter()
                .map(|n| KeyField::Normalized(n.as_ref().to_string()))
                .collect(),
        )
    }

    pub fn key_of(&self, record: &Record) -> IdentityKey {
        IdentityKey(
            self.fields
                .iter()
                .map(|f| match f {
                    KeyField::Raw(name) => record.value(name).to_string(),
                    KeyField::Normalized(name) => normalize(record.value(name)),
                    KeyField::DayStart(name) => {
                        let value = record.value(name);
                        match parse_date(value) {
                            Some(day) => canonical_day_start(day),
                            None => normalize(value),
                        }
                    }
                })
                .collect(),
        )
    }
}
