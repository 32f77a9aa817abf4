use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use crate::error::ReconError;
use crate::model::Operation;
use crate::project::ColumnOrder;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconConfig {
    #[serde(default)]
    pub collections: CollectionNames,
    #[serde(default)]
    pub fields: FieldNames,
    #[serde(default)]
    pub owner_display: OwnerDisplay,
    /// Canonical column order per operation, keyed by operation name.
    #[serde(default)]
    pub columns: BTreeMap<String, Vec<String>>,
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionNames {
    #[serde(default = "default_primary")]
    pub primary: String,
    #[serde(default = "default_secondary")]
    pub secondary: String,
}

fn default_primary() -> String {
    "collection_1".into()
}

fn default_secondary() -> String {
    "collection_2".into()
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            secondary: default_secondary(),
        }
    }
}

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

/// Names of the conventional fields used as identity or filter keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub build: String,
    pub category: String,
    pub test_case: String,
    pub test_owner: String,
    pub repeatable: String,
    pub blocker: String,
    pub test_number: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            build: "Build #".into(),
            category: "Category".into(),
            test_case: "Test Case".into(),
            test_owner: "Test Owner".into(),
            repeatable: "Repeatable?".into(),
            blocker: "Blocker?".into(),
            test_number: "Test #".into(),
        }
    }
}

impl FieldNames {
    fn all(&self) -> [(&'static str, &str); 7] {
        [
            ("build", self.build.as_str()),
            ("category", self.category.as_str()),
            ("test_case", self.test_case.as_str()),
            ("test_owner", self.test_owner.as_str()),
            ("repeatable", self.repeatable.as_str()),
            ("blocker", self.blocker.as_str()),
            ("test_number", self.test_number.as_str()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Owner display policy
// ---------------------------------------------------------------------------

/// What the Test Owner column shows in all-work-by-owner results.
///
/// `Stored` keeps each record's own value. `Query` replaces it with the
/// caller's query string before deduplication, so owner spellings that differ
/// only in capitalization collapse into one display value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerDisplay {
    #[default]
    Stored,
    Query,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        for (key, name) in self.fields.all() {
            if name.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "fields.{key} must not be empty"
                )));
            }
        }

        if self.collections.primary.trim().is_empty() || self.collections.secondary.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "collection names must not be empty".into(),
            ));
        }
        if self.collections.primary == self.collections.secondary {
            return Err(ReconError::ConfigValidation(format!(
                "primary and secondary collections must differ, both are '{}'",
                self.collections.primary
            )));
        }

        for (op_name, columns) in &self.columns {
            op_name
                .parse::<Operation>()
                .map_err(|e| ReconError::ConfigValidation(format!("columns: {e}")))?;

            let mut seen = HashSet::new();
            for col in columns {
                if !seen.insert(col.as_str()) {
                    return Err(ReconError::ConfigValidation(format!(
                        "columns.{op_name}: duplicate column '{col}'"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Registered column order for an operation, or first-seen order if none.
    pub fn column_order(&self, operation: Operation) -> ColumnOrder {
        match self.columns.get(operation.name()) {
            Some(cols) => ColumnOrder::Fixed(cols.clone()),
            None => ColumnOrder::FirstSeen,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
