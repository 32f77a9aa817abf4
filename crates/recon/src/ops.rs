//! The selection operations: query both collections, union, deduplicate,
//! project.

use log::debug;

use crate::config::{OwnerDisplay, ReconConfig};
use crate::dates::parse_date;
use crate::error::ReconError;
use crate::model::{Collection, Document, Operation, Position, Selection, SelectionStatus};
use crate::normalize::{KeyField, KeySpec};
use crate::project::project;
use crate::reconcile::{reconcile, DedupPolicy};
use crate::store::{Predicate, RecordStore, Stage};

/// Runs selection operations against an explicitly passed, read-only store.
pub struct Reconciler<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    config: &'a ReconConfig,
}

impl<'a, S: RecordStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S, config: &'a ReconConfig) -> Self {
        Self { store, config }
    }

    /// Secondary-collection records whose Test Owner contains `owner`.
    pub fn export_by_owner(&self, owner: &str) -> Result<Selection, ReconError> {
        let docs = self
            .store
            .query(Collection::Secondary, &self.owner_predicate(owner))?;
        debug!("export_by_owner '{owner}': {} secondary match(es)", docs.len());
        Ok(self.finish(Operation::ExportByOwner, docs))
    }

    /// Records from both collections whose Test Owner contains `owner`,
    /// collapsed with the set-union policy.
    pub fn all_work_by_owner(&self, owner: &str) -> Result<Selection, ReconError> {
        let pred = self.owner_predicate(owner);
        let (mut primary, mut secondary) = self.query_both(&pred)?;

        if self.config.owner_display == OwnerDisplay::Query {
            let field = &self.config.fields.test_owner;
            for doc in primary.iter_mut().chain(secondary.iter_mut()) {
                doc.record.set(field.as_str(), owner);
            }
        }

        let f = &self.config.fields;
        let key = KeySpec::new(vec![
            KeyField::Raw(f.build.clone()),
            KeyField::Raw(f.category.clone()),
            KeyField::Normalized(f.test_case.clone()),
            KeyField::Normalized(f.build.clone()),
        ]);
        let docs = reconcile(primary, secondary, &key, DedupPolicy::SetUnion);
        debug!("all_work_by_owner '{owner}': {} after set-union", docs.len());
        Ok(self.finish(Operation::AllWorkByOwner, docs))
    }

    /// Records flagged repeatable in either collection, first copy wins.
    pub fn repeatable_bugs(&self) -> Result<Selection, ReconError> {
        let f = &self.config.fields;
        let pred = Predicate::FieldEqualsIgnoreCase {
            field: f.repeatable.clone(),
            value: "yes".into(),
        };
        let key = KeySpec::normalized(&[&f.test_number, &f.build, &f.category, &f.test_case, &f.test_owner]);
        self.first_wins(Operation::RepeatableBugs, &pred, &key)
    }

    /// Records flagged as blockers in either collection, first copy wins.
    pub fn blocker_bugs(&self) -> Result<Selection, ReconError> {
        let f = &self.config.fields;
        let pred = Predicate::FieldEqualsIgnoreCase {
            field: f.blocker.clone(),
            value: "yes".into(),
        };
        let key = KeySpec::normalized(&[&f.build, &f.category, &f.test_case, &f.test_owner]);
        self.first_wins(Operation::BlockerBugs, &pred, &key)
    }

    /// Records whose Build Identifier falls on `date`, first copy wins.
    ///
    /// `date` is a caller-supplied calendar date (`2024-03-01`, `03/01/2024`,
    /// or a date-time whose time part is ignored).
    pub fn reports_on_date(&self, date: &str) -> Result<Selection, ReconError> {
        let day = parse_date(date).ok_or_else(|| ReconError::DateParse { value: date.to_string() })?;
        let f = &self.config.fields;
        let pred = Predicate::DateOn {
            field: f.build.clone(),
            date: day,
        };
        let key = KeySpec::new(vec![
            KeyField::DayStart(f.build.clone()),
            KeyField::Normalized(f.category.clone()),
            KeyField::Normalized(f.test_case.clone()),
        ]);
        self.first_wins(Operation::ReportsOnDate, &pred, &key)
    }

    /// Exactly one secondary record by insertion position, or `NotFound`.
    pub fn export_by_position(&self, position: Position) -> Result<Selection, ReconError> {
        let count = self.store.count(Collection::Secondary)?;
        let Some(index) = position.index(count) else {
            debug!("export_by_position {position}: secondary collection is empty");
            return Ok(Selection {
                operation: Operation::ExportByPosition,
                status: SelectionStatus::NotFound,
                table: project(Vec::new(), &self.config.column_order(Operation::ExportByPosition)),
            });
        };

        let docs = self.store.run_pipeline(
            Collection::Secondary,
            &[Stage::SortByInsertion, Stage::Skip(index), Stage::Limit(1)],
        )?;
        debug!("export_by_position {position}: index {index} of {count}");

        let mut selection = self.finish(Operation::ExportByPosition, docs);
        if selection.is_empty() {
            // Count and pipeline disagreed: the collection shrank in between.
            selection.status = SelectionStatus::NotFound;
        }
        Ok(selection)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn owner_predicate(&self, owner: &str) -> Predicate {
        Predicate::FieldContains {
            field: self.config.fields.test_owner.clone(),
            needle: owner.to_string(),
        }
    }

    fn query_both(&self, pred: &Predicate) -> Result<(Vec<Document>, Vec<Document>), ReconError> {
        let primary = self.store.query(Collection::Primary, pred)?;
        let secondary = self.store.query(Collection::Secondary, pred)?;
        debug!(
            "matched {} primary, {} secondary document(s)",
            primary.len(),
            secondary.len()
        );
        Ok((primary, secondary))
    }

    fn first_wins(&self, operation: Operation, pred: &Predicate, key: &KeySpec) -> Result<Selection, ReconError> {
        let (primary, secondary) = self.query_both(pred)?;
        let docs = reconcile(primary, secondary, key, DedupPolicy::FirstWins);
        debug!("{operation}: {} after first-wins dedup", docs.len());
        Ok(self.finish(operation, docs))
    }

    fn finish(&self, operation: Operation, docs: Vec<Document>) -> Selection {
        let table = project(docs, &self.config.column_order(operation));
        let status = if table.is_empty() {
            SelectionStatus::Empty
        } else {
            SelectionStatus::Matched(table.len())
        };
        Selection {
            operation,
            status,
            table,
        }
    }
}
