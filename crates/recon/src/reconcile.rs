//! Union + deduplication over two document streams.
//!
//! Pure functions: no store access, so every policy is testable against
//! in-memory sequences.

use std::collections::{HashMap, HashSet};

use crate::model::Document;
use crate::normalize::{IdentityKey, KeySpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Keep the first document seen per identity key. Primary is scanned
    /// first, so Primary wins ties.
    FirstWins,
    /// Keep every distinct full record per identity key, then flatten groups
    /// in first-seen order. Exact duplicates collapse; near-duplicates stay.
    SetUnion,
}

/// Every primary document followed by every secondary document.
pub fn union(
    primary: impl IntoIterator<Item = Document>,
    secondary: impl IntoIterator<Item = Document>,
) -> impl Iterator<Item = Document> {
    primary.into_iter().chain(secondary)
}

/// Union both streams and collapse them under `policy`.
pub fn reconcile(
    primary: impl IntoIterator<Item = Document>,
    secondary: impl IntoIterator<Item = Document>,
    key: &KeySpec,
    policy: DedupPolicy,
) -> Vec<Document> {
    let merged = union(primary, secondary);
    match policy {
        DedupPolicy::FirstWins => dedup_first_wins(merged, key),
        DedupPolicy::SetUnion => dedup_set_union(merged, key),
    }
}

pub fn dedup_first_wins(stream: impl Iterator<Item = Document>, key: &KeySpec) -> Vec<Document> {
    let mut seen: HashSet<IdentityKey> = HashSet::new();
    stream.filter(|doc| seen.insert(key.key_of(&doc.record))).collect()
}

pub fn dedup_set_union(stream: impl Iterator<Item = Document>, key: &KeySpec) -> Vec<Document> {
    // Content keys are owned strings: documents move into `groups` below.
    type ContentKey = Vec<(String, String)>;

    let mut group_index: HashMap<IdentityKey, usize> = HashMap::new();
    let mut groups: Vec<(HashSet<ContentKey>, Vec<Document>)> = Vec::new();

    for doc in stream {
        let id_key = key.key_of(&doc.record);
        let slot = *group_index.entry(id_key).or_insert_with(|| {
            groups.push((HashSet::new(), Vec::new()));
            groups.len() - 1
        });

        let content: ContentKey = doc
            .record
            .content_key()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let (distinct, docs) = &mut groups[slot];
        if distinct.insert(content) {
            docs.push(doc);
        }
    }

    groups.into_iter().flat_map(|(_, docs)| docs).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Collection, DocumentId, Record};
    use crate::normalize::KeyField;

    fn doc(id: u64, collection: Collection, pairs: &[(&str, &str)]) -> Document {
        Document {
            id: DocumentId(id),
            collection,
            record: pairs.iter().copied().collect::<Record>(),
        }
    }

    fn blocker_key() -> KeySpec {
        KeySpec::normalized(&["Build #", "Category", "Test Case", "Test Owner"])
    }

    #[test]
    fn union_is_primary_then_secondary() {
        let p = vec![doc(1, Collection::Primary, &[("n", "p1")]), doc(3, Collection::Primary, &[("n", "p2")])];
        let s = vec![doc(2, Collection::Secondary, &[("n", "s1")])];
        let names: Vec<String> = union(p, s).map(|d| d.record.value("n").to_string()).collect();
        assert_eq!(names, vec!["p1", "p2", "s1"]);
    }

    #[test]
    fn first_wins_prefers_primary_copy() {
        let p = vec![doc(1, Collection::Primary, &[
            ("Build #", "B1"), ("Category", "UI"), ("Test Case", "Login"), ("Test Owner", "alice"),
            ("Notes", "primary"),
        ])];
        let s = vec![doc(2, Collection::Secondary, &[
            ("Build #", "B1"), ("Category", "UI"), ("Test Case", "Login"), ("Test Owner", "alice"),
            ("Notes", "secondary"),
        ])];
        let out = reconcile(p, s, &blocker_key(), DedupPolicy::FirstWins);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].collection, Collection::Primary);
        assert_eq!(out[0].record.value("Notes"), "primary");
    }

    #[test]
    fn first_wins_collapses_case_and_whitespace() {
        let p = vec![doc(1, Collection::Primary, &[
            ("Build #", "B1"), ("Category", "UI"), ("Test Case", "Login Page"), ("Test Owner", "Alice"),
        ])];
        let s = vec![doc(2, Collection::Secondary, &[
            ("Build #", " b1"), ("Category", "ui "), ("Test Case", "  LOGIN PAGE"), ("Test Owner", "alice"),
        ])];
        let out = reconcile(p, s, &blocker_key(), DedupPolicy::FirstWins);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn first_wins_is_idempotent() {
        let p = vec![
            doc(1, Collection::Primary, &[("Build #", "B1"), ("Test Case", "a")]),
            doc(2, Collection::Primary, &[("Build #", "B2"), ("Test Case", "a")]),
        ];
        let s = vec![
            doc(3, Collection::Secondary, &[("Build #", "B1"), ("Test Case", "a")]),
            doc(4, Collection::Secondary, &[("Build #", "B3"), ("Test Case", "c")]),
        ];
        let first = reconcile(p.clone(), s.clone(), &blocker_key(), DedupPolicy::FirstWins);
        let second = reconcile(p, s, &blocker_key(), DedupPolicy::FirstWins);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn missing_key_fields_are_not_skipped() {
        let p = vec![doc(1, Collection::Primary, &[("Notes", "no keys at all")])];
        let s = vec![doc(2, Collection::Secondary, &[("Build #", "B1")])];
        let out = reconcile(p, s, &blocker_key(), DedupPolicy::FirstWins);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn empty_streams_yield_empty_result() {
        let out = reconcile(Vec::new(), Vec::new(), &blocker_key(), DedupPolicy::SetUnion);
        assert!(out.is_empty());
    }

    fn all_work_key() -> KeySpec {
        KeySpec::new(vec![
            KeyField::Raw("Build #".into()),
            KeyField::Raw("Category".into()),
            KeyField::Normalized("Test Case".into()),
            KeyField::Normalized("Build #".into()),
        ])
    }

    #[test]
    fn set_union_collapses_exact_duplicates_only() {
        let p = vec![
            doc(1, Collection::Primary, &[("Build #", "B1"), ("Category", "UI"), ("Test Case", "Login"), ("Notes", "x")]),
        ];
        let s = vec![
            // same content, different store id and field order
            doc(2, Collection::Secondary, &[("Notes", "x"), ("Category", "UI"), ("Test Case", "Login"), ("Build #", "B1")]),
            // same key, different incidental field
            doc(3, Collection::Secondary, &[("Build #", "B1"), ("Category", "UI"), ("Test Case", "Login"), ("Notes", "y")]),
        ];
        let out = reconcile(p, s, &all_work_key(), DedupPolicy::SetUnion);
        let notes: Vec<&str> = out.iter().map(|d| d.record.value("Notes")).collect();
        assert_eq!(notes, vec!["x", "y"]);
        assert_eq!(out[0].collection, Collection::Primary);
    }

    #[test]
    fn set_union_flattens_in_first_seen_group_order() {
        let p = vec![
            doc(1, Collection::Primary, &[("Build #", "B2"), ("Test Case", "a"), ("v", "1")]),
            doc(2, Collection::Primary, &[("Build #", "B1"), ("Test Case", "a"), ("v", "2")]),
        ];
        let s = vec![doc(3, Collection::Secondary, &[("Build #", "B2"), ("Test Case", "A "), ("v", "3")])];
        let out = reconcile(p, s, &all_work_key(), DedupPolicy::SetUnion);
        let vs: Vec<&str> = out.iter().map(|d| d.record.value("v")).collect();
        // B2 group (docs 1 and 3) comes first because it was seen first
        assert_eq!(vs, vec!["1", "3", "2"]);
    }
}
