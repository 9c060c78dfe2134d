//! In-memory fact store for durable key/value facts of one session.
//!
//! Keys are case-folded before indexing, so `Name` and `name` share one
//! record. The store is bounded by [`FactStore::cleanup`], which keeps the
//! most recently written facts. Nothing here can fail.

use chrono::{DateTime, Utc};
use contextclaw_core::fact::{Fact, FactCandidate};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct StoredFact {
    fact: Fact,
    /// Write sequence; breaks `updated_at` ties during eviction.
    seq: u64,
}

/// Canonical key → fact map with recency-based eviction.
#[derive(Debug, Clone, Default)]
pub struct FactStore {
    entries: BTreeMap<String, StoredFact>,
    next_seq: u64,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write or replace each candidate, stamping it with the current time.
    /// Returns the number of records written.
    pub fn upsert<I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = FactCandidate>,
    {
        self.upsert_at(candidates, Utc::now())
    }

    /// [`upsert`](Self::upsert) with an explicit timestamp.
    pub fn upsert_at<I>(&mut self, candidates: I, now: DateTime<Utc>) -> usize
    where
        I: IntoIterator<Item = FactCandidate>,
    {
        let mut written = 0;
        for candidate in candidates {
            let canonical = Fact::canonical_key(&candidate.key);
            let seq = self.next_seq;
            self.next_seq += 1;
            self.entries.insert(
                canonical,
                StoredFact {
                    fact: Fact {
                        key: candidate.key,
                        value: candidate.value,
                        source: candidate.source,
                        updated_at: now,
                    },
                    seq,
                },
            );
            written += 1;
        }
        written
    }

    /// Look up a fact by key, ignoring case.
    pub fn get(&self, key: &str) -> Option<&Fact> {
        self.entries
            .get(&Fact::canonical_key(key))
            .map(|stored| &stored.fact)
    }

    /// Delete a fact by key, ignoring case. Returns `true` if one existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(&Fact::canonical_key(key)).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All facts, ordered by canonical key.
    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.entries.values().map(|stored| &stored.fact)
    }

    /// Render up to `max` facts as `- key: value` lines, sorted by the
    /// stored key ascending. Returns an empty string for an empty store.
    ///
    /// Line breaks inside a key or value are folded into spaces, so each
    /// fact occupies exactly one line.
    pub fn render_bullet_list(&self, max: usize) -> String {
        let mut facts: Vec<&Fact> = self.iter().collect();
        facts.sort_by(|a, b| a.key.cmp(&b.key));
        facts
            .into_iter()
            .take(max)
            .map(|f| format!("- {}: {}", single_line(&f.key), single_line(&f.value)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Keep only the `max_facts` most recently written facts.
    /// Returns the number evicted.
    pub fn cleanup(&mut self, max_facts: usize) -> usize {
        if self.entries.len() <= max_facts {
            return 0;
        }

        let mut by_recency: Vec<(DateTime<Utc>, u64, String)> = self
            .entries
            .iter()
            .map(|(key, stored)| (stored.fact.updated_at, stored.seq, key.clone()))
            .collect();
        // Newest first.
        by_recency.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));

        let evicted = by_recency.len() - max_facts;
        for (_, _, key) in by_recency.into_iter().skip(max_facts) {
            self.entries.remove(&key);
        }

        tracing::debug!(evicted, retained = max_facts, "Fact store cleanup");
        evicted
    }
}

fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fact(key: &str, value: &str) -> FactCandidate {
        FactCandidate::new(key, value)
    }

    #[test]
    fn upsert_and_get() {
        let mut store = FactStore::new();
        assert_eq!(store.upsert(vec![fact("name", "Alice")]), 1);
        assert_eq!(store.get("name").unwrap().value, "Alice");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn keys_differing_by_case_collapse() {
        let mut store = FactStore::new();
        store.upsert(vec![fact("Name", "Alice")]);
        store.upsert(vec![fact("name", "Bob")]);

        assert_eq!(store.len(), 1);
        let stored = store.get("NAME").unwrap();
        assert_eq!(stored.key, "name");
        assert_eq!(stored.value, "Bob");
    }

    #[test]
    fn repeated_upsert_is_idempotent() {
        let mut store = FactStore::new();
        let t0 = Utc::now();
        store.upsert_at(vec![fact("lang", "Rust")], t0);
        let first: Vec<Fact> = store.iter().cloned().collect();

        store.upsert_at(vec![fact("lang", "Rust")], t0);
        let second: Vec<Fact> = store.iter().cloned().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn upsert_refreshes_timestamp() {
        let mut store = FactStore::new();
        let t0 = Utc::now();
        store.upsert_at(vec![fact("lang", "Rust")], t0);
        store.upsert_at(vec![fact("lang", "Rust")], t0 + Duration::seconds(5));
        assert_eq!(store.get("lang").unwrap().updated_at, t0 + Duration::seconds(5));
    }

    #[test]
    fn source_is_kept() {
        let mut store = FactStore::new();
        store.upsert(vec![fact("city", "Oslo").with_source("turn-2")]);
        assert_eq!(store.get("city").unwrap().source.as_deref(), Some("turn-2"));
    }

    #[test]
    fn render_sorted_by_key() {
        let mut store = FactStore::new();
        store.upsert(vec![fact("b", "2"), fact("a", "1")]);
        assert_eq!(store.render_bullet_list(10), "- a: 1\n- b: 2");
    }

    #[test]
    fn render_respects_max() {
        let mut store = FactStore::new();
        store.upsert(vec![fact("c", "3"), fact("a", "1"), fact("b", "2")]);
        assert_eq!(store.render_bullet_list(2), "- a: 1\n- b: 2");
        assert_eq!(store.render_bullet_list(0), "");
    }

    #[test]
    fn render_sorts_on_raw_key() {
        let mut store = FactStore::new();
        store.upsert(vec![fact("apple", "x"), fact("Banana", "y")]);
        // Uppercase sorts before lowercase on the stored key.
        assert_eq!(store.render_bullet_list(10), "- Banana: y\n- apple: x");
    }

    #[test]
    fn multi_line_values_render_one_line_each() {
        let mut store = FactStore::new();
        store.upsert(vec![
            fact("address", "1 Main St\nOslo\r\nNorway"),
            fact("note\nkey", "first\n\nsecond"),
            fact("zip", "0150"),
        ]);

        for max in 0..=3 {
            assert!(store.render_bullet_list(max).lines().count() <= max);
        }
        assert_eq!(
            store.render_bullet_list(3),
            "- address: 1 Main St Oslo Norway\n- note key: first second\n- zip: 0150"
        );
        // The stored value itself is untouched.
        assert_eq!(store.get("address").unwrap().value, "1 Main St\nOslo\r\nNorway");
    }

    #[test]
    fn empty_store_renders_empty() {
        assert_eq!(FactStore::new().render_bullet_list(5), "");
    }

    #[test]
    fn cleanup_keeps_most_recent() {
        let mut store = FactStore::new();
        let t0 = Utc::now();
        for i in 0..5 {
            store.upsert_at(
                vec![fact(&format!("k{i}"), "v")],
                t0 + Duration::seconds(i),
            );
        }

        assert_eq!(store.cleanup(2), 3);
        assert_eq!(store.len(), 2);
        assert!(store.get("k4").is_some());
        assert!(store.get("k3").is_some());
        assert!(store.get("k0").is_none());
    }

    #[test]
    fn cleanup_retained_are_newer_than_evicted() {
        let mut store = FactStore::new();
        let t0 = Utc::now();
        // Rewrite an old key so it becomes the newest.
        store.upsert_at(vec![fact("old", "1")], t0);
        store.upsert_at(vec![fact("mid", "2")], t0 + Duration::seconds(1));
        store.upsert_at(vec![fact("new", "3")], t0 + Duration::seconds(2));
        store.upsert_at(vec![fact("OLD", "4")], t0 + Duration::seconds(3));

        let before: Vec<Fact> = store.iter().cloned().collect();
        store.cleanup(2);
        let kept: Vec<Fact> = store.iter().cloned().collect();
        let min_kept = kept.iter().map(|f| f.updated_at).min().unwrap();
        for f in before.iter().filter(|f| !kept.contains(f)) {
            assert!(f.updated_at <= min_kept);
        }
        assert_eq!(store.get("old").unwrap().value, "4");
        assert!(store.get("mid").is_none());
    }

    #[test]
    fn cleanup_ties_break_by_write_order() {
        let mut store = FactStore::new();
        let t0 = Utc::now();
        store.upsert_at(vec![fact("a", "1"), fact("b", "2"), fact("c", "3")], t0);

        store.cleanup(1);
        assert!(store.get("c").is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn cleanup_under_limit_is_noop() {
        let mut store = FactStore::new();
        store.upsert(vec![fact("a", "1")]);
        assert_eq!(store.cleanup(5), 0);
        assert_eq!(store.cleanup(1), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_is_case_insensitive() {
        let mut store = FactStore::new();
        store.upsert(vec![fact("Name", "Alice")]);
        assert!(store.remove("name"));
        assert!(!store.remove("name"));
        assert!(store.is_empty());
    }
}
