use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::domain::AllelePair;

/// Leaf of the by-rsid lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsidInfo {
    pub gene: String,
    pub summary: String,
    pub magnitude: Number,
    pub repute: String,
}

/// Leaf of the by-gene lookup; `rsid` is the normalized identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneInfo {
    pub rsid: String,
    pub summary: String,
    pub magnitude: Number,
    pub repute: String,
}

/// Result of writing one leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    New,
    /// Replaced an identical payload.
    Duplicate,
    /// Replaced a different payload; last write wins.
    Conflict,
}

/// Second-allele level: `allele-high -> info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecondAlleles<T>(BTreeMap<String, T>);

impl<T> Default for SecondAlleles<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T: PartialEq> SecondAlleles<T> {
    pub fn insert(&mut self, allele: &str, value: T) -> InsertOutcome {
        match self.0.entry(allele.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                InsertOutcome::New
            }
            Entry::Occupied(mut slot) => {
                let previous = slot.insert(value);
                if &previous == slot.get() {
                    InsertOutcome::Duplicate
                } else {
                    InsertOutcome::Conflict
                }
            }
        }
    }

    pub fn get(&self, allele: &str) -> Option<&T> {
        self.0.get(allele)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// First-allele level: `allele-low -> SecondAlleles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlleleTable<T>(BTreeMap<String, SecondAlleles<T>>);

impl<T> Default for AlleleTable<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T: PartialEq> AlleleTable<T> {
    /// Get-or-insert-default for the first allele.
    pub fn entry(&mut self, allele: &str) -> &mut SecondAlleles<T> {
        self.0.entry(allele.to_string()).or_default()
    }

    pub fn insert(&mut self, pair: &AllelePair, value: T) -> InsertOutcome {
        self.entry(pair.low()).insert(pair.high(), value)
    }

    pub fn get(&self, pair: &AllelePair) -> Option<&T> {
        self.0.get(pair.low()).and_then(|second| second.get(pair.high()))
    }

    /// Number of leaves across all first alleles.
    pub fn leaf_count(&self) -> usize {
        self.0.values().map(SecondAlleles::len).sum()
    }
}

/// Top level keyed by normalized identifier or gene name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lookup<T>(BTreeMap<String, AlleleTable<T>>);

impl<T> Default for Lookup<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T: PartialEq> Lookup<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-insert-default for the outer key.
    pub fn entry(&mut self, key: &str) -> &mut AlleleTable<T> {
        self.0.entry(key.to_string()).or_default()
    }

    pub fn insert(&mut self, key: &str, pair: &AllelePair, value: T) -> InsertOutcome {
        self.entry(key).insert(pair, value)
    }

    pub fn table(&self, key: &str) -> Option<&AlleleTable<T>> {
        self.0.get(key)
    }

    pub fn get(&self, key: &str, pair: &AllelePair) -> Option<&T> {
        self.0.get(key).and_then(|table| table.get(pair))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(summary: &str, magnitude: i64) -> RsidInfo {
        RsidInfo {
            gene: String::new(),
            summary: summary.to_string(),
            magnitude: Number::from(magnitude),
            repute: String::new(),
        }
    }

    #[test]
    fn entry_creates_missing_levels() {
        let mut lookup = Lookup::<RsidInfo>::new();
        assert!(lookup.entry("rs1").entry("A").is_empty());
        assert_eq!(lookup.len(), 1);
        assert!(lookup.get("rs1", &AllelePair::new(Some("A"), Some("A"))).is_none());
    }

    #[test]
    fn insert_reports_duplicates_and_conflicts() {
        let mut lookup = Lookup::new();
        let pair = AllelePair::new(Some("G"), Some("A"));
        assert_eq!(lookup.insert("rs1", &pair, info("s", 1)), InsertOutcome::New);
        assert_eq!(
            lookup.insert("rs1", &pair, info("s", 1)),
            InsertOutcome::Duplicate
        );
        assert_eq!(
            lookup.insert("rs1", &pair, info("s2", 3)),
            InsertOutcome::Conflict
        );
        assert_eq!(lookup.get("rs1", &pair).unwrap().summary, "s2");
        assert_eq!(lookup.table("rs1").unwrap().leaf_count(), 1);
    }

    #[test]
    fn serializes_as_plain_nested_objects() {
        let mut lookup = Lookup::new();
        lookup.insert("rs1", &AllelePair::new(Some("T"), Some("c")), info("x", 2));
        let json = serde_json::to_value(&lookup).unwrap();
        assert_eq!(json["rs1"]["C"]["T"]["summary"], "x");
        assert_eq!(json["rs1"]["C"]["T"]["magnitude"], 2);

        let back: Lookup<RsidInfo> = serde_json::from_value(json).unwrap();
        assert_eq!(back, lookup);
    }
}
