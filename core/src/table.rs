use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};

/// Opaque per-record metadata. The store never interprets its contents.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A stored record. Serializes as `{id, table, values?, metadata?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Record {
    pub fn new(table: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            table: table.into(),
            values: None,
            metadata: None,
        }
    }

    pub fn with_values(mut self, values: Vec<f32>) -> Self {
        self.values = Some(values);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns the vector when the record participates in similarity queries.
    pub fn vector(&self) -> Option<&[f32]> {
        self.values.as_deref()
    }
}

/// A named set of records keyed by id.
///
/// Vector lengths are not checked across records; mismatches surface when a
/// query compares a vector of a different length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    records: BTreeMap<String, Record>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts or overwrites `record` under its id. Returns true when the id
    /// was not present before.
    pub fn upsert(&mut self, record: Record) -> bool {
        self.records.insert(record.id.clone(), record).is_none()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.keys().map(String::as_str)
    }

    /// Iterates records in ascending id order.
    pub fn iter(&self) -> btree_map::Values<'_, String, Record> {
        self.records.values()
    }

    /// Iterates only records carrying a vector.
    pub fn iter_vectors(&self) -> impl Iterator<Item = (&Record, &[f32])> + '_ {
        self.records
            .values()
            .filter_map(|record| record.vector().map(|values| (record, values)))
    }

    /// Rewrites every record's `table`/`id` fields to match the keys they are
    /// stored under. Used after decoding a snapshot.
    pub(crate) fn normalize_keys(&mut self, table_name: &str) {
        for (id, record) in self.records.iter_mut() {
            if record.id != *id {
                record.id.clone_from(id);
            }
            if record.table != table_name {
                record.table = table_name.to_string();
            }
        }
    }
}
