use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::{QueryRequest, QueryResponse, UpsertRequest, UpsertResponse};
use crate::persistence::{read_snapshot, write_snapshot, LoadStrategy, Tables};
use crate::query::rank_matches;
use crate::table::{Record, Table};
use crate::vector::validate_finite;

/// An owned, in-process record store.
///
/// Mutations take `&mut self`; wrap the store in
/// [`SharedStore`](crate::SharedStore) to use it from several threads.
#[derive(Debug, Default)]
pub struct VectorStore {
    tables: Tables,
    config: StoreConfig,
    pending_writes: u64,
}

impl VectorStore {
    /// Creates an empty in-memory store with no snapshot path.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            tables: Tables::new(),
            config,
            pending_writes: 0,
        }
    }

    /// Creates a store and, when `load_on_open` is set and the snapshot file
    /// exists, restores it.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let mut store = Self::with_config(config);
        if store.config.load_on_open {
            let path = store.resolve_path(None)?;
            if path.exists() {
                store.load(Some(&path))?;
            } else {
                tracing::info!(path = %path.display(), "no snapshot found; starting empty");
            }
        }
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Inserts or overwrites one record and returns its id.
    ///
    /// Under a write-through policy with a configured path the whole store
    /// is saved before returning. If that save fails the record stays
    /// applied in memory and the IO error is returned.
    pub fn upsert(&mut self, request: UpsertRequest) -> Result<UpsertResponse, StoreError> {
        let id = self.apply(request.into())?;
        self.record_writes(1)?;
        Ok(UpsertResponse { ids: vec![id] })
    }

    /// Applies `requests` in order. Not atomic.
    ///
    /// On failure the returned [`StoreError::PartialBatch`] lists the ids
    /// committed before the failing record; those stay applied and, under
    /// write-through, are flushed before the error is returned.
    pub fn batch_upsert(
        &mut self,
        requests: Vec<UpsertRequest>,
    ) -> Result<UpsertResponse, StoreError> {
        let mut committed = Vec::with_capacity(requests.len());
        let mut failure = None;
        for request in requests {
            match self.apply(request.into()) {
                Ok(id) => committed.push(id),
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }

        let flushed = self.record_writes(committed.len() as u64);
        match failure {
            None => {
                flushed?;
                Ok(UpsertResponse { ids: committed })
            }
            Some(error) => {
                if let Err(flush_error) = flushed {
                    tracing::warn!(
                        error = %flush_error,
                        committed = committed.len(),
                        "failed to flush partially applied batch"
                    );
                }
                Err(StoreError::PartialBatch {
                    committed,
                    source: Box::new(error),
                })
            }
        }
    }

    /// Ranks the records of `request.table` by cosine distance to
    /// `request.values`, closest first.
    pub fn query(&self, request: &QueryRequest) -> Result<QueryResponse, StoreError> {
        let table = self
            .tables
            .get(&request.table)
            .ok_or_else(|| StoreError::TableNotFound {
                table: request.table.clone(),
            })?;
        validate_finite(&request.values)
            .map_err(|error| StoreError::InvalidQuery(error.to_string()))?;
        let matches = rank_matches(table, &request.values, request.limit)?;
        Ok(QueryResponse { matches })
    }

    /// Writes the whole store to `path`, or to the configured snapshot path
    /// when `path` is `None`.
    pub fn save(&mut self, path: Option<&Path>) -> Result<(), StoreError> {
        let path = self.resolve_path(path)?;
        write_snapshot(&path, &self.tables, self.config.sync_on_save)?;
        tracing::debug!(
            path = %path.display(),
            tables = self.tables.len(),
            records = self.record_count(),
            "snapshot saved"
        );
        if self.config.snapshot_path() == Some(path.as_path()) {
            self.pending_writes = 0;
        }
        Ok(())
    }

    /// Loads a snapshot using the configured [`LoadStrategy`].
    pub fn load(&mut self, path: Option<&Path>) -> Result<(), StoreError> {
        self.load_with(path, self.config.load_strategy)
    }

    /// Loads a snapshot and merges it with `strategy`. A file that fails to
    /// read or parse leaves the in-memory state unchanged.
    ///
    /// Loading from a path other than the configured one counts the loaded
    /// records as writes, so the flush policy (or the next `checkpoint`)
    /// carries the merged state to the configured snapshot.
    pub fn load_with(
        &mut self,
        path: Option<&Path>,
        strategy: LoadStrategy,
    ) -> Result<(), StoreError> {
        let path = self.resolve_path(path)?;
        let loaded = read_snapshot(&path)?;
        let loaded_tables = loaded.len();
        let loaded_records = loaded.values().map(Table::len).sum::<usize>() as u64;
        strategy.merge(&mut self.tables, loaded);
        tracing::info!(
            path = %path.display(),
            strategy = strategy.as_str(),
            loaded_tables,
            tables = self.tables.len(),
            records = self.record_count(),
            "snapshot loaded"
        );
        if self.config.snapshot_path() != Some(path.as_path()) {
            self.record_writes(loaded_records.max(1))?;
        }
        Ok(())
    }

    /// Flushes unsaved writes to the configured path. Returns whether a
    /// snapshot was written.
    pub fn checkpoint(&mut self) -> Result<bool, StoreError> {
        if self.config.snapshot_path.is_none() {
            return Err(StoreError::FileNotConfigured);
        }
        if self.pending_writes == 0 {
            return Ok(false);
        }
        self.save(None)?;
        Ok(true)
    }

    /// Record writes applied in memory but not yet flushed to the configured
    /// snapshot path.
    pub fn pending_writes(&self) -> u64 {
        self.pending_writes
    }

    pub fn get(&self, table: &str, id: &str) -> Option<&Record> {
        self.tables.get(table).and_then(|table| table.get(id))
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.tables.keys().map(String::as_str)
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.tables.values().map(Table::len).sum()
    }

    fn apply(&mut self, record: Record) -> Result<String, StoreError> {
        validate_record(&record)?;
        let id = record.id.clone();
        self.tables
            .entry(record.table.clone())
            .or_default()
            .upsert(record);
        Ok(id)
    }

    fn record_writes(&mut self, writes_added: u64) -> Result<(), StoreError> {
        self.pending_writes = self.pending_writes.saturating_add(writes_added);
        if self.config.snapshot_path.is_none() {
            return Ok(());
        }
        if self
            .config
            .flush_policy
            .flush_due(writes_added, self.pending_writes)
        {
            self.save(None)?;
        }
        Ok(())
    }

    fn resolve_path(&self, path: Option<&Path>) -> Result<PathBuf, StoreError> {
        path.or(self.config.snapshot_path())
            .map(Path::to_path_buf)
            .ok_or(StoreError::FileNotConfigured)
    }
}

fn validate_record(record: &Record) -> Result<(), StoreError> {
    if record.table.is_empty() {
        return Err(StoreError::InvalidRecord(
            "table name must not be empty".to_string(),
        ));
    }
    if record.id.is_empty() {
        return Err(StoreError::InvalidRecord(format!(
            "record id must not be empty (table '{}')",
            record.table
        )));
    }
    if let Some(values) = &record.values {
        validate_finite(values).map_err(|error| {
            StoreError::InvalidRecord(format!(
                "record '{}' in table '{}': {error}",
                record.id, record.table
            ))
        })?;
    }
    Ok(())
}
