use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::{QueryRequest, QueryResponse, UpsertRequest, UpsertResponse};
use crate::persistence::LoadStrategy;
use crate::store::VectorStore;
use crate::table::Record;

/// A cloneable, thread-safe handle to one [`VectorStore`].
///
/// Every mutating call, including its write-through save, runs under the
/// write lock, so snapshot writes never interleave. Queries share the read
/// lock and run concurrently with each other.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<VectorStore>>,
}

impl SharedStore {
    pub fn new(store: VectorStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        VectorStore::open(config).map(Self::new)
    }

    pub fn upsert(&self, request: UpsertRequest) -> Result<UpsertResponse, StoreError> {
        self.write()?.upsert(request)
    }

    pub fn batch_upsert(
        &self,
        requests: Vec<UpsertRequest>,
    ) -> Result<UpsertResponse, StoreError> {
        self.write()?.batch_upsert(requests)
    }

    pub fn query(&self, request: &QueryRequest) -> Result<QueryResponse, StoreError> {
        self.read()?.query(request)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<(), StoreError> {
        self.write()?.save(path)
    }

    pub fn load(&self, path: Option<&Path>) -> Result<(), StoreError> {
        self.write()?.load(path)
    }

    pub fn load_with(&self, path: Option<&Path>, strategy: LoadStrategy) -> Result<(), StoreError> {
        self.write()?.load_with(path, strategy)
    }

    pub fn checkpoint(&self) -> Result<bool, StoreError> {
        self.write()?.checkpoint()
    }

    pub fn pending_writes(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.pending_writes())
    }

    /// Returns a copy of one record.
    pub fn get(&self, table: &str, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.read()?.get(table, id).cloned())
    }

    pub fn record_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.record_count())
    }

    /// Runs `f` with shared access to the underlying store.
    pub fn with_read<R>(&self, f: impl FnOnce(&VectorStore) -> R) -> Result<R, StoreError> {
        let guard = self.read()?;
        Ok(f(&guard))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, VectorStore>, StoreError> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, VectorStore>, StoreError> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }
}
