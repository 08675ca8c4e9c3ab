use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::table::Table;

/// Full in-memory image: table name to table.
pub type Tables = BTreeMap<String, Table>;

/// How a loaded snapshot is combined with the tables already in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStrategy {
    /// Every table in the snapshot replaces the in-memory table of the same
    /// name wholesale. Tables absent from the snapshot are left untouched.
    #[default]
    ReplaceByTable,
    /// The in-memory state becomes exactly the snapshot.
    FullReplace,
}

impl LoadStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReplaceByTable => "replace_by_table",
            Self::FullReplace => "full_replace",
        }
    }

    pub(crate) fn merge(self, current: &mut Tables, loaded: Tables) {
        match self {
            Self::ReplaceByTable => current.extend(loaded),
            Self::FullReplace => *current = loaded,
        }
    }
}

/// When mutations are flushed to the configured snapshot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Save synchronously after every `upsert` and once per `batch_upsert`.
    #[default]
    WriteThrough,
    /// Save once this many record writes have accumulated since the last
    /// flush. Zero behaves like one.
    EveryNWrites(u64),
    /// Only `checkpoint`/`save` write the snapshot.
    Manual,
}

impl FlushPolicy {
    pub(crate) fn flush_due(self, writes_added: u64, pending_after: u64) -> bool {
        if writes_added == 0 {
            return false;
        }
        match self {
            Self::WriteThrough => true,
            Self::EveryNWrites(interval) => pending_after >= interval.max(1),
            Self::Manual => false,
        }
    }
}

/// Reads and decodes a snapshot file. The decoded records are re-keyed so
/// their `table`/`id` fields agree with the map keys they were found under.
pub fn read_snapshot(path: &Path) -> Result<Tables, StoreError> {
    let file = File::open(path)?;
    let mut tables: Tables = serde_json::from_reader(BufReader::new(file))?;
    for (name, table) in tables.iter_mut() {
        table.normalize_keys(name);
    }
    Ok(tables)
}

/// Writes the full image to `path`, replacing any previous file.
///
/// The bytes land in a sibling temp file that is renamed over `path`, so a
/// crash mid-write leaves the previous snapshot intact.
pub fn write_snapshot(path: &Path, tables: &Tables, sync: bool) -> Result<(), StoreError> {
    ensure_parent_dir(path)?;

    let temp_path = temp_path_for(path);
    let bytes = serde_json::to_vec(tables)?;
    if let Err(error) = write_and_rename(&temp_path, path, &bytes, sync) {
        if let Err(cleanup_error) = fs::remove_file(&temp_path) {
            if cleanup_error.kind() != ErrorKind::NotFound {
                tracing::warn!(
                    path = %temp_path.display(),
                    error = %cleanup_error,
                    "failed to remove temporary snapshot"
                );
            }
        }
        return Err(error.into());
    }
    if sync {
        sync_parent_dir(path)?;
    }
    Ok(())
}

fn write_and_rename(temp_path: &Path, path: &Path, bytes: &[u8], sync: bool) -> io::Result<()> {
    let mut file = File::create(temp_path)?;
    file.write_all(bytes)?;
    if sync {
        file.sync_all()?;
    }
    drop(file);
    fs::rename(temp_path, path)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    path.with_file_name(name)
}

fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        File::open(parent)?.sync_all()?;
    }
    Ok(())
}

// Directories cannot be opened for syncing on every platform.
#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}
