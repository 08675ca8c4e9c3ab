use std::error::Error;
use std::fmt;

use crate::vector::VectorError;

#[derive(Debug)]
pub enum StoreError {
    /// A query named a table that has never been written.
    TableNotFound { table: String },
    /// Two compared vectors had different lengths.
    DimensionMismatch { left: usize, right: usize },
    /// `save`/`load`/`checkpoint` ran with no path supplied or configured.
    FileNotConfigured,
    InvalidRecord(String),
    /// A query vector could not be scored, e.g. it contains NaN.
    InvalidQuery(String),
    Io(std::io::Error),
    Serde(serde_json::Error),
    /// A batch failed partway. Records in `committed` remain applied.
    PartialBatch {
        committed: Vec<String>,
        source: Box<StoreError>,
    },
    LockPoisoned,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableNotFound { table } => write!(f, "table '{table}' not found"),
            Self::DimensionMismatch { left, right } => {
                write!(f, "dimension mismatch: left={left}, right={right}")
            }
            Self::FileNotConfigured => write!(f, "no snapshot file configured"),
            Self::InvalidRecord(message) => write!(f, "invalid record: {message}"),
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::PartialBatch { committed, source } => write!(
                f,
                "batch upsert failed after committing {} record(s): {source}",
                committed.len()
            ),
            Self::LockPoisoned => write!(f, "store lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            Self::Serde(error) => Some(error),
            Self::PartialBatch { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

impl From<VectorError> for StoreError {
    fn from(value: VectorError) -> Self {
        match value {
            VectorError::DimensionMismatch { left, right } => {
                Self::DimensionMismatch { left, right }
            }
            error @ VectorError::NonFiniteValue { .. } => {
                Self::InvalidRecord(error.to_string())
            }
        }
    }
}
