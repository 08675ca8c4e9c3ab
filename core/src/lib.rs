#![forbid(unsafe_code)]
//! Embedded vector-similarity store.
//!
//! Records live in named tables, optionally carry a vector and opaque
//! metadata, and are ranked against a query by cosine distance with a full
//! scan. The whole store can be saved to, and merged back from, a JSON
//! snapshot file.

pub mod config;
pub mod error;
pub mod models;
pub mod persistence;
pub mod query;
pub mod shared;
pub mod store;
pub mod table;
pub mod vector;

pub use config::StoreConfig;
pub use error::StoreError;
pub use models::{QueryRequest, QueryResponse, UpsertRequest, UpsertResponse};
pub use persistence::{FlushPolicy, LoadStrategy};
pub use query::Match;
pub use shared::SharedStore;
pub use store::VectorStore;
pub use table::{Metadata, Record, Table};
pub use vector::{
    cosine_distance, cosine_similarity, dot_product, validate_finite, VectorError,
};
