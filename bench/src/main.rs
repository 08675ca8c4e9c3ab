#![forbid(unsafe_code)]
//! Micro-benchmarks for VECNEST.
//!
//! Scenarios:
//! - `distance`: raw cosine-distance scan, top-1
//! - `query`: store query with a top-k limit
//! - `upsert`: per-write latency under each flush policy
//! - `snapshot`: full save/load of a populated store

use std::env;
use std::process;

use tracing_subscriber::EnvFilter;

mod bench_utils;
mod scan_bench;
mod write_bench;

fn main() {
    init_tracing();

    if cfg!(debug_assertions) && env::var("VECNEST_ALLOW_DEBUG_BENCH").as_deref() != Ok("1") {
        eprintln!(
            "error=debug_build_not_allowed message=\"run `cargo run --release -p vecnest-bench`\""
        );
        process::exit(2);
    }

    let mode = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };

    let scenario = env::var("VECNEST_BENCH_SCENARIO").unwrap_or_else(|_| "all".to_string());
    let ok = match scenario.as_str() {
        "all" => {
            scan_bench::run_distance_bench(mode)
                && scan_bench::run_query_bench(mode)
                && write_bench::run_upsert_bench(mode)
                && write_bench::run_snapshot_bench(mode)
        }
        "distance" => scan_bench::run_distance_bench(mode),
        "query" => scan_bench::run_query_bench(mode),
        "upsert" => write_bench::run_upsert_bench(mode),
        "snapshot" => write_bench::run_snapshot_bench(mode),
        _ => {
            eprintln!(
                "error=invalid_scenario scenario=\"{}\" allowed=\"all,distance,query,upsert,snapshot\"",
                scenario
            );
            false
        }
    };

    if !ok {
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(error) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("failed to initialize tracing subscriber: {error}");
    }
}
