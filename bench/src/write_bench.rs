use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use vecnest_core::{FlushPolicy, StoreConfig, UpsertRequest, VectorStore};

use crate::bench_utils::{
    average_ms, build_requests, clean_root, percentile_ms, read_usize_env_with_min, summarize_ms,
    temp_root,
};

const DEFAULT_DIMENSION: usize = 64;
const DEFAULT_WRITE_COUNT: usize = 1_024;
const DEFAULT_MEASURED_RUNS: usize = 3;
const FLUSH_EVERY_N_WRITES: u64 = 64;

#[derive(Clone, Copy)]
struct WriteBenchConfig {
    dimension: usize,
    write_count: usize,
    measured_runs: usize,
}

fn load_config() -> WriteBenchConfig {
    WriteBenchConfig {
        dimension: read_usize_env_with_min("VECNEST_BENCH_DIMENSION", DEFAULT_DIMENSION, 1),
        write_count: read_usize_env_with_min("VECNEST_BENCH_WRITE_COUNT", DEFAULT_WRITE_COUNT, 1),
        measured_runs: read_usize_env_with_min(
            "VECNEST_BENCH_MEASURED_RUNS",
            DEFAULT_MEASURED_RUNS,
            1,
        ),
    }
}

#[derive(Clone, Copy)]
enum Strategy {
    InMemory,
    WriteThrough,
    EveryNWrites,
    ManualCheckpoint,
}

impl Strategy {
    fn as_str(self) -> &'static str {
        match self {
            Self::InMemory => "in_memory",
            Self::WriteThrough => "write_through",
            Self::EveryNWrites => "every_n_writes",
            Self::ManualCheckpoint => "manual_checkpoint",
        }
    }

    fn store_config(self, path: &Path) -> StoreConfig {
        let config = StoreConfig::default();
        match self {
            Self::InMemory => config,
            Self::WriteThrough => config.with_snapshot_path(path),
            Self::EveryNWrites => config
                .with_snapshot_path(path)
                .with_flush_policy(FlushPolicy::EveryNWrites(FLUSH_EVERY_N_WRITES)),
            Self::ManualCheckpoint => config
                .with_snapshot_path(path)
                .with_flush_policy(FlushPolicy::Manual),
        }
    }
}

/// Per-upsert latency under each flush policy.
pub(crate) fn run_upsert_bench(mode: &str) -> bool {
    let config = load_config();
    let root = temp_root("upsert_bench");
    let requests = build_requests("bench", config.write_count, config.dimension);

    println!(
        "bench=upsert mode={mode} writes={} dimension={} measured_runs={} flush_every_n={FLUSH_EVERY_N_WRITES}",
        config.write_count, config.dimension, config.measured_runs
    );
    println!("| strategy | p50_ms | p95_ms | p99_ms | avg_ms | qps |");
    println!("|---|---:|---:|---:|---:|---:|");

    for strategy in [
        Strategy::InMemory,
        Strategy::WriteThrough,
        Strategy::EveryNWrites,
        Strategy::ManualCheckpoint,
    ] {
        let mut latencies_ms = Vec::with_capacity(config.measured_runs * config.write_count);
        let mut total_elapsed = Duration::ZERO;
        for run in 0..config.measured_runs {
            let path = root.join(format!("{}_{run}.json", strategy.as_str()));
            let Some((elapsed, samples)) = run_upsert_once(strategy, &path, &requests) else {
                clean_root(&root);
                return false;
            };
            total_elapsed += elapsed;
            latencies_ms.extend(samples);
        }

        let qps = latencies_ms.len() as f64 / total_elapsed.as_secs_f64();
        println!(
            "| {} | {:.6} | {:.6} | {:.6} | {:.6} | {:.2} |",
            strategy.as_str(),
            percentile_ms(&latencies_ms, 0.50),
            percentile_ms(&latencies_ms, 0.95),
            percentile_ms(&latencies_ms, 0.99),
            average_ms(&latencies_ms),
            qps
        );
    }

    clean_root(&root);
    true
}

/// Full save and load of a populated store.
pub(crate) fn run_snapshot_bench(mode: &str) -> bool {
    let config = load_config();
    let root = temp_root("snapshot_bench");
    let path = root.join("snapshot.json");

    let mut store = VectorStore::new();
    if let Err(error) = store.batch_upsert(build_requests(
        "bench",
        config.write_count,
        config.dimension,
    )) {
        tracing::error!(%error, "snapshot bench setup failed");
        return false;
    }

    let mut save_ms = Vec::with_capacity(config.measured_runs);
    let mut load_ms = Vec::with_capacity(config.measured_runs);
    for _ in 0..config.measured_runs {
        let started_at = Instant::now();
        if let Err(error) = store.save(Some(&path)) {
            tracing::error!(%error, path = %path.display(), "snapshot save failed");
            clean_root(&root);
            return false;
        }
        save_ms.push(started_at.elapsed().as_secs_f64() * 1_000.0);

        let mut restored = VectorStore::new();
        let started_at = Instant::now();
        if let Err(error) = restored.load(Some(&path)) {
            tracing::error!(%error, path = %path.display(), "snapshot load failed");
            clean_root(&root);
            return false;
        }
        load_ms.push(started_at.elapsed().as_secs_f64() * 1_000.0);

        if restored.record_count() != store.record_count() {
            tracing::error!(
                expected = store.record_count(),
                got = restored.record_count(),
                "snapshot roundtrip lost records"
            );
            clean_root(&root);
            return false;
        }
    }

    let snapshot_bytes = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
    let (save_p50_ms, save_p95_ms, save_avg_ms) = summarize_ms(&save_ms);
    let (load_p50_ms, load_p95_ms, load_avg_ms) = summarize_ms(&load_ms);
    println!(
        "bench=snapshot mode={mode} records={} dimension={} measured_runs={} save_p50_ms={save_p50_ms:.6} save_p95_ms={save_p95_ms:.6} save_avg_ms={save_avg_ms:.6} load_p50_ms={load_p50_ms:.6} load_p95_ms={load_p95_ms:.6} load_avg_ms={load_avg_ms:.6} snapshot_bytes={snapshot_bytes}",
        config.write_count, config.dimension, config.measured_runs
    );

    clean_root(&root);
    true
}

fn run_upsert_once(
    strategy: Strategy,
    path: &Path,
    requests: &[UpsertRequest],
) -> Option<(Duration, Vec<f64>)> {
    let mut store = VectorStore::with_config(strategy.store_config(path));
    let mut samples = Vec::with_capacity(requests.len());
    let started_at = Instant::now();

    for request in requests {
        let write_started = Instant::now();
        if let Err(error) = store.upsert(request.clone()) {
            tracing::error!(%error, strategy = strategy.as_str(), "upsert failed");
            return None;
        }
        samples.push(write_started.elapsed().as_secs_f64() * 1_000.0);
    }
    if matches!(strategy, Strategy::ManualCheckpoint) {
        if let Err(error) = store.checkpoint() {
            tracing::error!(%error, "checkpoint failed");
            return None;
        }
    }

    Some((started_at.elapsed(), samples))
}
