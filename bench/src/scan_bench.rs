use std::time::{Duration, Instant};

use vecnest_core::{cosine_distance, QueryRequest, VectorStore};

use crate::bench_utils::{
    build_requests, deterministic_vector, read_usize_env_with_min, summarize_ms,
};

const DEFAULT_DIMENSION: usize = 128;
const DEFAULT_DATASET_SIZE: usize = 10_000;
const DEFAULT_WARMUP_RUNS: usize = 8;
const DEFAULT_MEASURED_RUNS: usize = 50;
const DEFAULT_TOP_K: usize = 10;

#[derive(Clone, Copy)]
struct ScanBenchConfig {
    dimension: usize,
    dataset_size: usize,
    warmup_runs: usize,
    measured_runs: usize,
    top_k: usize,
}

fn load_config() -> ScanBenchConfig {
    ScanBenchConfig {
        dimension: read_usize_env_with_min("VECNEST_BENCH_DIMENSION", DEFAULT_DIMENSION, 1),
        dataset_size: read_usize_env_with_min(
            "VECNEST_BENCH_DATASET_SIZE",
            DEFAULT_DATASET_SIZE,
            1,
        ),
        warmup_runs: read_usize_env_with_min("VECNEST_BENCH_WARMUP_RUNS", DEFAULT_WARMUP_RUNS, 0),
        measured_runs: read_usize_env_with_min(
            "VECNEST_BENCH_MEASURED_RUNS",
            DEFAULT_MEASURED_RUNS,
            1,
        ),
        top_k: read_usize_env_with_min("VECNEST_BENCH_TOP_K", DEFAULT_TOP_K, 1),
    }
}

pub(crate) fn run_distance_bench(mode: &str) -> bool {
    let config = load_config();
    let query = deterministic_vector(42, config.dimension);
    let dataset: Vec<Vec<f32>> = (0..config.dataset_size)
        .map(|id| deterministic_vector(id as u64, config.dimension))
        .collect();

    for _ in 0..config.warmup_runs {
        if run_distance_once(&query, &dataset).is_none() {
            return false;
        }
    }

    let mut elapsed_samples = Vec::with_capacity(config.measured_runs);
    let mut total_duration = Duration::from_secs(0);
    let mut last_best_id = 0usize;
    let mut last_best_distance = f32::MAX;

    for _ in 0..config.measured_runs {
        let Some((elapsed, best_id, best_distance)) = run_distance_once(&query, &dataset) else {
            return false;
        };
        elapsed_samples.push(elapsed.as_secs_f64() * 1_000.0);
        total_duration += elapsed;
        last_best_id = best_id;
        last_best_distance = best_distance;
    }

    let (p50_ms, p95_ms, avg_ms) = summarize_ms(&elapsed_samples);
    let total_ops = (config.measured_runs * config.dataset_size) as f64;
    let qps = total_ops / total_duration.as_secs_f64();

    println!(
        "bench=cosine_distance mode={mode} dataset_size={} dimension={} warmup_runs={} measured_runs={} p50_ms={p50_ms:.6} p95_ms={p95_ms:.6} avg_ms={avg_ms:.6} qps={qps:.2} best_id={last_best_id} best_distance={last_best_distance:.6}",
        config.dataset_size,
        config.dimension,
        config.warmup_runs,
        config.measured_runs
    );

    true
}

pub(crate) fn run_query_bench(mode: &str) -> bool {
    let config = load_config();
    let mut store = VectorStore::new();
    if let Err(error) = store.batch_upsert(build_requests(
        "bench",
        config.dataset_size,
        config.dimension,
    )) {
        tracing::error!(%error, "query bench setup failed");
        return false;
    }

    let request = QueryRequest::new("bench", deterministic_vector(1337, config.dimension))
        .with_limit(config.top_k);

    for _ in 0..config.warmup_runs {
        if run_query_once(&store, &request).is_none() {
            return false;
        }
    }

    let mut elapsed_samples = Vec::with_capacity(config.measured_runs);
    let mut total_duration = Duration::from_secs(0);
    let mut top_id = String::new();

    for _ in 0..config.measured_runs {
        let Some((elapsed, best_id)) = run_query_once(&store, &request) else {
            return false;
        };
        elapsed_samples.push(elapsed.as_secs_f64() * 1_000.0);
        total_duration += elapsed;
        top_id = best_id;
    }

    let (p50_ms, p95_ms, avg_ms) = summarize_ms(&elapsed_samples);
    let qps = config.measured_runs as f64 / total_duration.as_secs_f64();

    println!(
        "bench=store_query mode={mode} records={} dimension={} top_k={} warmup_runs={} measured_runs={} p50_ms={p50_ms:.6} p95_ms={p95_ms:.6} avg_ms={avg_ms:.6} qps={qps:.2} top_id={top_id}",
        config.dataset_size,
        config.dimension,
        config.top_k,
        config.warmup_runs,
        config.measured_runs
    );

    true
}

fn run_distance_once(query: &[f32], dataset: &[Vec<f32>]) -> Option<(Duration, usize, f32)> {
    let started_at = Instant::now();
    let mut best_id = 0usize;
    let mut best_distance = f32::MAX;

    for (id, candidate) in dataset.iter().enumerate() {
        let distance = match cosine_distance(query, candidate) {
            Ok(value) => value,
            Err(error) => {
                tracing::error!(%error, "cosine distance failed");
                return None;
            }
        };

        if distance < best_distance {
            best_distance = distance;
            best_id = id;
        }
    }

    Some((started_at.elapsed(), best_id, best_distance))
}

fn run_query_once(store: &VectorStore, request: &QueryRequest) -> Option<(Duration, String)> {
    let started_at = Instant::now();
    let response = match store.query(request) {
        Ok(response) => response,
        Err(error) => {
            tracing::error!(%error, "store query failed");
            return None;
        }
    };
    let elapsed = started_at.elapsed();
    let best_id = response
        .matches
        .first()
        .map(|hit| hit.id.clone())
        .unwrap_or_default();
    Some((elapsed, best_id))
}
