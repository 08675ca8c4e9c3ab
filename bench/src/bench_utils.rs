use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use vecnest_core::UpsertRequest;

pub(crate) fn summarize_ms(samples_ms: &[f64]) -> (f64, f64, f64) {
    let p50_ms = percentile_ms(samples_ms, 0.50);
    let p95_ms = percentile_ms(samples_ms, 0.95);
    (p50_ms, p95_ms, average_ms(samples_ms))
}

pub(crate) fn average_ms(samples_ms: &[f64]) -> f64 {
    if samples_ms.is_empty() {
        return 0.0;
    }
    samples_ms.iter().sum::<f64>() / samples_ms.len() as f64
}

pub(crate) fn percentile_ms(samples_ms: &[f64], quantile: f64) -> f64 {
    if samples_ms.is_empty() {
        return 0.0;
    }
    let mut sorted = samples_ms.to_vec();
    sorted.sort_by(f64::total_cmp);
    let last_index = sorted.len().saturating_sub(1);
    let position = (quantile.clamp(0.0, 1.0) * last_index as f64).round() as usize;
    sorted[position]
}

pub(crate) fn deterministic_vector(seed: u64, dimension: usize) -> Vec<f32> {
    (0..dimension)
        .map(|index| {
            let mixed = (seed as usize)
                .wrapping_mul(31)
                .wrapping_add(index.wrapping_mul(17))
                % 10_000;
            mixed as f32 / 10_000.0
        })
        .collect()
}

pub(crate) fn build_requests(table: &str, count: usize, dimension: usize) -> Vec<UpsertRequest> {
    (0..count)
        .map(|id| {
            let mut metadata = vecnest_core::Metadata::new();
            metadata.insert("seq".to_string(), serde_json::Value::from(id as u64));
            UpsertRequest::new(table, format!("rec-{id:06}"))
                .with_values(deterministic_vector(id as u64, dimension))
                .with_metadata(metadata)
        })
        .collect()
}

pub(crate) fn read_usize_env_with_min(key: &str, default: usize, min: usize) -> usize {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    let Ok(parsed) = raw.parse::<usize>() else {
        return default;
    };
    if parsed < min {
        default
    } else {
        parsed
    }
}

pub(crate) fn temp_root(prefix: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("vecnest_{prefix}_{stamp}"))
}

pub(crate) fn clean_root(root: &Path) {
    if !root.exists() {
        return;
    }
    if let Err(error) = fs::remove_dir_all(root) {
        tracing::warn!(root = %root.display(), %error, "bench cleanup failed");
    }
}
