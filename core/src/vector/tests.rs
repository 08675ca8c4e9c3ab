use super::*;

const EPSILON: f32 = 1e-5;

fn approx_eq(left: f32, right: f32) {
    assert!((left - right).abs() < EPSILON, "expected {left} ~= {right}");
}

fn deterministic_vector(seed: usize, len: usize) -> Vec<f32> {
    (0..len)
        .map(|index| {
            let mixed = seed
                .wrapping_mul(1_103_515_245)
                .wrapping_add(index.wrapping_mul(12_345))
                .wrapping_add(97);
            let base = (mixed % 10_000) as f32 / 5_000.0;
            base - 1.0
        })
        .collect()
}

fn scalar_cosine_distance(left: &[f32], right: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut left_sq = 0.0f64;
    let mut right_sq = 0.0f64;
    for (&l, &r) in left.iter().zip(right) {
        dot += f64::from(l) * f64::from(r);
        left_sq += f64::from(l) * f64::from(l);
        right_sq += f64::from(r) * f64::from(r);
    }
    (1.0 - dot / (left_sq.sqrt() * right_sq.sqrt())) as f32
}

#[test]
fn dot_product_works() {
    let left = [1.0, 2.0, 3.0];
    let right = [4.0, 5.0, 6.0];
    let score = dot_product(&left, &right).expect("dot product should succeed");
    approx_eq(score, 32.0);
}

#[test]
fn orthogonal_vectors_have_unit_distance() {
    let distance = cosine_distance(&[1.0, 0.0], &[0.0, 1.0]).expect("cosine should succeed");
    approx_eq(distance, 1.0);
    let similarity =
        cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).expect("cosine should succeed");
    approx_eq(similarity, 0.0);
}

#[test]
fn opposite_vectors_have_maximal_distance() {
    let distance = cosine_distance(&[1.0, 2.0], &[-1.0, -2.0]).expect("cosine should succeed");
    approx_eq(distance, 2.0);
}

#[test]
fn distance_ignores_magnitude() {
    let distance = cosine_distance(&[1.0, 1.0], &[5.0, 5.0]).expect("cosine should succeed");
    approx_eq(distance, 0.0);
}

#[test]
fn self_distance_is_exactly_zero() {
    for seed in 0..64 {
        let len = 1 + seed % 37;
        let values = deterministic_vector(seed, len);
        let distance = cosine_distance(&values, &values).expect("cosine should succeed");
        assert_eq!(distance, 0.0, "seed={seed} len={len}");
    }
    assert_eq!(
        cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).expect("cosine should succeed"),
        0.0
    );
}

#[test]
fn zero_vector_distance_is_one() {
    let zero = [0.0f32; 12];
    let other = deterministic_vector(3, 12);
    assert_eq!(cosine_distance(&zero, &zero).expect("must succeed"), 1.0);
    assert_eq!(cosine_distance(&zero, &other).expect("must succeed"), 1.0);
    assert_eq!(cosine_distance(&other, &zero).expect("must succeed"), 1.0);
    assert_eq!(cosine_similarity(&zero, &other).expect("must succeed"), 0.0);
}

#[test]
fn empty_vectors_are_treated_as_zero_vectors() {
    let distance = cosine_distance(&[], &[]).expect("equal empty lengths must succeed");
    assert_eq!(distance, MAX_UNDEFINED_DISTANCE);
}

#[test]
fn distance_is_exactly_symmetric() {
    for seed in 0..64 {
        let len = 1 + seed % 29;
        let left = deterministic_vector(seed, len);
        let right = deterministic_vector(seed + 1_000, len);
        let forward = cosine_distance(&left, &right).expect("cosine should succeed");
        let backward = cosine_distance(&right, &left).expect("cosine should succeed");
        assert_eq!(forward.to_bits(), backward.to_bits(), "seed={seed}");
    }
}

#[test]
fn rejects_dimension_mismatch() {
    let error = cosine_distance(&[1.0, 2.0], &[1.0]).expect_err("must fail");
    assert_eq!(error, VectorError::DimensionMismatch { left: 2, right: 1 });
    assert_eq!(error.to_string(), "dimension mismatch: left=2, right=1");

    let error = dot_product(&[], &[1.0]).expect_err("must fail");
    assert_eq!(error, VectorError::DimensionMismatch { left: 0, right: 1 });
}

#[test]
fn simd_and_scalar_paths_agree_across_tail_lengths() {
    for len in [1usize, 7, 8, 9, 15, 16, 17, 63, 64, 65, 129] {
        let left = deterministic_vector(len, len);
        let right = deterministic_vector(len * 3 + 11, len);
        let distance = cosine_distance(&left, &right).expect("cosine should succeed");
        let expected = scalar_cosine_distance(&left, &right).clamp(0.0, 2.0);
        assert!(
            (distance - expected).abs() < 1e-4,
            "len={len} distance={distance} expected={expected}"
        );
    }
}

#[test]
fn distance_stays_within_bounds() {
    for seed in 0..128 {
        let left = deterministic_vector(seed, 24);
        let right = deterministic_vector(seed * 7 + 5, 24);
        let distance = cosine_distance(&left, &right).expect("cosine should succeed");
        assert!((0.0..=2.0).contains(&distance), "distance={distance}");
    }
}

#[test]
fn large_vectors_keep_exact_self_distance() {
    let huge = [1e20f32, 1e20];
    assert_eq!(cosine_distance(&huge, &huge).expect("must succeed"), 0.0);

    let extreme = vec![f32::MAX; 19];
    assert_eq!(cosine_distance(&extreme, &extreme).expect("must succeed"), 0.0);

    for seed in 0..16 {
        let left: Vec<f32> = deterministic_vector(seed, 21)
            .into_iter()
            .map(|value| value * 1e30)
            .collect();
        let right: Vec<f32> = deterministic_vector(seed + 500, 21)
            .into_iter()
            .map(|value| value * 1e30)
            .collect();
        assert_eq!(cosine_distance(&left, &left).expect("must succeed"), 0.0);
        let forward = cosine_distance(&left, &right).expect("must succeed");
        let backward = cosine_distance(&right, &left).expect("must succeed");
        assert!(!forward.is_nan(), "seed={seed}");
        assert_eq!(forward.to_bits(), backward.to_bits(), "seed={seed}");
    }
}

#[test]
fn tiny_vectors_are_not_zero_vectors() {
    let tiny = [1e-30f32, 1e-30];
    assert_eq!(cosine_distance(&tiny, &tiny).expect("must succeed"), 0.0);
    approx_eq(
        cosine_distance(&tiny, &[1e-30, -1e-30]).expect("must succeed"),
        1.0,
    );

    let subnormal = [f32::from_bits(1), 0.0, f32::from_bits(1)];
    assert_eq!(
        cosine_distance(&subnormal, &subnormal).expect("must succeed"),
        0.0
    );
}

#[test]
fn validate_finite_reports_first_bad_component() {
    assert_eq!(validate_finite(&[0.0, -1.5, f32::MAX]), Ok(()));
    assert_eq!(validate_finite(&[]), Ok(()));

    let error = validate_finite(&[1.0, f32::INFINITY, f32::NAN]).expect_err("must fail");
    assert_eq!(
        error,
        VectorError::NonFiniteValue {
            index: 1,
            value: f32::INFINITY
        }
    );
    assert_eq!(error.to_string(), "non-finite value at index 1: inf");

    let error = validate_finite(&[f32::NAN]).expect_err("must fail");
    assert!(matches!(error, VectorError::NonFiniteValue { index: 0, .. }));
}
