//! Vector distance and nearest-neighbour search.
//!
//! Pure-Rust implementations of:
//! - Squared Euclidean (L2) distance
//! - Cosine similarity / cosine distance
//! - Exact k-nearest-neighbour ranking over a record slice

use quartermaster_core::error::{Error, StorageError};
use quartermaster_core::memory::{Distance, MemoryRecord, ScoredRecord};

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is empty, all zeros, or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Squared Euclidean distance. Callers guarantee equal lengths.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x as f64) - (*y as f64);
            d * d
        })
        .sum::<f64>() as f32
}

/// Distance under `metric`. Lower is more similar.
pub fn distance(metric: Distance, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        Distance::L2 => squared_l2(a, b),
        Distance::Cosine => 1.0 - cosine_similarity(a, b),
    }
}

/// Check `actual` against the dimension fixed by the collection's first record.
pub fn ensure_dimension(records: &[MemoryRecord], actual: usize) -> Result<(), Error> {
    if actual == 0 {
        return Err(Error::InvalidArgument("vector must not be empty".into()));
    }
    match records.first() {
        Some(first) if first.vector.len() != actual => Err(StorageError::DimensionMismatch {
            expected: first.vector.len(),
            actual,
        }
        .into()),
        _ => Ok(()),
    }
}

/// Rank `records` by distance to `query`, keeping the `k` nearest.
///
/// Ties keep insertion order. `k == 0` is rejected.
pub fn nearest(
    records: &[MemoryRecord],
    query: &[f32],
    k: usize,
    metric: Distance,
) -> Result<Vec<ScoredRecord>, Error> {
    if k == 0 {
        return Err(Error::InvalidArgument("k must be at least 1".into()));
    }
    if records.is_empty() {
        return Ok(Vec::new());
    }
    ensure_dimension(records, query.len())?;

    let mut scored: Vec<ScoredRecord> = records
        .iter()
        .map(|record| ScoredRecord {
            distance: distance(metric, &record.vector, query),
            record: record.clone(),
        })
        .collect();

    // stable sort keeps insertion order among equal distances
    scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    scored.truncate(k);
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartermaster_core::memory::Metadata;

    fn record(id: &str, vector: Vec<f32>) -> MemoryRecord {
        MemoryRecord {
            id: id.into(),
            fact: format!("Fact {id}"),
            vector,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn squared_l2_known_value() {
        // (1-4)^2 + (2-6)^2 = 9 + 16
        assert!((squared_l2(&[1.0, 2.0], &[4.0, 6.0]) - 25.0).abs() < 1e-6);
        assert_eq!(squared_l2(&[0.5, 0.5], &[0.5, 0.5]), 0.0);
    }

    #[test]
    fn cosine_distance_is_one_minus_similarity() {
        let d = distance(Distance::Cosine, &[1.0, 1.0], &[1.0, 0.0]);
        assert!((d - (1.0 - 0.7071)).abs() < 0.001);
    }

    #[test]
    fn nearest_ranks_ascending() {
        let records = vec![
            record("far", vec![0.0, 1.0]),
            record("exact", vec![1.0, 0.0]),
            record("near", vec![0.8, 0.2]),
        ];
        let hits = nearest(&records, &[1.0, 0.0], 10, Distance::L2).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.record.id.as_str()).collect();
        assert_eq!(ids, vec!["exact", "near", "far"]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn nearest_truncates_to_k() {
        let records: Vec<_> = (0..10)
            .map(|i| record(&format!("r{i}"), vec![1.0, i as f32]))
            .collect();
        let hits = nearest(&records, &[1.0, 0.0], 3, Distance::Cosine).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].record.id, "r0");
    }

    #[test]
    fn nearest_ties_keep_insertion_order() {
        let records = vec![record("first", vec![1.0, 0.0]), record("second", vec![1.0, 0.0])];
        let hits = nearest(&records, &[1.0, 0.0], 2, Distance::L2).unwrap();
        assert_eq!(hits[0].record.id, "first");
        assert_eq!(hits[1].record.id, "second");
    }

    #[test]
    fn nearest_rejects_zero_k() {
        let records = vec![record("a", vec![1.0])];
        let err = nearest(&records, &[1.0], 0, Distance::L2).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn nearest_on_empty_is_empty() {
        assert!(nearest(&[], &[1.0, 2.0], 3, Distance::L2).unwrap().is_empty());
    }

    #[test]
    fn nearest_rejects_wrong_dimension() {
        let records = vec![record("a", vec![1.0, 0.0, 0.0])];
        let err = nearest(&records, &[1.0, 0.0], 1, Distance::L2).unwrap_err();
        assert!(matches!(
            err,
            Error::Storage(StorageError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }
}
