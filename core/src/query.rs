use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::table::{Metadata, Record, Table};
use crate::vector::cosine_distance;

/// One ranked query hit. `score` is a cosine distance: lower is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Scores every vector-bearing record of `table` against `query` and returns
/// them closest first, ties broken by ascending id.
///
/// Records without values are skipped. A record whose vector length differs
/// from the query aborts the whole scan with `DimensionMismatch`. With a
/// `limit`, at most `min(limit, eligible)` matches are returned.
pub fn rank_matches(
    table: &Table,
    query: &[f32],
    limit: Option<usize>,
) -> Result<Vec<Match>, StoreError> {
    let mut ranked = match limit {
        Some(keep) => {
            let mut heap = BinaryHeap::with_capacity(keep.min(table.len()));
            for (record, values) in table.iter_vectors() {
                let score = cosine_distance(query, values)?;
                push_bounded(&mut heap, keep, Candidate { score, record });
            }
            heap.into_vec()
        }
        None => table
            .iter_vectors()
            .map(|(record, values)| {
                cosine_distance(query, values).map(|score| Candidate { score, record })
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    ranked.sort_unstable();

    Ok(ranked
        .into_iter()
        .map(|candidate| Match {
            id: candidate.record.id.clone(),
            score: candidate.score,
            metadata: candidate.record.metadata.clone(),
        })
        .collect())
}

fn push_bounded<'a>(heap: &mut BinaryHeap<Candidate<'a>>, keep: usize, candidate: Candidate<'a>) {
    if keep == 0 {
        return;
    }
    if heap.len() < keep {
        heap.push(candidate);
        return;
    }

    let should_replace = heap.peek().is_some_and(|worst| candidate < *worst);
    if should_replace {
        let _ = heap.pop();
        heap.push(candidate);
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    score: f32,
    record: &'a Record,
}

impl PartialEq for Candidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate<'_> {}

impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// NaN sorts after every number whatever its sign bit.
impl Ord for Candidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .is_nan()
            .cmp(&other.score.is_nan())
            .then_with(|| self.score.total_cmp(&other.score))
            .then_with(|| self.record.id.cmp(&other.record.id))
    }
}
