//! # Clip Rotation
//!
//! Least-recently-used selection over a candidate list.
//!
//! Candidates are ranked by `(last_used, usage_count)` ascending with a
//! stable sort, so clips that were never used come first and equal keys keep
//! their discovery order. When fewer candidates exist than requested, the
//! whole ranking is returned and the shortfall is filled with uniform random
//! picks (with replacement) from the same ranking.
//!
//! The functions here never touch the usage table; recording a run is the
//! caller's job once the selection is accepted.

use crate::error::{ClipError, ClipResult};
use crate::usage::UsageTable;
use rand::seq::SliceRandom;
use rand::Rng;

/// Rank candidates least-recently-used first.
pub fn rank<S: AsRef<str>>(candidates: &[S], table: &UsageTable) -> Vec<String> {
    let mut keyed: Vec<_> = candidates
        .iter()
        .map(|clip| (clip.as_ref(), table.record(clip.as_ref())))
        .collect();

    // `sort_by` is stable: ties keep input order
    keyed.sort_by(|(_, a), (_, b)| {
        a.last_used
            .total_cmp(&b.last_used)
            .then(a.usage_count.cmp(&b.usage_count))
    });

    keyed.into_iter().map(|(clip, _)| clip.to_string()).collect()
}

/// Pick exactly `count` clips from `candidates`.
///
/// Returns [`ClipError::EmptyCandidateSet`] when there is nothing to pick
/// from but `count > 0`.
pub fn select<S, R>(
    candidates: &[S],
    table: &UsageTable,
    count: usize,
    rng: &mut R,
) -> ClipResult<Vec<String>>
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    if count == 0 {
        return Ok(Vec::new());
    }
    if candidates.is_empty() {
        return Err(ClipError::EmptyCandidateSet { requested: count });
    }

    let mut ranked = rank(candidates, table);

    if ranked.len() >= count {
        ranked.truncate(count);
        return Ok(ranked);
    }

    let shortfall = count - ranked.len();
    tracing::debug!(
        "Only {} candidate(s) for {count} slot(s); repeating {shortfall} at random",
        ranked.len()
    );

    let repeats: Vec<String> = (0..shortfall)
        .filter_map(|_| ranked.choose(rng).cloned())
        .collect();
    ranked.extend(repeats);

    Ok(ranked)
}
