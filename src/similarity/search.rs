//! Linear nearest-fingerprint search.

use crate::fingerprint::Fingerprint;
use log::debug;
use rayon::prelude::*;

/// Finds the candidate closest to `query` by Hamming distance.
///
/// Candidates produced by a different algorithm are skipped. Returns the
/// candidate index and its distance; ties go to the lowest index.
pub fn closest(query: &Fingerprint, candidates: &[Fingerprint]) -> Option<(usize, u32)> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(idx, candidate)| compatible_distance(query, idx, candidate))
        .min_by_key(|&(idx, distance)| (distance, idx))
}

/// Finds the candidate closest to `query` in parallel.
///
/// Same result as [`closest`]; worthwhile for large candidate sets.
pub fn closest_parallel(query: &Fingerprint, candidates: &[Fingerprint]) -> Option<(usize, u32)> {
    candidates
        .par_iter()
        .enumerate()
        .filter_map(|(idx, candidate)| compatible_distance(query, idx, candidate))
        .min_by_key(|&(idx, distance)| (distance, idx))
}

fn compatible_distance(
    query: &Fingerprint,
    idx: usize,
    candidate: &Fingerprint,
) -> Option<(usize, u32)> {
    match query.hamming_distance(candidate) {
        Ok(distance) => Some((idx, distance)),
        Err(e) => {
            debug!("skipping candidate {}: {}", idx, e);
            None
        }
    }
}
