//! Hamming distance between fingerprints.

use crate::error::{PhashError, Result};
use crate::fingerprint::Fingerprint;
use crate::similarity::DistanceMeasure;
use num_bigint::BigUint;

/// Number of differing bits, failing if the fingerprints come from different
/// algorithms.
///
/// Falls within `[0, bit_length]`. Identical images give 0, but 0 does not
/// imply identical images.
pub fn hamming_distance(a: &Fingerprint, b: &Fingerprint) -> Result<u32> {
    check_algorithm(a, b)?;
    Ok(hamming_distance_fast(a, b))
}

/// Number of differing bits without the algorithm check.
///
/// Comparing fingerprints of different algorithms or lengths returns a
/// number that means nothing; the caller is responsible for valid inputs.
#[inline]
pub fn hamming_distance_fast(a: &Fingerprint, b: &Fingerprint) -> u32 {
    hamming_distance_raw(a, b.magnitude())
}

/// Number of differing bits between a fingerprint and a bare magnitude.
///
/// Saturates at `u32::MAX` for magnitudes whose difference has more set bits
/// than a `u32` can count.
#[inline]
pub fn hamming_distance_raw(a: &Fingerprint, magnitude: &BigUint) -> u32 {
    u32::try_from((a.magnitude() ^ magnitude).count_ones()).unwrap_or(u32::MAX)
}

/// Hamming distance divided by the bit length of `a`, in `[0, 1]`, failing
/// if the fingerprints come from different algorithms.
pub fn normalized_hamming_distance(a: &Fingerprint, b: &Fingerprint) -> Result<f64> {
    check_algorithm(a, b)?;
    Ok(normalized_hamming_distance_fast(a, b))
}

/// Normalized Hamming distance without the algorithm check.
#[inline]
pub fn normalized_hamming_distance_fast(a: &Fingerprint, b: &Fingerprint) -> f64 {
    f64::from(hamming_distance_fast(a, b)) / f64::from(a.bit_length())
}

fn check_algorithm(a: &Fingerprint, b: &Fingerprint) -> Result<()> {
    if a.algorithm_id() != b.algorithm_id() {
        return Err(PhashError::IncompatibleAlgorithm {
            left: a.algorithm_id(),
            right: b.algorithm_id(),
        });
    }
    Ok(())
}

/// Hamming distance as a measure, returning the raw bit count.
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingDistance;

impl DistanceMeasure for HammingDistance {
    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> Result<f64> {
        hamming_distance(a, b).map(f64::from)
    }
}

/// Normalized Hamming distance as a measure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedHamming;

impl DistanceMeasure for NormalizedHamming {
    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> Result<f64> {
        normalized_hamming_distance(a, b)
    }
}
