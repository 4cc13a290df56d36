//! Distance measures for comparing fingerprints.

mod hamming;
mod search;

pub use hamming::{
    hamming_distance, hamming_distance_fast, hamming_distance_raw, normalized_hamming_distance,
    normalized_hamming_distance_fast, HammingDistance, NormalizedHamming,
};
pub use search::{closest, closest_parallel};

use crate::error::Result;
use crate::fingerprint::Fingerprint;

/// Trait for distance measures between fingerprints.
pub trait DistanceMeasure {
    /// Computes the distance between two fingerprints.
    ///
    /// Lower values mean more similar images; 0 is returned for identical
    /// fingerprints.
    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> Result<f64>;

    /// Computes a similarity score.
    ///
    /// Default implementation: 1.0 - distance, which is only meaningful for
    /// normalized measures.
    fn similarity(&self, a: &Fingerprint, b: &Fingerprint) -> Result<f64> {
        self.distance(a, b).map(|d| 1.0 - d)
    }
}

/// Enum for the available distance measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceType {
    /// Number of differing bits.
    Hamming,
    /// Number of differing bits divided by the bit length.
    NormalizedHamming,
}

impl DistanceType {
    /// Computes the distance using this measure.
    pub fn compute(&self, a: &Fingerprint, b: &Fingerprint) -> Result<f64> {
        match self {
            DistanceType::Hamming => HammingDistance.distance(a, b),
            DistanceType::NormalizedHamming => NormalizedHamming.distance(a, b),
        }
    }
}
