//! Composite fingerprints merged from several fingerprints of the same kind.

use crate::error::{PhashError, Result};
use crate::fingerprint::Fingerprint;
use num_bigint::BigUint;
use num_traits::One;

/// A majority vote over several fingerprints with per-bit confidence.
///
/// Each bit keeps a weight: +1 for every merged fingerprint that has the bit
/// set, -1 for every one that has it clear. The plain view returned by
/// [`FuzzyFingerprint::fingerprint`] sets a bit when its weight is positive.
/// Ties resolve to 0.
///
/// Merging returns a new value; a `FuzzyFingerprint` is never modified.
#[derive(Debug, Clone)]
pub struct FuzzyFingerprint {
    hash: Fingerprint,
    bit_weights: Vec<i32>,
    merged: u32,
}

impl FuzzyFingerprint {
    /// Creates a fuzzy fingerprint from one or more compatible fingerprints.
    pub fn from_fingerprints(fingerprints: &[Fingerprint]) -> Result<Self> {
        let (first, rest) = fingerprints.split_first().ok_or_else(|| {
            PhashError::InvalidArgument("at least one fingerprint is required".to_string())
        })?;

        let mut bit_weights = vec![0i32; first.bit_length() as usize];
        accumulate(&mut bit_weights, first);
        for fp in rest {
            check_compatible(first, fp)?;
            accumulate(&mut bit_weights, fp);
        }

        let merged = u32::try_from(fingerprints.len()).map_err(|_| {
            PhashError::InvalidArgument("too many fingerprints to merge".to_string())
        })?;

        Ok(Self::from_weights(bit_weights, merged, first.algorithm_id()))
    }

    /// Rebuilds a fuzzy fingerprint from stored weights.
    ///
    /// The bit length is the number of weights.
    pub fn from_parts(bit_weights: Vec<i32>, merged: u32, algorithm_id: i32) -> Result<Self> {
        if bit_weights.is_empty() {
            return Err(PhashError::InvalidArgument(
                "a fuzzy fingerprint needs at least one bit".to_string(),
            ));
        }
        if merged == 0 {
            return Err(PhashError::InvalidArgument(
                "a fuzzy fingerprint needs at least one merged fingerprint".to_string(),
            ));
        }
        if u32::try_from(bit_weights.len()).is_err() {
            return Err(PhashError::InvalidArgument("too many bit weights".to_string()));
        }
        if let Some(w) = bit_weights.iter().find(|w| w.unsigned_abs() > merged) {
            return Err(PhashError::InvalidArgument(format!(
                "bit weight {} exceeds the {} merged fingerprints",
                w, merged
            )));
        }
        Ok(Self::from_weights(bit_weights, merged, algorithm_id))
    }

    fn from_weights(bit_weights: Vec<i32>, merged: u32, algorithm_id: i32) -> Self {
        let bit_length = bit_weights.len() as u32;
        let mut magnitude = BigUint::one() << bit_length;
        for (i, w) in bit_weights.iter().enumerate() {
            if *w > 0 {
                magnitude.set_bit(i as u64, true);
            }
        }

        Self {
            hash: Fingerprint::new(magnitude, bit_length, algorithm_id),
            bit_weights,
            merged,
        }
    }

    /// Returns a new fuzzy fingerprint with `other` merged in.
    pub fn merge(&self, other: &Fingerprint) -> Result<Self> {
        check_compatible(&self.hash, other)?;
        let mut bit_weights = self.bit_weights.clone();
        accumulate(&mut bit_weights, other);
        Ok(Self::from_weights(
            bit_weights,
            self.merged + 1,
            self.hash.algorithm_id(),
        ))
    }

    /// Returns the majority vote as a plain fingerprint.
    #[inline]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.hash
    }

    /// Returns the per-bit weights, indexed by bit position.
    #[inline]
    pub fn bit_weights(&self) -> &[i32] {
        &self.bit_weights
    }

    /// Returns how many fingerprints went into this value.
    #[inline]
    pub fn merged(&self) -> u32 {
        self.merged
    }

    /// Returns the number of payload bits.
    #[inline]
    pub fn bit_length(&self) -> u32 {
        self.hash.bit_length()
    }

    /// Returns the algorithm id shared by all merged fingerprints.
    #[inline]
    pub fn algorithm_id(&self) -> i32 {
        self.hash.algorithm_id()
    }

    /// Returns how strongly the merged fingerprints agree on a bit, in `[0, 1]`.
    ///
    /// 1 means every merged fingerprint had the same value, 0 means a tie.
    pub fn certainty(&self, position: u32) -> Result<f64> {
        let w = self.weight(position)?;
        Ok(f64::from(w.unsigned_abs()) / f64::from(self.merged))
    }

    /// Returns the probability that the bit at `position` is set.
    pub fn probability(&self, position: u32) -> Result<f64> {
        let w = self.weight(position)?;
        Ok(self.probability_of(w))
    }

    fn weight(&self, position: u32) -> Result<i32> {
        self.bit_weights
            .get(position as usize)
            .copied()
            .ok_or(PhashError::OutOfRange {
                position: u64::from(position),
                length: self.bit_length(),
            })
    }

    fn probability_of(&self, weight: i32) -> f64 {
        let merged = f64::from(self.merged);
        (f64::from(weight) + merged) / (2.0 * merged)
    }

    /// Expected fraction of bits in which `other` disagrees with the merged
    /// fingerprints, in `[0, 1]`.
    ///
    /// Unlike the Hamming distance of the majority vote, bits the merged
    /// fingerprints disagree on count only partially.
    pub fn weighted_distance(&self, other: &Fingerprint) -> Result<f64> {
        check_compatible(&self.hash, other)?;
        let sum: f64 = self.mismatches(other).sum();
        Ok(sum / f64::from(self.bit_length()))
    }

    /// Like [`FuzzyFingerprint::weighted_distance`] but squares every per-bit
    /// mismatch, so uncertain bits count even less.
    pub fn squared_weighted_distance(&self, other: &Fingerprint) -> Result<f64> {
        check_compatible(&self.hash, other)?;
        let sum: f64 = self.mismatches(other).map(|m| m * m).sum();
        Ok(sum / f64::from(self.bit_length()))
    }

    fn mismatches<'a>(&'a self, other: &'a Fingerprint) -> impl Iterator<Item = f64> + 'a {
        self.bit_weights.iter().enumerate().map(move |(i, &w)| {
            let p = self.probability_of(w);
            if other.bit_unchecked(i as u64) {
                1.0 - p
            } else {
                p
            }
        })
    }
}

impl PartialEq for FuzzyFingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for FuzzyFingerprint {}

fn check_compatible(expected: &Fingerprint, fp: &Fingerprint) -> Result<()> {
    if expected.algorithm_id() != fp.algorithm_id() {
        return Err(PhashError::IncompatibleAlgorithm {
            left: expected.algorithm_id(),
            right: fp.algorithm_id(),
        });
    }
    if expected.bit_length() != fp.bit_length() {
        return Err(PhashError::InvalidArgument(format!(
            "bit length mismatch: {} != {}",
            expected.bit_length(),
            fp.bit_length()
        )));
    }
    Ok(())
}

fn accumulate(bit_weights: &mut [i32], fp: &Fingerprint) {
    for (i, w) in bit_weights.iter_mut().enumerate() {
        if fp.bit_unchecked(i as u64) {
            *w += 1;
        } else {
            *w -= 1;
        }
    }
}
