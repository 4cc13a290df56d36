//! Perceptual fingerprint value type.

use crate::error::{PhashError, Result};
use crate::similarity;
use crate::storage::codec;
use log::warn;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A bit encoded fingerprint of an image.
///
/// Every bit usually describes one section of the downscaled image (hue,
/// brightness, gradient or frequency information). Fingerprints created by the
/// same algorithm with the same settings can be compared cheaply by their
/// Hamming distance.
///
/// # Guard bit
///
/// The magnitude is an arbitrary precision integer, and integers drop leading
/// zero bits. The producing algorithm must therefore place a `1` guard bit
/// directly above the payload, at position `bit_length`. [`Fingerprint::new`]
/// trusts the caller and neither adds nor checks that bit; use
/// [`Fingerprint::from_payload`] or [`Fingerprint::from_bit_stream`] to have it
/// added.
///
/// Equality and hashing consider the algorithm id and the magnitude only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Payload bits plus the guard bit.
    magnitude: BigUint,
    /// Number of payload bits.
    bit_length: u32,
    /// Identifier of the algorithm and settings that produced the value.
    algorithm_id: i32,
}

impl Fingerprint {
    /// Creates a fingerprint from an already guard-bit padded magnitude.
    ///
    /// No padding is added and nothing is validated. A magnitude without the
    /// guard bit still works for distances, but [`Fingerprint::to_bit_string`]
    /// and [`Fingerprint::bit`] can no longer tell leading zeros apart from
    /// missing bits.
    pub fn new(magnitude: BigUint, bit_length: u32, algorithm_id: i32) -> Self {
        Self {
            magnitude,
            bit_length,
            algorithm_id,
        }
    }

    /// Creates a fingerprint from raw payload bits, adding the guard bit.
    ///
    /// Payload bits at or above `bit_length` are discarded.
    pub fn from_payload(payload: &BigUint, bit_length: u32, algorithm_id: i32) -> Self {
        let guard = BigUint::one() << bit_length;
        let mask = &guard - 1u32;
        let magnitude = (payload & &mask) | guard;
        Self::new(magnitude, bit_length, algorithm_id)
    }

    /// Creates a fingerprint by shifting in bits one after another.
    ///
    /// This is how hashing algorithms emit their values: the accumulator starts
    /// at the guard bit and every bit is shifted in from the right, so the
    /// first yielded bit ends up at position `bit_length - 1` and the last one
    /// at position 0.
    pub fn from_bit_stream<I>(bits: I, algorithm_id: i32) -> Result<Self>
    where
        I: IntoIterator<Item = bool>,
    {
        let mut magnitude = BigUint::one();
        let mut bit_length: u32 = 0;
        for bit in bits {
            magnitude <<= 1u32;
            if bit {
                magnitude |= BigUint::one();
            }
            bit_length = bit_length.checked_add(1).ok_or_else(|| {
                PhashError::InvalidArgument("bit stream longer than u32::MAX".to_string())
            })?;
        }

        if bit_length == 0 {
            return Err(PhashError::InvalidArgument(
                "a fingerprint needs at least one bit".to_string(),
            ));
        }

        Ok(Self::new(magnitude, bit_length, algorithm_id))
    }

    /// Rebuilds a fingerprint from its canonical magnitude bytes.
    ///
    /// The bytes alone do not carry bit length or algorithm id.
    pub fn from_bytes(bytes: &[u8], bit_length: u32, algorithm_id: i32) -> Self {
        Self::new(codec::decode(bytes), bit_length, algorithm_id)
    }

    /// Returns the canonical byte form of the magnitude, without a sign byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(&self.magnitude)
    }

    /// Returns the magnitude holding payload and guard bit.
    #[inline]
    pub fn magnitude(&self) -> &BigUint {
        &self.magnitude
    }

    /// Returns the number of payload bits.
    #[inline]
    pub fn bit_length(&self) -> u32 {
        self.bit_length
    }

    /// Returns the identifier of the algorithm and settings that created this value.
    #[inline]
    pub fn algorithm_id(&self) -> i32 {
        self.algorithm_id
    }

    /// Returns true if the highest set bit sits directly above the payload.
    pub fn has_guard_bit(&self) -> bool {
        self.magnitude.bits() == u64::from(self.bit_length) + 1
    }

    /// Checks if the bit at `position` is set. Position 0 is the least
    /// significant payload bit.
    pub fn bit(&self, position: u32) -> Result<bool> {
        if position >= self.bit_length {
            return Err(PhashError::OutOfRange {
                position: u64::from(position),
                length: self.bit_length,
            });
        }
        Ok(self.bit_unchecked(u64::from(position)))
    }

    /// Checks if the bit at `position` is set without checking the payload bounds.
    ///
    /// Positions beyond the magnitude's highest set bit read as `false`.
    #[inline]
    pub fn bit_unchecked(&self, position: u64) -> bool {
        self.magnitude.bit(position)
    }

    /// Iterates over the payload bits starting at position 0.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..u64::from(self.bit_length)).map(move |p| self.magnitude.bit(p))
    }

    /// Hamming distance to `other`, failing if the algorithms differ.
    pub fn hamming_distance(&self, other: &Fingerprint) -> Result<u32> {
        similarity::hamming_distance(self, other)
    }

    /// Hamming distance to `other` without the algorithm check.
    #[inline]
    pub fn hamming_distance_fast(&self, other: &Fingerprint) -> u32 {
        similarity::hamming_distance_fast(self, other)
    }

    /// Hamming distance to a bare magnitude without any check.
    #[inline]
    pub fn hamming_distance_raw(&self, magnitude: &BigUint) -> u32 {
        similarity::hamming_distance_raw(self, magnitude)
    }

    /// Hamming distance to `other` divided by the bit length, failing if the
    /// algorithms differ.
    pub fn normalized_hamming_distance(&self, other: &Fingerprint) -> Result<f64> {
        similarity::normalized_hamming_distance(self, other)
    }

    /// Normalized Hamming distance to `other` without the algorithm check.
    #[inline]
    pub fn normalized_hamming_distance_fast(&self, other: &Fingerprint) -> f64 {
        similarity::normalized_hamming_distance_fast(self, other)
    }

    /// Binary digits of the magnitude, left padded with zeros to `bit_length`.
    ///
    /// A guard-bit padded value yields `bit_length + 1` digits: the string is
    /// padded but never truncated.
    pub fn to_bit_string(&self) -> String {
        if !self.magnitude.is_zero() && !self.has_guard_bit() {
            warn!(
                "fingerprint [algoId: {}] has no guard bit above its {} payload bits",
                self.algorithm_id, self.bit_length
            );
        }
        format!(
            "{:0>width$}",
            self.magnitude.to_str_radix(2),
            width = self.bit_length as usize
        )
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm_id == other.algorithm_id && self.magnitude == other.magnitude
    }
}

impl Eq for Fingerprint {}

impl Hash for Fingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.algorithm_id.hash(state);
        self.magnitude.hash(state);
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hash: {} [algoId: {}]",
            self.to_bit_string(),
            self.algorithm_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(fp: &Fingerprint) -> u64 {
        let mut hasher = DefaultHasher::new();
        fp.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_bit_matches_magnitude() {
        let fp = Fingerprint::new(BigUint::from(0b1_1010u32), 4, 7);
        assert!(!fp.bit(0).unwrap());
        assert!(fp.bit(1).unwrap());
        assert!(!fp.bit(2).unwrap());
        assert!(fp.bit(3).unwrap());

        for p in 0..4u32 {
            assert_eq!(fp.bit(p).unwrap(), fp.magnitude().bit(u64::from(p)));
        }
    }

    #[test]
    fn test_bit_out_of_range() {
        let fp = Fingerprint::new(BigUint::from(0b1_1010u32), 4, 7);
        // The guard bit is not part of the payload.
        match fp.bit(4) {
            Err(PhashError::OutOfRange { position, length }) => {
                assert_eq!(position, 4);
                assert_eq!(length, 4);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_bit_unchecked() {
        let fp = Fingerprint::new(BigUint::from(0b1_1010u32), 4, 7);
        assert!(fp.bit_unchecked(4));
        assert!(!fp.bit_unchecked(5));
        assert!(!fp.bit_unchecked(10_000));
    }

    #[test]
    fn test_from_payload_keeps_leading_zeros() {
        let fp = Fingerprint::from_payload(&BigUint::from(0b0011u32), 4, 1);
        assert_eq!(fp.magnitude(), &BigUint::from(0b1_0011u32));
        assert!(fp.has_guard_bit());
        assert_eq!(fp.to_bit_string(), "10011");
    }

    #[test]
    fn test_from_payload_masks_excess_bits() {
        let fp = Fingerprint::from_payload(&BigUint::from(0b1111_0101u32), 4, 1);
        assert_eq!(fp.magnitude(), &BigUint::from(0b1_0101u32));
    }

    #[test]
    fn test_from_bit_stream() {
        let fp = Fingerprint::from_bit_stream([true, false, true, false], 3).unwrap();
        assert_eq!(fp.bit_length(), 4);
        assert_eq!(fp.magnitude(), &BigUint::from(0b1_1010u32));
        assert!(!fp.bit(0).unwrap());
        assert!(fp.bit(3).unwrap());
    }

    #[test]
    fn test_from_empty_bit_stream() {
        let err = Fingerprint::from_bit_stream(std::iter::empty(), 3).unwrap_err();
        assert!(matches!(err, PhashError::InvalidArgument(_)));
    }

    #[test]
    fn test_bit_length_is_stored() {
        // Without a guard bit the magnitude says nothing about the length.
        let fp = Fingerprint::new(BigUint::from(1u32), 64, 0);
        assert_eq!(fp.bit_length(), 64);
        assert!(!fp.has_guard_bit());
    }

    #[test]
    fn test_bits_iterator() {
        let fp = Fingerprint::new(BigUint::from(0b1_0110u32), 4, 0);
        let bits: Vec<bool> = fp.bits().collect();
        assert_eq!(bits, vec![false, true, true, false]);
    }

    #[test]
    fn test_equality_ignores_length() {
        let a = Fingerprint::new(BigUint::from(0b1_1010u32), 4, 9);
        let b = Fingerprint::new(BigUint::from(0b1_1010u32), 12, 9);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_equality_needs_same_algorithm() {
        let a = Fingerprint::new(BigUint::from(0b1_1010u32), 4, 1);
        let b = Fingerprint::new(BigUint::from(0b1_1010u32), 4, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let fp = Fingerprint::new(BigUint::from(0b1_1000_0000u32), 8, 4);
        let bytes = fp.to_bytes();
        assert_eq!(bytes, vec![0x01, 0x80]);
        assert_eq!(Fingerprint::from_bytes(&bytes, 8, 4), fp);
    }

    #[test]
    fn test_display() {
        let fp = Fingerprint::new(BigUint::from(0b1_0010u32), 4, 42);
        assert_eq!(fp.to_string(), "Hash: 10010 [algoId: 42]");

        let short = Fingerprint::new(BigUint::from(0b11u32), 6, 1);
        assert_eq!(short.to_bit_string(), "000011");
    }
}
