//! Canonical byte form of fingerprint magnitudes.
//!
//! A magnitude is written as the shortest unsigned big-endian byte sequence.
//! Two's-complement encoders insert a `0x00` sign byte whenever the top bit of
//! the leading byte is set; that byte carries no information for non-negative
//! magnitudes and is dropped. Decoding accepts both forms.
//!
//! Only the magnitude is encoded. Bit length and algorithm id have to travel
//! next to it.

use num_bigint::BigUint;
use num_traits::Zero;

/// Encodes a magnitude into its minimal unsigned big-endian bytes.
///
/// Zero encodes to an empty sequence.
pub fn encode(magnitude: &BigUint) -> Vec<u8> {
    let mut bytes = to_signed_bytes(magnitude);
    if bytes.first() == Some(&0) {
        bytes.remove(0);
    }
    bytes
}

/// Decodes unsigned big-endian bytes, with or without a leading sign byte.
pub fn decode(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Encodes a magnitude as two's-complement big-endian bytes, keeping the
/// `0x00` sign byte when the leading byte has its top bit set.
///
/// Zero encodes to `[0x00]`.
pub fn to_signed_bytes(magnitude: &BigUint) -> Vec<u8> {
    if magnitude.is_zero() {
        return vec![0];
    }
    let mut bytes = magnitude.to_bytes_be();
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    bytes
}
