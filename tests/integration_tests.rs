//! Integration tests for fingerprint comparison, encoding, persistence and rendering.

use num_bigint::BigUint;
use phash_core::render::grid_side;
use phash_core::storage::codec;
use phash_core::{
    BlockRenderer, DistanceType, Fingerprint, FuzzyFingerprint, HashFormat, PhashError,
    RecordKind, RenderConfig, StoredFingerprint,
};
use std::collections::HashSet;
use std::io::Cursor;
use tempfile::tempdir;

const MEDIAN_HASH_14: i32 = 552703146;

/// Deterministic pseudo-random payload bits for a test image.
fn image_bits(seed: u64, len: usize) -> Vec<bool> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) & 1 == 1
        })
        .collect()
}

fn fingerprint(seed: u64, len: usize, algorithm_id: i32) -> Fingerprint {
    Fingerprint::from_bit_stream(image_bits(seed, len), algorithm_id).unwrap()
}

#[test]
fn test_identical_source_has_zero_distance() {
    let a = fingerprint(1, 14, MEDIAN_HASH_14);
    let b = fingerprint(1, 14, MEDIAN_HASH_14);

    assert_eq!(a.bit_length(), 14);
    assert_eq!(a.hamming_distance_fast(&b), 0);
    assert_eq!(a.hamming_distance(&b).unwrap(), 0);
    assert_eq!(a, b);
}

#[test]
fn test_four_bit_payload_distance() {
    let a = Fingerprint::new(BigUint::from(0b1_1010u32), 4, 3);
    let b = Fingerprint::new(BigUint::from(0b1_1100u32), 4, 3);
    assert_eq!(a.hamming_distance(&b).unwrap(), 2);
}

#[test]
fn test_distance_properties() {
    let fps: Vec<Fingerprint> = (0..20).map(|seed| fingerprint(seed, 64, 11)).collect();

    for a in &fps {
        assert_eq!(a.hamming_distance(a).unwrap(), 0);
        for b in &fps {
            let d = a.hamming_distance(b).unwrap();
            assert_eq!(d, b.hamming_distance(a).unwrap());
            assert!(d <= a.bit_length());

            let normalized = a.normalized_hamming_distance(b).unwrap();
            assert!((normalized - f64::from(d) / 64.0).abs() < 1e-10);
            assert!((0.0..=1.0).contains(&normalized));
        }
    }
}

#[test]
fn test_checked_distance_rejects_other_algorithms() {
    let a = fingerprint(5, 16, 1);
    let b = fingerprint(6, 16, 2);

    assert!(matches!(
        a.hamming_distance(&b),
        Err(PhashError::IncompatibleAlgorithm { left: 1, right: 2 })
    ));
    assert!(a.normalized_hamming_distance(&b).is_err());
    assert!(DistanceType::Hamming.compute(&a, &b).is_err());

    let fast = a.hamming_distance_fast(&b);
    assert!(fast <= 16);
    let _ = a.normalized_hamming_distance_fast(&b);
}

#[test]
fn test_bit_access_matches_magnitude() {
    let fp = fingerprint(9, 37, 4);
    for p in 0..37u32 {
        assert_eq!(fp.bit(p).unwrap(), fp.magnitude().bit(u64::from(p)));
    }
    assert!(matches!(fp.bit(37), Err(PhashError::OutOfRange { .. })));
    // Guard bit.
    assert!(fp.bit_unchecked(37));
    assert!(!fp.bit_unchecked(38));
}

#[test]
fn test_canonical_bytes() {
    assert_eq!(codec::encode(&BigUint::from(255u32)), vec![0xFF]);
    assert_eq!(codec::decode(&[0x00, 0xFF]), BigUint::from(255u32));
    assert_eq!(codec::encode(&BigUint::from(128u32)), vec![0x80]);
    assert_eq!(codec::decode(&[0x80]), BigUint::from(128u32));

    let zero = BigUint::from(0u32);
    assert_eq!(codec::decode(&codec::encode(&zero)), zero);

    for seed in 0..10 {
        let fp = fingerprint(seed, 71, 2);
        let bytes = fp.to_bytes();
        let restored = Fingerprint::from_bytes(&bytes, fp.bit_length(), fp.algorithm_id());
        assert_eq!(restored, fp);

        let mut with_sign = vec![0u8];
        with_sign.extend_from_slice(&bytes);
        assert_eq!(&codec::decode(&with_sign), fp.magnitude());
    }
}

#[test]
fn test_equal_fingerprints_hash_equal() {
    let a = fingerprint(3, 32, 8);
    let b = fingerprint(3, 32, 8);
    let other_algorithm = Fingerprint::new(a.magnitude().clone(), 32, 9);

    let mut set = HashSet::new();
    set.insert(a.clone());
    assert!(set.contains(&b));
    assert!(!set.contains(&other_algorithm));
    assert_ne!(a, other_algorithm);
}

#[test]
fn test_save_and_load_plain() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("image.hash");
    let fp = fingerprint(42, 64, MEDIAN_HASH_14);

    fp.save(&path).unwrap();
    let loaded = Fingerprint::load(&path).unwrap();

    assert_eq!(loaded.kind(), RecordKind::Plain);
    assert_eq!(loaded.fingerprint(), &fp);
    assert_eq!(loaded.fingerprint().bit_length(), 64);
}

#[test]
fn test_save_and_load_fuzzy() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fuzzy.hash");

    let fps: Vec<Fingerprint> = (0..5).map(|seed| fingerprint(seed, 25, 7)).collect();
    let fuzzy = FuzzyFingerprint::from_fingerprints(&fps).unwrap();
    fuzzy.save(&path).unwrap();

    match Fingerprint::load(&path).unwrap() {
        StoredFingerprint::Fuzzy(loaded) => {
            assert_eq!(loaded, fuzzy);
            assert_eq!(loaded.merged(), 5);
            assert_eq!(loaded.bit_weights(), fuzzy.bit_weights());
            for fp in &fps {
                let a = loaded.weighted_distance(fp).unwrap();
                let b = fuzzy.weighted_distance(fp).unwrap();
                assert!((a - b).abs() < 1e-10);
            }
        }
        other => panic!("expected fuzzy record, got {:?}", other.kind()),
    }
}

#[test]
fn test_corrupt_stream() {
    let mut buf = Vec::new();
    HashFormat::save(&StoredFingerprint::from(fingerprint(1, 16, 1)), &mut buf).unwrap();

    let mut unknown = buf.clone();
    unknown[6] = 0xEE;
    assert!(matches!(
        HashFormat::load(Cursor::new(unknown)),
        Err(PhashError::CorruptData(_))
    ));

    assert!(matches!(
        HashFormat::load(Cursor::new(&buf[..10])),
        Err(PhashError::CorruptData(_))
    ));
}

#[test]
fn test_weighted_distance_bounds() {
    let members: Vec<Fingerprint> = (0..3).map(|seed| fingerprint(seed, 64, 5)).collect();
    let fuzzy = FuzzyFingerprint::from_fingerprints(&members).unwrap();
    let stranger = fingerprint(99, 64, 5);

    let member_distance = fuzzy.weighted_distance(&members[0]).unwrap();
    let stranger_distance = fuzzy.weighted_distance(&stranger).unwrap();
    assert!((0.0..=1.0).contains(&member_distance));
    assert!((0.0..=1.0).contains(&stranger_distance));

    let other_algorithm = fingerprint(0, 64, 6);
    assert!(fuzzy.weighted_distance(&other_algorithm).is_err());
}

#[test]
fn test_render_dimensions() {
    let renderer = BlockRenderer::new(RenderConfig {
        block_size: 10,
        ..RenderConfig::default()
    });

    let fp = fingerprint(1, 16, 1);
    let img = renderer.render(&fp).unwrap();
    assert_eq!(img.dimensions(), (40, 40));

    for len in [1usize, 10, 14, 25, 63, 64] {
        let fp = fingerprint(2, len, 1);
        let img = renderer.render(&fp).unwrap();
        let expected = 10 * grid_side(len as u32);
        assert_eq!(img.dimensions(), (expected, expected));
    }
}

#[test]
fn test_render_zero_block_size() {
    let renderer = BlockRenderer::new(RenderConfig {
        block_size: 0,
        ..RenderConfig::default()
    });
    let err = renderer.render(&fingerprint(1, 16, 1)).unwrap_err();
    assert!(matches!(err, PhashError::InvalidArgument(_)));
}

#[test]
fn test_display_form() {
    let fp = Fingerprint::from_bit_stream([false, false, true, true], 12).unwrap();
    assert_eq!(fp.to_string(), "Hash: 10011 [algoId: 12]");
}
