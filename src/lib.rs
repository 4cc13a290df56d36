//! # phash-core - Perceptual image fingerprints
//!
//! Compact bit vector fingerprints of images, and the machinery to compare,
//! persist and visualize them.
//!
//! ## Overview
//!
//! A hashing algorithm scans an image and emits a sequence of bits. The bits
//! are collected into a [`Fingerprint`]: an arbitrary precision magnitude with
//! a guard bit above the payload, the payload length, and the id of the
//! algorithm that produced it. Fingerprints of the same algorithm are compared
//! by their Hamming distance; fingerprints of different algorithms are not
//! comparable.
//!
//! ## Key Features
//!
//! - **Checked and unchecked distances**: Hamming and normalized Hamming
//! - **Fuzzy fingerprints**: majority votes over several fingerprints with
//!   per-bit confidence and weighted distances
//! - **Canonical byte form**: minimal unsigned big-endian magnitude bytes
//! - **Tagged binary records** for persisting plain and fuzzy fingerprints
//! - **Block rendering** to RGB images for visual inspection
//!
//! ## Quick Start
//!
//! ```rust
//! use phash_core::{BlockRenderer, Fingerprint};
//!
//! let a = Fingerprint::from_bit_stream([true, false, true, false], 7)?;
//! let b = Fingerprint::from_bit_stream([true, true, false, false], 7)?;
//!
//! assert_eq!(a.hamming_distance(&b)?, 2);
//! assert_eq!(a.normalized_hamming_distance(&b)?, 0.5);
//!
//! let img = BlockRenderer::default().render(&a)?;
//! assert_eq!(img.dimensions(), (20, 20));
//! # Ok::<(), phash_core::PhashError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`fingerprint`] - Fingerprint value types
//! - [`similarity`] - Distance measures and linear search
//! - [`storage`] - Canonical encoding and binary persistence
//! - [`render`] - Block images
//! - [`config`] - Configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod render;
pub mod similarity;
pub mod storage;

// Re-export commonly used types
pub use config::{Config, RenderConfig, StorageConfig};
pub use error::{PhashError, Result};
pub use fingerprint::{Fingerprint, FuzzyFingerprint};
pub use render::BlockRenderer;
pub use similarity::{DistanceMeasure, DistanceType, HammingDistance, NormalizedHamming};
pub use storage::{HashFormat, RecordKind, StoredFingerprint};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
