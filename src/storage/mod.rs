//! Canonical encoding and persistence of fingerprints.

pub mod codec;
mod format;

pub use format::{HashFormat, RecordHeader, RecordKind, StoredFingerprint};
