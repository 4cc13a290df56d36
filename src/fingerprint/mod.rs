//! Fingerprint value types.

mod fuzzy;
mod hash;

pub use fuzzy::FuzzyFingerprint;
pub use hash::Fingerprint;
