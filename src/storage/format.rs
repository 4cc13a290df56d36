//! Binary record format for persisting fingerprints.
//!
//! ## Format Layout
//!
//! ```text
//! +------------------+
//! | Header (8 bytes) |
//! +------------------+
//! | Record body      |
//! | (variable)       |
//! +------------------+
//! ```
//!
//! ### Header (8 bytes)
//! - Magic number (4 bytes): "PHSH"
//! - Version (2 bytes, little-endian)
//! - Record kind (1 byte): 1 = plain, 2 = fuzzy
//! - Reserved (1 byte)
//!
//! ### Record body
//! - bincode encoded record of the kind named in the header. Magnitudes are
//!   stored in their canonical byte form (see [`crate::storage::codec`]).

use crate::config::StorageConfig;
use crate::error::{PhashError, Result};
use crate::fingerprint::{Fingerprint, FuzzyFingerprint};
use crate::storage::codec;
use bincode::Options;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

/// Magic number for fingerprint files.
const MAGIC: &[u8; 4] = b"PHSH";

/// Current format version.
const VERSION: u16 = 1;

/// Header size in bytes.
const HEADER_SIZE: usize = 8;

/// Kind of record stored after the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordKind {
    /// A plain [`Fingerprint`].
    Plain = 1,
    /// A [`FuzzyFingerprint`] with its bit weights.
    Fuzzy = 2,
}

impl RecordKind {
    /// Resolves a stored tag.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(RecordKind::Plain),
            2 => Ok(RecordKind::Fuzzy),
            other => Err(PhashError::CorruptData(format!(
                "Unknown record kind: {}",
                other
            ))),
        }
    }

    /// Returns the stored tag.
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// Record file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Format version.
    pub version: u16,
    /// Kind of the record that follows.
    pub kind: RecordKind,
}

impl RecordHeader {
    /// Creates a header for the current version.
    pub fn new(kind: RecordKind) -> Self {
        Self {
            version: VERSION,
            kind,
        }
    }

    /// Writes the header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(MAGIC);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6] = self.kind.tag();
        // Reserved (byte 7)
        bytes
    }

    /// Reads a header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(PhashError::CorruptData("Header too short".to_string()));
        }

        if &bytes[0..4] != MAGIC {
            return Err(PhashError::CorruptData("Invalid magic number".to_string()));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(PhashError::CorruptData(format!(
                "Unsupported format version: {}",
                version
            )));
        }

        let kind = RecordKind::from_tag(bytes[6])?;
        Ok(Self { version, kind })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PlainRecord {
    algorithm_id: i32,
    bit_length: u32,
    magnitude: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FuzzyRecord {
    algorithm_id: i32,
    bit_length: u32,
    magnitude: Vec<u8>,
    bit_weights: Vec<i32>,
    merged: u32,
}

/// A fingerprint read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredFingerprint {
    /// A plain fingerprint.
    Plain(Fingerprint),
    /// A fuzzy fingerprint.
    Fuzzy(FuzzyFingerprint),
}

impl StoredFingerprint {
    /// Returns the record kind.
    pub fn kind(&self) -> RecordKind {
        match self {
            StoredFingerprint::Plain(_) => RecordKind::Plain,
            StoredFingerprint::Fuzzy(_) => RecordKind::Fuzzy,
        }
    }

    /// Returns the plain fingerprint; the majority vote for fuzzy records.
    pub fn fingerprint(&self) -> &Fingerprint {
        match self {
            StoredFingerprint::Plain(fp) => fp,
            StoredFingerprint::Fuzzy(fuzzy) => fuzzy.fingerprint(),
        }
    }

    /// Consumes the record and returns the plain fingerprint.
    pub fn into_fingerprint(self) -> Fingerprint {
        match self {
            StoredFingerprint::Plain(fp) => fp,
            StoredFingerprint::Fuzzy(fuzzy) => fuzzy.fingerprint().clone(),
        }
    }
}

impl From<Fingerprint> for StoredFingerprint {
    fn from(fp: Fingerprint) -> Self {
        StoredFingerprint::Plain(fp)
    }
}

impl From<FuzzyFingerprint> for StoredFingerprint {
    fn from(fuzzy: FuzzyFingerprint) -> Self {
        StoredFingerprint::Fuzzy(fuzzy)
    }
}

/// Binary format reader/writer for fingerprint records.
#[derive(Debug, Clone, Default)]
pub struct HashFormat {
    config: StorageConfig,
}

impl HashFormat {
    /// Creates a format handler with the given storage configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Writes a record to `writer`.
    ///
    /// The writer is flushed but not closed.
    pub fn save<W: Write>(record: &StoredFingerprint, mut writer: W) -> Result<()> {
        let header = RecordHeader::new(record.kind());
        let body = match record {
            StoredFingerprint::Plain(fp) => body_options().serialize(&PlainRecord {
                algorithm_id: fp.algorithm_id(),
                bit_length: fp.bit_length(),
                magnitude: codec::encode(fp.magnitude()),
            })?,
            StoredFingerprint::Fuzzy(fuzzy) => body_options().serialize(&FuzzyRecord {
                algorithm_id: fuzzy.algorithm_id(),
                bit_length: fuzzy.bit_length(),
                magnitude: codec::encode(fuzzy.fingerprint().magnitude()),
                bit_weights: fuzzy.bit_weights().to_vec(),
                merged: fuzzy.merged(),
            })?,
        };

        writer.write_all(&header.to_bytes())?;
        writer.write_all(&body)?;
        writer.flush()?;

        debug!(
            "wrote {:?} record [algoId: {}], {} body bytes",
            header.kind,
            record.fingerprint().algorithm_id(),
            body.len()
        );
        Ok(())
    }

    /// Reads a record from `reader`.
    ///
    /// Decoding is all or nothing: any malformed field fails the whole load.
    pub fn load<R: Read>(mut reader: R) -> Result<StoredFingerprint> {
        let mut header_bytes = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header_bytes).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                PhashError::CorruptData("Header too short".to_string())
            } else {
                PhashError::Io(e)
            }
        })?;
        let header = RecordHeader::from_bytes(&header_bytes)?;

        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;

        let record = match header.kind {
            RecordKind::Plain => Self::decode_plain(&body)?,
            RecordKind::Fuzzy => Self::decode_fuzzy(&body)?,
        };

        debug!(
            "read {:?} record [algoId: {}], {} body bytes",
            header.kind,
            record.fingerprint().algorithm_id(),
            body.len()
        );
        Ok(record)
    }

    fn decode_plain(body: &[u8]) -> Result<StoredFingerprint> {
        let record: PlainRecord = body_options().deserialize(body)?;
        check_bit_length(record.bit_length)?;

        Ok(StoredFingerprint::Plain(Fingerprint::new(
            codec::decode(&record.magnitude),
            record.bit_length,
            record.algorithm_id,
        )))
    }

    fn decode_fuzzy(body: &[u8]) -> Result<StoredFingerprint> {
        let record: FuzzyRecord = body_options().deserialize(body)?;
        check_bit_length(record.bit_length)?;

        if record.bit_weights.len() != record.bit_length as usize {
            return Err(PhashError::CorruptData(format!(
                "Fuzzy record has {} bit weights for {} bits",
                record.bit_weights.len(),
                record.bit_length
            )));
        }

        let fuzzy = FuzzyFingerprint::from_parts(
            record.bit_weights,
            record.merged,
            record.algorithm_id,
        )
        .map_err(|e| PhashError::CorruptData(e.to_string()))?;

        if fuzzy.fingerprint().magnitude() != &codec::decode(&record.magnitude) {
            return Err(PhashError::CorruptData(
                "Fuzzy record magnitude disagrees with its bit weights".to_string(),
            ));
        }

        Ok(StoredFingerprint::Fuzzy(fuzzy))
    }

    /// Writes a record to a file, replacing any existing content.
    pub fn write_file<P: AsRef<Path>>(&self, path: P, record: &StoredFingerprint) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let writer = BufWriter::with_capacity(self.config.buffer_capacity, file);
        Self::save(record, writer)?;
        debug!("saved fingerprint to {}", path.display());
        Ok(())
    }

    /// Reads a record from a file.
    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> Result<StoredFingerprint> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(self.config.buffer_capacity, file);
        let record = Self::load(reader)?;
        debug!("loaded fingerprint from {}", path.display());
        Ok(record)
    }
}

/// Fixed-width little-endian integers; a body must be consumed completely.
fn body_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

fn check_bit_length(bit_length: u32) -> Result<()> {
    if bit_length == 0 {
        return Err(PhashError::CorruptData("Record has a bit length of 0".to_string()));
    }
    Ok(())
}

impl Fingerprint {
    /// Saves this fingerprint to a file. Read it back with [`Fingerprint::load`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        HashFormat::default().write_file(path, &StoredFingerprint::Plain(self.clone()))
    }

    /// Loads a fingerprint file written by [`Fingerprint::save`] or
    /// [`FuzzyFingerprint::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<StoredFingerprint> {
        HashFormat::default().read_file(path)
    }
}

impl FuzzyFingerprint {
    /// Saves this fuzzy fingerprint to a file. Read it back with [`Fingerprint::load`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        HashFormat::default().write_file(path, &StoredFingerprint::Fuzzy(self.clone()))
    }
}
