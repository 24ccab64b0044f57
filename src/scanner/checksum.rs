//! Block checksum functions.
//!
//! # Overview
//!
//! Two non-cryptographic checksum families are supported for comparing file
//! blocks: CRC-32 and MD5. The family is chosen once per run and injected into
//! every [`ChunkHasher`](super::ChunkHasher); it is never re-checked per block.
//!
//! Digests are only compared for equality. A collision is treated as a match.
//!
//! # Example
//!
//! ```
//! use blockdupe::scanner::Checksum;
//!
//! let checksum = Checksum::from_name_or_default("crc32");
//! assert_eq!(checksum, Checksum::Crc32);
//!
//! let a = checksum.digest(b"hello");
//! let b = checksum.digest(b"hello");
//! assert_eq!(a, b);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Checksum family used to digest file blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Checksum {
    /// CRC-32 (IEEE), 4-byte digest.
    Crc32,
    /// MD5, 16-byte digest.
    #[default]
    Md5,
}

impl Checksum {
    /// Every supported family, in the order shown in help text.
    pub const ALL: [Checksum; 2] = [Checksum::Md5, Checksum::Crc32];

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Crc32 => "crc32",
            Self::Md5 => "md5",
        }
    }

    /// Resolve a checksum name, falling back to the default on unknown input.
    ///
    /// An unrecognized name is not an error: a warning is logged and
    /// [`Checksum::Md5`] is used so the run can proceed.
    #[must_use]
    pub fn from_name_or_default(name: &str) -> Self {
        match name.parse() {
            Ok(checksum) => checksum,
            Err(e) => {
                let fallback = Self::default();
                log::warn!("{}, {} will be used", e, fallback);
                fallback
            }
        }
    }

    /// Digest a block of bytes.
    ///
    /// The digest of an empty block is well defined for both families.
    #[must_use]
    pub fn digest(self, block: &[u8]) -> Digest {
        match self {
            Self::Crc32 => Digest::Crc32(crc32fast::hash(block)),
            Self::Md5 => Digest::Md5(md5::compute(block).0),
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown checksum name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown checksum '{0}'")]
pub struct UnknownChecksum(pub String);

impl FromStr for Checksum {
    type Err = UnknownChecksum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownChecksum(wanted.to_string()))
    }
}

/// Digest of a single block.
///
/// The variant records which family produced it, so digests from different
/// families never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Digest {
    /// CRC-32 value.
    Crc32(u32),
    /// MD5 value.
    Md5([u8; 16]),
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crc32(value) => write!(f, "{value:08x}"),
            Self::Md5(bytes) => bytes.iter().try_for_each(|b| write!(f, "{b:02x}")),
        }
    }
}
