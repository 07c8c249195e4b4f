//! Post-copy integrity verification
//!
//! Hashes source and destination with XXHash3, BLAKE3 or SHA-256 and
//! compares the digests.

use crate::config::HashAlgorithm;
use crate::error::{IoResultExt, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Default read buffer for hashing
const HASH_BUFFER_SIZE: usize = 1024 * 1024;

/// Hash result as hex string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashResult {
    /// The hash algorithm used
    pub algorithm: HashAlgorithm,
    /// Hash value as lowercase hex string
    pub hash: String,
    /// Bytes hashed
    pub size: u64,
}

impl HashResult {
    /// Create a new hash result
    pub fn new(algorithm: HashAlgorithm, hash: String, size: u64) -> Self {
        Self {
            algorithm,
            hash,
            size,
        }
    }

    /// Same algorithm, same digest
    pub fn verify(&self, other: &HashResult) -> bool {
        self.algorithm == other.algorithm && self.hash == other.hash
    }
}

impl std::fmt::Display for HashResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// Unified streaming hasher
pub enum Hasher {
    /// XXHash3 128-bit
    XXHash3(Box<xxhash_rust::xxh3::Xxh3>),
    /// BLAKE3
    Blake3(Box<blake3::Hasher>),
    /// SHA-256
    Sha256(sha2::Sha256),
}

impl Hasher {
    /// Create a new hasher for the given algorithm
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::XXHash3 => Self::XXHash3(Box::new(xxhash_rust::xxh3::Xxh3::new())),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Sha256 => {
                use sha2::Digest;
                Self::Sha256(sha2::Sha256::new())
            }
        }
    }

    /// Get the algorithm this hasher uses
    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::XXHash3(_) => HashAlgorithm::XXHash3,
            Self::Blake3(_) => HashAlgorithm::Blake3,
            Self::Sha256(_) => HashAlgorithm::Sha256,
        }
    }

    /// Feed more data
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::XXHash3(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
            Self::Sha256(h) => {
                use sha2::Digest;
                h.update(data);
            }
        }
    }

    /// Finalize and get the hash as hex string
    pub fn finalize(self) -> String {
        match self {
            Self::XXHash3(h) => format!("{:032x}", h.digest128()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
            Self::Sha256(h) => {
                use sha2::Digest;
                hex::encode(h.finalize())
            }
        }
    }
}

/// Compute hash of a file
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<HashResult> {
    let file = File::open(path).with_path(path)?;
    let size = file.metadata().with_path(path)?.len();
    let mut reader = BufReader::with_capacity(HASH_BUFFER_SIZE, file);
    let mut hasher = Hasher::new(algorithm);
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).with_path(path)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(HashResult::new(algorithm, hasher.finalize(), size))
}

/// Compute hash of data in memory
pub fn hash_bytes(data: &[u8], algorithm: HashAlgorithm) -> HashResult {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    HashResult::new(algorithm, hasher.finalize(), data.len() as u64)
}

/// Result of verifying two files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Hash of the source file
    pub source_hash: HashResult,
    /// Hash of the destination file
    pub dest_hash: HashResult,
    /// Whether the hashes match
    pub matches: bool,
}

/// Hash both files and compare
pub fn verify_files_match(
    source: &Path,
    dest: &Path,
    algorithm: HashAlgorithm,
) -> Result<VerificationResult> {
    let source_hash = hash_file(source, algorithm)?;
    let dest_hash = hash_file(dest, algorithm)?;
    let matches = source_hash.verify(&dest_hash) && source_hash.size == dest_hash.size;

    Ok(VerificationResult {
        source_hash,
        dest_hash,
        matches,
    })
}
