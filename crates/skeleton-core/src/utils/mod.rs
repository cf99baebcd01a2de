pub mod fs;
pub mod id;

use sha2::{Digest, Sha256};

pub use id::{IdGenerator, ProcessIdGenerator};

/// SHA-256 of a string, hex encoded (lower case)
pub fn hash_sha256(input: &str) -> String {
    sha256_hex(input.as_bytes())
}

/// SHA-256 of raw bytes, hex encoded (lower case)
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// Test module declaration
#[cfg(test)]
mod tests;
