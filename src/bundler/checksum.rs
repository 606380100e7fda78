//! Content hashing.
//!
//! Wheel RECORD rows use base64url SHA-256 digests without padding; artifact
//! summaries use the usual hex digest.

use crate::bundler::{Result, error::ErrorExt};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Base64url (unpadded) SHA-256 of `bytes`, as written to wheel RECORD files.
pub fn content_hash(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(bytes))
}

/// Calculates the hex SHA-256 of a file.
///
/// Reads the file in 8KB chunks so large archives are not held in memory.
///
/// # Arguments
///
/// * `path` - Path to the file to hash
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash (64 characters)
/// * `Err` - If the file cannot be read
pub fn calculate_sha256(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).fs_context("opening file for hashing", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
